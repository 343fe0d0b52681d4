// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_or_default, ConfigFile};
use crate::dag::{TaskGraph, TaskKind};
use crate::engine::{BuildContext, Runner, RunnerOptions};
use crate::errors::AssetflowError;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds and validates the task graph, then runs the
/// requested task until it finishes or Ctrl-C cancels it.
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.is_some();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_or_default(&config_path, explicit)?;

    let graph = tasks::build_graph(&cfg)?;

    if args.list {
        print_task_list(&graph);
        return Ok(());
    }

    let task = args
        .task
        .clone()
        .ok_or_else(|| AssetflowError::ConfigError("no task given".to_string()))?;
    if !graph.contains(&task) {
        return Err(AssetflowError::TaskNotFound(task).into());
    }

    if args.dry_run {
        print_dry_run(&cfg, &graph, &task);
        return Ok(());
    }

    let root = args.root.clone().unwrap_or_else(|| project_root(&config_path));
    info!(root = %root.display(), task = %task, "assetflow starting");

    let build = Arc::new(BuildContext::new(root, Arc::new(RealFileSystem)));
    let options = RunnerOptions {
        parallel_failure: cfg.config.parallel_failure,
    };
    let runner = Runner::new(graph, build, options)?;

    // Ctrl-C -> cooperative cancellation of everything running.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("shutdown requested");
            cancel.cancel();
        });
    }

    match runner.run(&task, &cancel).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_cancelled() && cancel.is_cancelled() => {
            info!("stopped");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// The config file's directory, or the current directory for a bare file
/// name.
fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_task_list(graph: &TaskGraph) {
    for task in graph.tasks() {
        println!("{:<14} {}", task.name, task.description);
    }
}

fn print_dry_run(cfg: &ConfigFile, graph: &TaskGraph, task: &str) {
    println!("assetflow dry-run");
    println!("  config.parallel_failure = {:?}", cfg.config.parallel_failure);
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!("  server = {}:{}", cfg.server.host, cfg.server.port);
    println!();

    println!("tasks ({}):", graph.tasks().count());
    for descriptor in graph.tasks() {
        let marker = if descriptor.name == task { "*" } else { "-" };
        match &descriptor.kind {
            TaskKind::Composite(step) => println!("  {marker} {} = {step}", descriptor.name),
            TaskKind::Atomic(_) => println!("  {marker} {}", descriptor.name),
        }
        println!("      {}", descriptor.description);
    }

    debug!("dry-run complete (no execution)");
}
