// src/tasks/watch.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{ConfigSection, WatchSection};
use crate::dag::Step;
use crate::engine::action::{TaskAction, TaskContext, TaskFuture};
use crate::engine::{Runner, RuntimeEvent, TriggerReason, WatchCore, WatchRuntime};
use crate::errors::Result;
use crate::exec::RunnerBackend;
use crate::tasks::{dev, layout};
use crate::types::TriggerWhileRunningBehaviour;
use crate::watch::{spawn_watcher, ChangeDispatcher, WatchBinding};

pub const LESS_BINDING: &str = "less";
pub const SCRIPTS_BINDING: &str = "scripts";

/// The development watch bindings.
pub fn watch_bindings() -> Result<Vec<WatchBinding>> {
    Ok(vec![
        WatchBinding::new(
            LESS_BINDING,
            &[layout::LESS_WATCH],
            Step::series([dev::LESS, dev::STYLES]),
        )?,
        WatchBinding::new(
            SCRIPTS_BINDING,
            &[layout::SCRIPTS_WATCH],
            Step::series([dev::SCRIPTS]),
        )?,
    ])
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub behaviour: TriggerWhileRunningBehaviour,
    pub queue_length: usize,
    pub use_hash: bool,
}

impl WatchOptions {
    pub fn from_config(config: &ConfigSection, watch: &WatchSection) -> Self {
        Self {
            behaviour: config.triggered_while_running_behaviour,
            queue_length: config.queue_length,
            use_hash: watch.use_hash,
        }
    }
}

/// Long-lived: rebuilds bound steps on source changes until cancelled.
#[derive(Debug)]
pub struct WatchTask {
    bindings: Vec<WatchBinding>,
    options: WatchOptions,
}

impl WatchTask {
    pub fn new(bindings: Vec<WatchBinding>, config: &ConfigSection, watch: &WatchSection) -> Self {
        Self {
            bindings,
            options: WatchOptions::from_config(config, watch),
        }
    }

    async fn execute(&self, ctx: TaskContext<'_>) -> Result<()> {
        for binding in &self.bindings {
            ctx.runner.graph().validate_step(binding.step())?;
        }

        let (watcher, changes) = spawn_watcher(ctx.build.root())?;
        let dispatcher = ChangeDispatcher::new(
            watcher.root().to_path_buf(),
            ctx.build.fs_arc(),
            self.bindings.clone(),
            self.options.use_hash,
        );
        for binding in &self.bindings {
            info!(binding = binding.name(), patterns = ?binding.patterns(), step = %binding.step(), "watching");
        }

        let result = run_watch_loop(ctx.runner, dispatcher, changes, self.options, ctx.cancel).await;
        drop(watcher);
        result
    }
}

impl TaskAction for WatchTask {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(self.execute(ctx))
    }
}

/// Feed changed paths through `dispatcher` into a [`WatchRuntime`] running
/// the bound steps on `runner`.
///
/// Returns when `cancel` fires, or once `changes` closes and the last
/// triggered run has finished.
pub async fn run_watch_loop(
    runner: &Runner,
    dispatcher: ChangeDispatcher,
    changes: mpsc::UnboundedReceiver<PathBuf>,
    options: WatchOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let steps: BTreeMap<String, Step> = dispatcher
        .bindings()
        .iter()
        .map(|b| (b.name().to_string(), b.step().clone()))
        .collect();
    let backend = RunnerBackend::new(runner.clone(), steps);

    let (event_tx, event_rx) = mpsc::channel::<RuntimeEvent>(64);
    let core = WatchCore::new(options.behaviour, options.queue_length);
    let runtime = WatchRuntime::new(core, event_rx, backend, cancel.clone());

    let forward = forward_changes(dispatcher, changes, event_tx, cancel.clone());
    let (result, ()) = tokio::join!(runtime.run(), forward);
    result
}

async fn forward_changes(
    mut dispatcher: ChangeDispatcher,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    cancel: CancellationToken,
) {
    loop {
        let path = tokio::select! {
            _ = cancel.cancelled() => break,
            path = changes.recv() => match path {
                Some(path) => path,
                None => break,
            },
        };

        for binding in dispatcher.process_file_change(&path) {
            let event = RuntimeEvent::Triggered {
                binding,
                reason: TriggerReason::FileWatch,
            };
            if event_tx.send(event).await.is_err() {
                return;
            }
        }
    }
    debug!("change forwarder finished");
}
