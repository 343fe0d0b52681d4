// src/tasks/mod.rs

//! The fixed task table: development and distribution builds, the watcher
//! and the dev server.

pub mod dev;
pub mod dist;
pub mod layout;
pub mod pipeline;
pub mod serve;
pub mod watch;

use crate::config::ConfigFile;
use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::exec::Toolchain;

/// Register every task, with content steps from `[transforms]`.
pub fn build_graph(cfg: &ConfigFile) -> Result<TaskGraph> {
    build_graph_with(cfg, &Toolchain::from_config(&cfg.transforms))
}

pub fn build_graph_with(cfg: &ConfigFile, tools: &Toolchain) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();
    dev::register(&mut graph, cfg, tools)?;
    dist::register(&mut graph, tools)?;
    graph.validate()?;
    Ok(graph)
}
