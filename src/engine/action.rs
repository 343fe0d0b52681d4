// src/engine/action.rs

use std::future::Future;
use std::pin::Pin;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::engine::context::BuildContext;
use crate::engine::runner::Runner;
use crate::errors::Result;

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Everything an atomic task sees while it runs.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub task: &'a str,
    /// For tasks that invoke other tasks (the watcher).
    pub runner: &'a Runner,
    pub build: &'a BuildContext,
    /// Checked before every write; long-lived tasks stop when it fires.
    pub cancel: &'a CancellationToken,
    /// Start time of this task's last successful invocation.
    pub since: Option<SystemTime>,
}

/// The body of an atomic task.
pub trait TaskAction: Send + Sync {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a>;
}
