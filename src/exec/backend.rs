// src/exec/backend.rs

//! Pluggable run backend for the watch runtime.
//!
//! The runtime asks a `RunBackend` to execute a batch of triggered bindings
//! and awaits the returned future. Production uses [`RunnerBackend`], which
//! maps each binding to a step of the task graph; tests provide a fake that
//! records launches and completes on demand.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::dag::Step;
use crate::engine::{Runner, TaskName, TaskOutcome};

pub type RunFuture = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'static>>;

pub trait RunBackend: Send {
    /// Start a run executing `bindings` in order. The returned future resolves
    /// once the run has finished or wound down after `cancel` fired.
    fn launch(&mut self, bindings: Vec<TaskName>, cancel: CancellationToken) -> RunFuture;
}

/// Runs each binding's step on a [`Runner`].
#[derive(Debug, Clone)]
pub struct RunnerBackend {
    runner: Runner,
    steps: BTreeMap<TaskName, Step>,
}

impl RunnerBackend {
    pub fn new(runner: Runner, steps: BTreeMap<TaskName, Step>) -> Self {
        Self { runner, steps }
    }
}

impl RunBackend for RunnerBackend {
    fn launch(&mut self, bindings: Vec<TaskName>, cancel: CancellationToken) -> RunFuture {
        let runner = self.runner.clone();
        let steps: Vec<(TaskName, Option<Step>)> = bindings
            .into_iter()
            .map(|b| {
                let step = self.steps.get(&b).cloned();
                (b, step)
            })
            .collect();

        Box::pin(async move {
            let mut outcome = TaskOutcome::Succeeded;
            for (binding, step) in steps {
                let Some(step) = step else {
                    warn!(binding = %binding, "no step bound; ignoring trigger");
                    continue;
                };
                if cancel.is_cancelled() {
                    return TaskOutcome::Cancelled;
                }
                match runner.run_step(&step, &cancel).await {
                    Ok(()) => {}
                    Err(err) if err.is_cancelled() => return TaskOutcome::Cancelled,
                    Err(err) => {
                        // Keep watching; the next change gets another chance.
                        error!(binding = %binding, step = %step, error = %err, "watch run failed");
                        outcome = TaskOutcome::Failed;
                    }
                }
            }
            outcome
        })
    }
}
