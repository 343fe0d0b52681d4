// src/engine/runner.rs

//! Invoking tasks by name.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dag::{Step, TaskGraph, TaskKind};
use crate::engine::action::TaskContext;
use crate::engine::context::BuildContext;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};
use crate::types::ParallelFailureBehaviour;

type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Lifecycle of the most recent invocation of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerOptions {
    pub parallel_failure: ParallelFailureBehaviour,
}

struct RunnerInner {
    graph: TaskGraph,
    build: Arc<BuildContext>,
    options: RunnerOptions,
    states: Mutex<HashMap<TaskName, TaskState>>,
}

/// Runs tasks from a validated [`TaskGraph`].
///
/// Cheap to clone; clones share task state and the build context.
#[derive(Clone)]
pub struct Runner {
    inner: Arc<RunnerInner>,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("graph", &self.inner.graph)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Validates `graph` up front; an unresolved name or a cycle is reported
    /// here, before anything runs.
    pub fn new(graph: TaskGraph, build: Arc<BuildContext>, options: RunnerOptions) -> Result<Self> {
        graph.validate()?;
        Ok(Self {
            inner: Arc::new(RunnerInner {
                graph,
                build,
                options,
                states: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.inner.graph
    }

    pub fn build(&self) -> &BuildContext {
        &self.inner.build
    }

    pub fn state_of(&self, task: &str) -> TaskState {
        self.inner
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task)
            .copied()
            .unwrap_or_default()
    }

    fn set_state(&self, task: &str, state: TaskState) {
        self.inner
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task.to_string(), state);
    }

    /// Invoke a registered task.
    pub async fn run(&self, task: &str, cancel: &CancellationToken) -> Result<()> {
        self.invoke(task, cancel).await
    }

    /// Run an arbitrary step tree against this runner's tasks.
    pub fn run_step<'a>(&'a self, step: &'a Step, cancel: &'a CancellationToken) -> StepFuture<'a> {
        Box::pin(async move {
            match step {
                Step::Task(name) => self.invoke(name, cancel).await,
                Step::Series(steps) => self.run_series(steps, cancel).await,
                Step::Parallel(steps) => self.run_parallel(steps, cancel).await,
            }
        })
    }

    async fn run_series(&self, steps: &[Step], cancel: &CancellationToken) -> Result<()> {
        for step in steps {
            if cancel.is_cancelled() {
                return Err(AssetflowError::Cancelled(step.to_string()));
            }
            self.run_step(step, cancel).await?;
        }
        Ok(())
    }

    /// Interleave `steps` on the current task.
    ///
    /// The composite only returns once every child has finished, so nothing
    /// a child does can outlive the reported failure.
    async fn run_parallel(&self, steps: &[Step], cancel: &CancellationToken) -> Result<()> {
        let siblings = cancel.child_token();
        let mut pending: FuturesUnordered<StepFuture<'_>> = steps
            .iter()
            .map(|step| self.run_step(step, &siblings))
            .collect();

        let mut failure: Option<AssetflowError> = None;
        while let Some(result) = pending.next().await {
            let Err(err) = result else { continue };

            let root_cause = !err.is_cancelled();
            let replace = match &failure {
                None => true,
                Some(prev) => prev.is_cancelled() && root_cause,
            };
            if !replace {
                debug!(error = %err, "additional failure in parallel group");
                continue;
            }

            if root_cause
                && self.inner.options.parallel_failure == ParallelFailureBehaviour::Cancel
                && !siblings.is_cancelled()
            {
                info!(error = %err, "parallel child failed; cancelling siblings");
                siblings.cancel();
            }
            failure = Some(err);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn invoke(&self, task: &str, cancel: &CancellationToken) -> Result<()> {
        let descriptor = self
            .inner
            .graph
            .get(task)
            .ok_or_else(|| AssetflowError::TaskNotFound(task.to_string()))?;

        if cancel.is_cancelled() {
            return Err(AssetflowError::Cancelled(task.to_string()));
        }

        let build = self.inner.build.as_ref();
        let started_at = build.fs().now();
        let started = Instant::now();
        self.set_state(task, TaskState::Running);
        info!(task, "Starting '{task}'");

        let result = match &descriptor.kind {
            TaskKind::Composite(step) => self.run_step(step, cancel).await,
            TaskKind::Atomic(action) => {
                let ctx = TaskContext {
                    task,
                    runner: self,
                    build,
                    cancel,
                    since: build.last_run(task),
                };
                action.run(ctx).await
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                build.record_run(task, started_at);
                self.set_state(task, TaskState::Succeeded);
                info!(task, elapsed_ms, "Finished '{task}'");
            }
            Err(err) if err.is_cancelled() => {
                self.set_state(task, TaskState::Failed);
                info!(task, elapsed_ms, "'{task}' cancelled");
            }
            Err(err) => {
                self.set_state(task, TaskState::Failed);
                error!(task, elapsed_ms, error = %err, "'{task}' errored");
            }
        }

        result
    }
}
