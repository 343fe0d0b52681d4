#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetflow::engine::{TaskAction, TaskContext, TaskFuture, TaskName, TaskOutcome};
use assetflow::errors::AssetflowError;
use assetflow::exec::{RunBackend, RunFuture};
use tokio_util::sync::CancellationToken;

/// Shared, ordered record of what fakes did.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }
}

/// An atomic task that sleeps, then fails or writes a file.
///
/// Logs `start:<name>`, then one of `end:<name>`, `fail:<name>` or
/// `cancelled:<name>`.
pub struct FakeAction {
    name: String,
    delay: Duration,
    fail: bool,
    write: Option<String>,
    log: EventLog,
}

impl FakeAction {
    pub fn new(name: &str, delay: Duration, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            delay,
            fail: false,
            write: None,
            log: log.clone(),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Write `rel` (relative to the build root) once the delay has passed.
    pub fn writes(mut self, rel: &str) -> Self {
        self.write = Some(rel.to_string());
        self
    }

    pub fn arc(self) -> Arc<dyn TaskAction> {
        Arc::new(self)
    }
}

impl TaskAction for FakeAction {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(async move {
            self.log.push(format!("start:{}", self.name));

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = ctx.cancel.cancelled() => {
                    self.log.push(format!("cancelled:{}", self.name));
                    return Err(AssetflowError::Cancelled(self.name.clone()));
                }
            }

            if self.fail {
                self.log.push(format!("fail:{}", self.name));
                return Err(AssetflowError::TransformFailed {
                    step: self.name.clone(),
                    file: "fake".to_string(),
                    message: "failed on purpose".to_string(),
                });
            }

            if let Some(rel) = &self.write {
                if ctx.cancel.is_cancelled() {
                    self.log.push(format!("cancelled:{}", self.name));
                    return Err(AssetflowError::Cancelled(self.name.clone()));
                }
                ctx.build
                    .fs()
                    .write(&ctx.build.root().join(rel), self.name.as_bytes())?;
            }

            self.log.push(format!("end:{}", self.name));
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
struct BackendState {
    launches: Vec<Vec<TaskName>>,
    outcomes: Vec<TaskOutcome>,
    active: usize,
    max_active: usize,
}

/// A run backend whose runs take a fixed time unless cancelled.
///
/// Meant for `#[tokio::test(start_paused = true)]`.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    run_time: Duration,
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new(run_time: Duration) -> Self {
        Self {
            run_time,
            state: Arc::default(),
        }
    }

    pub fn launches(&self) -> Vec<Vec<TaskName>> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        self.state.lock().unwrap().outcomes.clone()
    }

    /// Highest number of runs that were in flight at once.
    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }
}

impl RunBackend for FakeBackend {
    fn launch(&mut self, bindings: Vec<TaskName>, cancel: CancellationToken) -> RunFuture {
        self.state.lock().unwrap().launches.push(bindings);
        let state = Arc::clone(&self.state);
        let run_time = self.run_time;

        Box::pin(async move {
            {
                let mut s = state.lock().unwrap();
                s.active += 1;
                s.max_active = s.max_active.max(s.active);
            }

            let outcome = tokio::select! {
                _ = tokio::time::sleep(run_time) => TaskOutcome::Succeeded,
                _ = cancel.cancelled() => TaskOutcome::Cancelled,
            };

            let mut s = state.lock().unwrap();
            s.active -= 1;
            s.outcomes.push(outcome);
            outcome
        })
    }
}
