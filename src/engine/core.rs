// src/engine/core.rs

//! Pure state machine for watch-triggered runs.
//!
//! The core consumes events and returns commands; it owns no channels, no
//! Tokio types, and performs no IO, so the async shell in
//! [`runtime`](super::runtime) stays a thin loop and the semantics can be
//! tested synchronously.
//!
//! At most one run is active at a time. Triggers that arrive mid-run go
//! through the [`TriggerQueue`].

use tracing::debug;

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::types::TriggerWhileRunningBehaviour;

/// Command for the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a run executing these bindings one after another.
    StartRun(Vec<TaskName>),
    /// Cooperatively cancel the active run.
    CancelRun,
}

#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn keep(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct WatchCore {
    queue: TriggerQueue,
    active: Option<Vec<TaskName>>,
    cancel_requested: bool,
}

impl WatchCore {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, queue_length: usize) -> Self {
        Self {
            queue: TriggerQueue::new(behaviour, queue_length),
            active: None,
            cancel_requested: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::Triggered { binding, reason } => {
                debug!(binding = %binding, %reason, "trigger received");
                self.on_trigger(binding)
            }
            RuntimeEvent::ShutdownRequested => {
                let commands = if self.is_running() {
                    vec![CoreCommand::CancelRun]
                } else {
                    Vec::new()
                };
                CoreStep {
                    commands,
                    keep_running: false,
                }
            }
        }
    }

    pub fn on_trigger(&mut self, binding: TaskName) -> CoreStep {
        if !self.is_running() {
            self.queue.record_trigger(&binding);
            return CoreStep::keep(self.start_queued());
        }

        self.queue.record_trigger(&binding);

        let mut commands = Vec::new();
        if self.queue.behaviour() == TriggerWhileRunningBehaviour::Cancel && !self.cancel_requested {
            self.cancel_requested = true;
            commands.push(CoreCommand::CancelRun);
        }
        CoreStep::keep(commands)
    }

    /// The active run ended; start the next one if anything is queued.
    pub fn on_run_finished(&mut self, outcome: TaskOutcome) -> CoreStep {
        let finished = self.active.take().unwrap_or_default();
        debug!(?finished, ?outcome, "run finished");

        if outcome == TaskOutcome::Cancelled && self.cancel_requested {
            // Whatever the cancelled run was rebuilding is still stale.
            self.queue.requeue(&finished);
        }
        self.cancel_requested = false;

        CoreStep::keep(self.start_queued())
    }

    fn start_queued(&mut self) -> Vec<CoreCommand> {
        let bindings = self.queue.drain_pending();
        if bindings.is_empty() {
            return Vec::new();
        }
        self.active = Some(bindings.clone());
        vec![CoreCommand::StartRun(bindings)]
    }
}
