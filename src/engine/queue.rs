// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrive while a watch run is already executing.
///
/// Each queued entry is a batch of binding names for one future run.
/// In `Queue` mode up to `max_runs` batches are kept, and the run loop takes
/// them one at a time through [`drain_pending`](Self::drain_pending). In
/// `Cancel` mode there is only ever a single batch.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of follow-up runs waiting.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Record a trigger for a later run.
    ///
    /// - `Queue`: a binding already waiting in some batch is coalesced.
    ///   Otherwise it opens a new batch while fewer than `max_runs` exist,
    ///   and joins the newest batch once the queue is full.
    /// - `Cancel`: the in-flight run is being abandoned, so whatever it was
    ///   building must be rebuilt as well; the trigger joins a single batch
    ///   that replaces any older ones.
    pub fn record_trigger(&mut self, binding: &str) {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if self.runs.iter().any(|batch| batch.contains(binding)) {
                    debug!(binding, "binding already queued; coalesced");
                    return;
                }

                if self.runs.len() < self.max_runs {
                    self.runs.push_back(BTreeSet::from([binding.to_string()]));
                    debug!(binding, queued_runs = self.runs.len(), "queued trigger for a new run");
                } else if let Some(batch) = self.runs.back_mut() {
                    batch.insert(binding.to_string());
                    debug!(binding, max_runs = self.max_runs, "queue full; merged into newest run");
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                let mut merged: BTreeSet<TaskName> = self.runs.drain(..).flatten().collect();
                merged.insert(binding.to_string());
                debug!(binding, pending = merged.len(), "replaced queued batches (cancel mode)");
                self.runs.push_back(merged);
            }
        }
    }

    /// Re-queue the bindings of a run that was cancelled before finishing.
    pub fn requeue(&mut self, bindings: &[TaskName]) {
        for binding in bindings {
            self.record_trigger(binding);
        }
    }

    /// Take the oldest queued batch as a sorted list of bindings.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let batch = self.runs.pop_front().unwrap_or_default();
        debug!(drained = batch.len(), remaining_runs = self.runs.len(), "drained queued triggers");
        batch.into_iter().collect()
    }
}
