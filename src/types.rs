// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watch trigger arrives while a triggered run is still in
/// progress.
///
/// - `Queue`: remember the trigger and start one follow-up run when the
///   current one finishes (default).
/// - `Cancel`: cancel the in-flight run and start a fresh one from the latest
///   trigger once it has wound down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    Queue,
    Cancel,
}

impl Default for TriggerWhileRunningBehaviour {
    fn default() -> Self {
        TriggerWhileRunningBehaviour::Queue
    }
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// What a parallel composite does with its remaining children once one of
/// them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelFailureBehaviour {
    /// Cancel the siblings, wait for them to wind down, then report.
    Cancel,
    /// Let the siblings finish, then report the first failure.
    Wait,
}

impl Default for ParallelFailureBehaviour {
    fn default() -> Self {
        ParallelFailureBehaviour::Cancel
    }
}

impl FromStr for ParallelFailureBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cancel" => Ok(ParallelFailureBehaviour::Cancel),
            "wait" => Ok(ParallelFailureBehaviour::Wait),
            other => Err(format!(
                "invalid parallel_failure: {other} (expected \"cancel\" or \"wait\")"
            )),
        }
    }
}

/// Where records matching none of an `Orderer`'s patterns end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Keep them, after every matched record, in their input order.
    #[default]
    Append,
    /// Remove them from the output.
    Drop,
}
