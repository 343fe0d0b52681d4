// src/engine/mod.rs

//! Task invocation and the watch-mode run loop.
//!
//! - [`runner`] invokes tasks by name: atomic actions, `series` and
//!   `parallel` composites, per-task state and last-run bookkeeping.
//! - [`action`] is the seam atomic tasks implement.
//! - [`context`] owns the state shared by every invocation in a process
//!   (filesystem, buckets, last-run times).
//! - [`core`] is the pure state machine that serialises watch-triggered
//!   runs, with [`queue`] deciding what happens to triggers that arrive
//!   mid-run.
//! - [`runtime`] is the async shell that drives the core.

use std::fmt;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// How a triggered run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// Why a binding was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A filesystem event under one of the binding's paths.
    FileWatch,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::FileWatch => f.write_str("file change"),
        }
    }
}

/// Events flowing into the watch runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watch binding should run.
    Triggered {
        binding: TaskName,
        reason: TriggerReason,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod action;
pub mod context;
pub mod core;
pub mod queue;
pub mod runner;
pub mod runtime;

pub use action::{TaskAction, TaskContext, TaskFuture};
pub use context::BuildContext;
pub use core::{CoreCommand, CoreStep, WatchCore};
pub use queue::TriggerQueue;
pub use runner::{Runner, RunnerOptions, TaskState};
pub use runtime::WatchRuntime;
pub use crate::types::TriggerWhileRunningBehaviour;
