// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::core::{CoreCommand, CoreStep, WatchCore};
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::exec::backend::{RunBackend, RunFuture};

struct ActiveRun {
    future: RunFuture,
    cancel: CancellationToken,
}

enum Wake {
    Shutdown,
    Finished(TaskOutcome),
    Event(RuntimeEvent),
    Closed,
}

/// Async shell around [`WatchCore`]: reads trigger events, launches runs on
/// a [`RunBackend`], and reports their completion back to the core.
///
/// Runs are polled inside this loop rather than spawned, so at most one run
/// exists at any time and it never outlives the loop.
pub struct WatchRuntime<B: RunBackend> {
    core: WatchCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    shutdown: CancellationToken,
}

impl<B: RunBackend> fmt::Debug for WatchRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

async fn wait_run(run: &mut Option<ActiveRun>) -> TaskOutcome {
    match run {
        Some(active) => (&mut active.future).await,
        None => std::future::pending().await,
    }
}

impl<B: RunBackend> WatchRuntime<B> {
    pub fn new(
        core: WatchCore,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            shutdown,
        }
    }

    /// Main loop. Returns once shutdown is requested (token or event) and any
    /// active run has wound down, or once the event channel has closed and
    /// the remaining work has finished.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");
        let mut active: Option<ActiveRun> = None;
        let mut closed = false;

        loop {
            let wake = tokio::select! {
                _ = self.shutdown.cancelled() => Wake::Shutdown,
                outcome = wait_run(&mut active) => Wake::Finished(outcome),
                event = self.event_rx.recv(), if !closed => match event {
                    Some(event) => Wake::Event(event),
                    None => Wake::Closed,
                },
            };

            let step = match wake {
                Wake::Shutdown => self.core.step(RuntimeEvent::ShutdownRequested),
                Wake::Finished(outcome) => {
                    active = None;
                    self.core.on_run_finished(outcome)
                }
                Wake::Event(event) => self.core.step(event),
                Wake::Closed => {
                    debug!("runtime event channel closed");
                    closed = true;
                    CoreStep {
                        commands: Vec::new(),
                        keep_running: true,
                    }
                }
            };

            for command in step.commands {
                match command {
                    CoreCommand::StartRun(bindings) => {
                        info!(?bindings, "starting triggered run");
                        let cancel = self.shutdown.child_token();
                        let future = self.backend.launch(bindings, cancel.clone());
                        active = Some(ActiveRun { future, cancel });
                    }
                    CoreCommand::CancelRun => {
                        if let Some(run) = &active {
                            info!("cancelling active run");
                            run.cancel.cancel();
                        }
                    }
                }
            }

            if !step.keep_running || (closed && active.is_none()) {
                break;
            }
        }

        if let Some(run) = active.take() {
            run.cancel.cancel();
            let outcome = run.future.await;
            debug!(?outcome, "active run wound down");
        }

        info!("watch runtime exiting");
        Ok(())
    }
}
