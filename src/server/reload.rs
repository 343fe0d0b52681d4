// src/server/reload.rs

//! Reload notifications: a broadcast hub plus a debouncer that turns bursts
//! of file changes into one event.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::watch::path_utils::normalize_changed_path;

/// What connected browsers are told to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// Reload the page.
    Reload,
    /// Only stylesheets changed; swap these (paths relative to the served
    /// directory).
    Css { paths: Vec<String> },
}

impl ReloadEvent {
    /// Decide the event for a batch of changed paths. Source maps never
    /// affect the page and are ignored; `None` if nothing else changed.
    pub fn from_changes<I, S>(changes: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: BTreeSet<String> = changes
            .into_iter()
            .map(|p| p.as_ref().trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty() && !p.ends_with(".map"))
            .collect();

        if paths.is_empty() {
            return None;
        }
        if paths.iter().all(|p| p.ends_with(".css")) {
            return Some(ReloadEvent::Css {
                paths: paths.into_iter().collect(),
            });
        }
        Some(ReloadEvent::Reload)
    }
}

const CHANNEL_CAPACITY: usize = 16;

/// Fan-out of reload events to every connected browser.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn clients(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Returns how many clients were notified.
    pub fn publish(&self, event: ReloadEvent) -> usize {
        let sent = self.tx.send(event.clone()).unwrap_or(0);
        info!(?event, clients = sent, "reload notification");
        sent
    }
}

/// Collect changed paths until `window` passes without another change, then
/// publish one event for the burst. Runs until `cancel` fires or `changes`
/// closes.
pub async fn run_debouncer(
    root: PathBuf,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    hub: ReloadHub,
    window: Duration,
    cancel: CancellationToken,
) {
    loop {
        let first = tokio::select! {
            _ = cancel.cancelled() => break,
            path = changes.recv() => match path {
                Some(path) => path,
                None => break,
            },
        };

        let mut batch: Vec<String> = normalize_changed_path(&root, &first).into_iter().collect();
        let mut open = true;
        let deadline = sleep(window);
        tokio::pin!(deadline);

        while open {
            tokio::select! {
                _ = &mut deadline => break,
                _ = cancel.cancelled() => return,
                path = changes.recv() => match path {
                    Some(path) => {
                        batch.extend(normalize_changed_path(&root, &path));
                        deadline.as_mut().reset(Instant::now() + window);
                    }
                    None => open = false,
                },
            }
        }

        debug!(changes = batch.len(), "change burst settled");
        if let Some(event) = ReloadEvent::from_changes(&batch) {
            hub.publish(event);
        }

        if !open {
            break;
        }
    }
    debug!("reload debouncer finished");
}
