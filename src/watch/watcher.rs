// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish()
    }
}

/// Watch `dir` recursively and forward every changed path.
///
/// Access-only events are dropped. The returned root is `dir` canonicalized,
/// which is the prefix notify reports paths under.
pub fn spawn_watcher(dir: &Path) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<PathBuf>)> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("resolving watch directory {}", dir.display()))?;

    let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();

    // Called synchronously on notify's thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                for path in event.paths {
                    if tx.send(path).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", root.display()))?;

    info!("file watcher started on {:?}", root);
    debug!("forwarding changed paths");

    Ok((
        WatcherHandle {
            _inner: watcher,
            root,
        },
        rx,
    ))
}
