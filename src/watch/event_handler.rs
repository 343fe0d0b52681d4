// src/watch/event_handler.rs

//! Turning changed paths into binding triggers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::watch::hash::{compute_hash_for_paths, ContentHashes};
use crate::watch::path_utils::normalize_changed_path;
use crate::watch::patterns::WatchBinding;

/// Maps changed paths to the bindings they trigger.
#[derive(Debug)]
pub struct ChangeDispatcher {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    bindings: Vec<WatchBinding>,
    /// Present when `[watch].use_hash` is on.
    hashes: Option<ContentHashes>,
}

impl ChangeDispatcher {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, bindings: Vec<WatchBinding>, use_hash: bool) -> Self {
        let mut dispatcher = Self {
            root: root.into(),
            fs,
            bindings,
            hashes: use_hash.then(ContentHashes::new),
        };
        dispatcher.prime_hashes();
        dispatcher
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Record the current hash of every binding so the first touch without
    /// a content change is ignored.
    fn prime_hashes(&mut self) {
        let Some(hashes) = self.hashes.as_mut() else {
            return;
        };
        for binding in &self.bindings {
            if let Some(hash) = binding_hash(self.fs.as_ref(), &self.root, binding) {
                hashes.update(binding.name(), hash);
            }
        }
    }

    /// Bindings triggered by a change at `path` (absolute, or relative to
    /// the root).
    pub fn process_file_change(&mut self, path: &Path) -> Vec<TaskName> {
        let Some(rel) = normalize_changed_path(&self.root, path) else {
            warn!(?path, root = ?self.root, "could not relativize changed path");
            return Vec::new();
        };

        let mut triggered = Vec::new();
        for binding in &self.bindings {
            if !binding.matches(&rel) {
                continue;
            }

            if let Some(hashes) = self.hashes.as_mut() {
                if let Some(hash) = binding_hash(self.fs.as_ref(), &self.root, binding) {
                    if !hashes.update(binding.name(), hash) {
                        debug!(binding = binding.name(), file = %rel, "contents unchanged; skipping");
                        continue;
                    }
                }
            }

            debug!(binding = binding.name(), file = %rel, "change matches binding");
            triggered.push(binding.name().to_string());
        }
        triggered
    }
}

fn binding_hash(fs: &dyn FileSystem, root: &Path, binding: &WatchBinding) -> Option<String> {
    let paths: Vec<String> = match binding.matcher().paths(fs, root) {
        Ok(paths) => paths.into_iter().map(|(rel, _)| rel).collect(),
        Err(err) => {
            warn!(binding = binding.name(), error = %err, "cannot list watched files");
            return None;
        }
    };
    match compute_hash_for_paths(fs, root, &paths) {
        Ok(hash) => Some(hash),
        Err(err) => {
            warn!(binding = binding.name(), error = %err, "cannot hash watched files");
            None
        }
    }
}
