// src/engine/context.rs

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::pipeline::remember::BucketCache;

/// State shared by every task invocation in one process.
pub struct BuildContext {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    buckets: BucketCache,
    last_runs: Mutex<HashMap<TaskName, SystemTime>>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            buckets: BucketCache::new(),
            last_runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn fs_arc(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    pub fn buckets(&self) -> &BucketCache {
        &self.buckets
    }

    /// Start time of the last successful run of `task`.
    pub fn last_run(&self, task: &str) -> Option<SystemTime> {
        self.last_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task)
            .copied()
    }

    pub fn record_run(&self, task: &str, started: SystemTime) {
        self.last_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task.to_string(), started);
    }
}
