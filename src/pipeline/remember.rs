// src/pipeline/remember.rs

//! Process-lifetime aggregation of file records ("remember").

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::pipeline::record::FileRecord;

#[derive(Debug, Default)]
struct Bucket {
    /// Paths in the order they were first seen.
    order: Vec<String>,
    records: HashMap<String, FileRecord>,
}

/// Named buckets of every record a pipeline has ever seen in this process.
///
/// Lets an incremental run that only matched changed files still hand the
/// complete file set to a concatenation step. Paths are never evicted, only
/// updated. Each bucket name must have exactly one writing pipeline; two
/// pipelines sharing a name would interleave their updates.
#[derive(Debug, Default)]
pub struct BucketCache {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl BucketCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge `records` into `bucket` and return the full remembered set.
    ///
    /// Incoming records replace stored ones with the same path. The result is
    /// in first-seen order, so an incremental run emits the same sequence as
    /// the full run that preceded it.
    pub fn remember(&self, bucket: &str, records: Vec<FileRecord>) -> Vec<FileRecord> {
        let mut buckets = self.lock();
        let entry = buckets.entry(bucket.to_string()).or_default();

        let incoming = records.len();
        let mut updated: HashSet<String> = HashSet::new();
        for record in records {
            if !entry.records.contains_key(&record.path) {
                entry.order.push(record.path.clone());
            }
            updated.insert(record.path.clone());
            entry.records.insert(record.path.clone(), record);
        }

        debug!(
            bucket,
            incoming,
            updated = updated.len(),
            total = entry.order.len(),
            "remembered records"
        );

        entry
            .order
            .iter()
            .filter_map(|path| entry.records.get(path).cloned())
            .collect()
    }

    /// Number of paths stored under `bucket`.
    pub fn len(&self, bucket: &str) -> usize {
        self.lock().get(bucket).map_or(0, |b| b.order.len())
    }

    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// Stored paths in first-seen order.
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|b| b.order.clone())
            .unwrap_or_default()
    }
}
