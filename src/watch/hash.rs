// src/watch/hash.rs

//! Content hashing for watch bindings (`[watch].use_hash`).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::engine::TaskName;
use crate::fs::FileSystem;

/// Hash of a single file's contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let contents = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {:?}", path))?;
    Ok(blake3::hash(&contents).to_hex().to_string())
}

/// Hash over `(path, contents)` of every file, independent of input order.
///
/// Paths take part so that a rename changes the hash.
pub fn compute_hash_for_paths(fs: &dyn FileSystem, root: &Path, rel_paths: &[String]) -> Result<String> {
    let mut sorted: Vec<&String> = rel_paths.iter().collect();
    sorted.sort();

    let mut hasher = Hasher::new();
    for rel in sorted {
        let file_hash = compute_file_hash(fs, &root.join(rel))?;
        hasher.update(rel.as_bytes());
        hasher.update(b"\0");
        hasher.update(file_hash.as_bytes());
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, files = rel_paths.len(), "computed aggregate hash");
    Ok(hash)
}

/// Last seen aggregate hash per binding, for this process only.
#[derive(Debug, Default)]
pub struct ContentHashes {
    map: HashMap<TaskName, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `hash` and report whether it differs from the previous one.
    pub fn update(&mut self, binding: &str, hash: String) -> bool {
        let changed = self.map.get(binding).is_none_or(|prev| *prev != hash);
        self.map.insert(binding.to_string(), hash);
        changed
    }
}
