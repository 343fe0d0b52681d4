// src/pipeline/dest.rs

//! Terminal steps: writing records under a destination, and deletion.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;
use crate::pipeline::matcher::Matcher;
use crate::pipeline::record::FileRecord;
use crate::pipeline::sourcemap::SourceMap;

/// Write each record to `<root>/<dest_dir>/<record.relative()>`.
///
/// Records carrying a source map also get `<file>.map` next to them and a
/// trailing `sourceMappingURL` comment. Cancellation is checked before every
/// write, so a cancelled task never writes after it has been told to stop.
/// Returns the root-relative paths written.
pub fn write_records(
    fs: &dyn FileSystem,
    root: &Path,
    dest_dir: &str,
    records: Vec<FileRecord>,
    task: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(records.len());

    for mut record in records {
        if cancel.is_cancelled() {
            return Err(AssetflowError::Cancelled(task.to_string()));
        }

        let rel = join_rel(dest_dir, record.relative());

        if let Some(map) = record.source_map.take() {
            let map_rel = format!("{rel}.map");
            let map_name = format!("{}.map", record.file_name());
            let map = SourceMap {
                file: record.file_name().to_string(),
                ..map
            };
            fs.write(&root.join(&map_rel), map.to_json()?.as_bytes())?;
            record
                .contents
                .extend_from_slice(SourceMap::url_comment(&map_name, record.extension()).as_bytes());
            debug!(task, file = %map_rel, "wrote source map");
            written.push(map_rel);
        }

        fs.write(&root.join(&rel), &record.contents)?;
        debug!(task, file = %rel, bytes = record.contents.len(), "wrote file");
        written.push(rel);
    }

    Ok(written)
}

fn join_rel(dir: &str, rel: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}

/// Delete every file selected by `matcher`. Returns the deleted paths.
pub fn delete_matching(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &Matcher,
    task: &str,
) -> Result<Vec<String>> {
    let mut deleted = Vec::new();
    for (rel, _base) in matcher.paths(fs, root)? {
        fs.remove_file(&root.join(&rel))?;
        debug!(task, file = %rel, "deleted");
        deleted.push(rel);
    }
    info!(task, count = deleted.len(), "deleted generated files");
    Ok(deleted)
}

/// Delete a directory tree below `root`; a missing directory is not an error.
pub fn delete_dir(fs: &dyn FileSystem, root: &Path, dir: &str, task: &str) -> Result<bool> {
    let path = root.join(dir);
    if !fs.exists(&path) {
        debug!(task, dir, "nothing to delete");
        return Ok(false);
    }
    fs.remove_dir_all(&path)?;
    info!(task, dir, "deleted directory");
    Ok(true)
}
