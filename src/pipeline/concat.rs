// src/pipeline/concat.rs

use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::pipeline::record::FileRecord;
use crate::pipeline::sourcemap::SourceMapBuilder;

/// Concatenate `records` (in the given order) into one bundle at `out_path`,
/// joining fragments with `\n`.
///
/// With `source_map`, the bundle carries a map whose sources are relative to
/// the bundle's directory. Returns `None` for an empty input: no bundle is
/// produced from nothing.
pub fn concat(records: &[FileRecord], out_path: &str, source_map: bool) -> Option<FileRecord> {
    if records.is_empty() {
        debug!(bundle = %out_path, "no fragments; skipping concatenation");
        return None;
    }

    let (dir, file_name) = match out_path.rfind('/') {
        Some(idx) => (&out_path[..idx], &out_path[idx + 1..]),
        None => ("", out_path),
    };

    let mut contents: Vec<u8> = Vec::new();
    let mut builder = SourceMapBuilder::new(file_name);
    let mut modified = UNIX_EPOCH;

    for (idx, record) in records.iter().enumerate() {
        if idx > 0 {
            contents.push(b'\n');
        }
        contents.extend_from_slice(&record.contents);
        modified = modified.max(record.modified);

        if source_map {
            let text = record.text();
            let source = builder.add_source(relative_path(dir, &record.path), text.as_str());
            for line in 0..text.split('\n').count() {
                builder.map_line(source, line);
            }
        }
    }

    debug!(bundle = %out_path, fragments = records.len(), "concatenated fragments");

    let mut bundle = FileRecord::new(out_path, dir, contents, modified);
    if source_map {
        bundle.source_map = Some(builder.build());
    }
    Some(bundle)
}

/// `/`-separated path of `target` as seen from directory `from_dir`, both
/// relative to the same root.
pub fn relative_path(from_dir: &str, target: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}
