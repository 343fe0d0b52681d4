// src/watch/path_utils.rs

use std::path::Path;

/// `path` relative to `root`, `/`-separated.
///
/// Falls back to comparing canonical paths, since notify may report a
/// different absolute prefix for the same directory (symlinks, `/private`
/// on macOS). `None` if the path is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Like [`relative_str`], but passes already-relative paths through.
pub fn normalize_changed_path(root: &Path, path: &Path) -> Option<String> {
    if path.is_relative() {
        return Some(path.to_string_lossy().replace('\\', "/"));
    }
    relative_str(root, path)
}
