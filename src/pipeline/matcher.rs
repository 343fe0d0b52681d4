// src/pipeline/matcher.rs

//! The file matcher: include/exclude globs plus an optional "since" filter,
//! resolved against a project root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;
use crate::pipeline::record::FileRecord;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Compile a glob with path-aware semantics: `*` stops at `/`, `**` crosses
/// directories.
pub fn compile_glob(pattern: &str) -> anyhow::Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

pub(crate) fn compile_globset<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat.as_ref())?);
    }
    Ok(builder.build()?)
}

/// Directory prefix of a pattern up to the first component containing glob
/// syntax. A pattern without any glob syntax names a single file, whose base
/// is its parent directory.
pub fn glob_base(pattern: &str) -> String {
    let parts: Vec<&str> = pattern.split('/').collect();
    match parts.iter().position(|p| p.contains(GLOB_META)) {
        Some(idx) => parts[..idx].join("/"),
        None => parts[..parts.len().saturating_sub(1)].join("/"),
    }
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(GLOB_META)
}

#[derive(Debug, Clone)]
struct IncludePattern {
    pattern: String,
    base: String,
    matcher: GlobMatcher,
}

impl IncludePattern {
    /// Glob match, except that wildcards never select a dot-prefixed
    /// component. Only a segment spelled with a leading `.` does.
    fn selects(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path) && dot_components_named(&self.pattern, rel_path)
    }
}

fn dot_components_named(pattern: &str, rel_path: &str) -> bool {
    let segments: Vec<&str> = pattern.split('/').collect();
    let any_dot_segment = segments.iter().any(|s| s.starts_with('.'));
    let positional = !pattern.contains("**");

    rel_path.split('/').enumerate().all(|(idx, component)| {
        if !component.starts_with('.') {
            return true;
        }
        match segments.get(idx) {
            Some(segment) if positional => segment.starts_with('.'),
            _ => any_dot_segment,
        }
    })
}

/// Compiled include/exclude patterns, relative to a project root.
#[derive(Debug, Clone)]
pub struct Matcher {
    includes: Vec<IncludePattern>,
    excludes: Option<GlobSet>,
}

impl Matcher {
    /// Exclude patterns may carry a leading `!`, which is ignored.
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self> {
        if includes.is_empty() {
            return Err(AssetflowError::ConfigError(
                "a matcher needs at least one include pattern".to_string(),
            ));
        }

        let mut compiled = Vec::with_capacity(includes.len());
        for pat in includes {
            let pattern = pat.as_ref().trim_start_matches("./").to_string();
            let matcher = compile_glob(&pattern)?.compile_matcher();
            compiled.push(IncludePattern {
                base: glob_base(&pattern),
                pattern,
                matcher,
            });
        }

        let excludes: Vec<&str> = excludes
            .iter()
            .map(|p| p.as_ref().trim_start_matches('!').trim_start_matches("./"))
            .collect();
        let excludes = if excludes.is_empty() {
            None
        } else {
            Some(compile_globset(&excludes)?)
        };

        Ok(Self {
            includes: compiled,
            excludes,
        })
    }

    /// Matcher with include patterns only.
    pub fn include<S: AsRef<str>>(includes: &[S]) -> Result<Self> {
        Self::new::<S>(includes, &[])
    }

    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.excludes
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    /// Whether a root-relative path is selected by this matcher.
    pub fn is_match(&self, rel_path: &str) -> bool {
        !self.is_excluded(rel_path) && self.includes.iter().any(|i| i.selects(rel_path))
    }

    /// Resolve matching paths without reading them, paired with the base of
    /// the include pattern that selected each one.
    ///
    /// A missing or unreadable `root` is fatal, and so is a literal include
    /// (one naming a single file) that finds no file. A glob whose base is
    /// missing simply matches nothing.
    pub fn paths(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<(String, String)>> {
        if !fs.is_dir(root) {
            return Err(AssetflowError::MissingRoot(root.to_path_buf()));
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for include in &self.includes {
            let start = if include.base.is_empty() {
                root.to_path_buf()
            } else {
                root.join(&include.base)
            };

            let mut candidates = Vec::new();
            if is_literal(&include.pattern) {
                let file = root.join(&include.pattern);
                if !fs.is_file(&file) {
                    return Err(AssetflowError::MissingRoot(file));
                }
                candidates.push(file);
            } else if fs.is_dir(&start) {
                walk_files(fs, &start, &mut candidates);
            } else {
                debug!(pattern = %include.pattern, "pattern base does not exist; no matches");
            }

            for path in candidates {
                let Some(rel) = relative_to(root, &path) else {
                    continue;
                };
                if !include.selects(&rel) || self.is_excluded(&rel) {
                    continue;
                }
                if seen.insert(rel.clone()) {
                    out.push((rel, include.base.clone()));
                }
            }
        }

        Ok(out)
    }

    /// Load every matching file as a [`FileRecord`].
    ///
    /// With `since`, only files modified strictly after it are returned.
    /// Files that cannot be read are skipped with a warning.
    pub fn collect(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        since: Option<SystemTime>,
    ) -> Result<Vec<FileRecord>> {
        let mut records = Vec::new();

        for (rel, base) in self.paths(fs, root)? {
            let abs = root.join(&rel);

            let modified = match fs.modified(&abs) {
                Ok(m) => m,
                Err(err) => {
                    warn!(file = %rel, error = %err, "cannot stat file; skipping");
                    continue;
                }
            };

            if let Some(since) = since {
                if modified <= since {
                    continue;
                }
            }

            match fs.read(&abs) {
                Ok(contents) => records.push(FileRecord::new(rel, base, contents, modified)),
                Err(err) => {
                    warn!(file = %rel, error = %err, "cannot read file; skipping");
                }
            }
        }

        Ok(records)
    }
}

/// Depth-first listing of every file below `dir`, visiting entries in sorted
/// order.
fn walk_files(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) {
    let mut entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = ?dir, error = %err, "cannot read directory; skipping");
            return;
        }
    };
    entries.sort();

    for path in entries {
        if fs.is_dir(&path) {
            walk_files(fs, &path, out);
        } else if fs.is_file(&path) {
            out.push(path);
        }
    }
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}
