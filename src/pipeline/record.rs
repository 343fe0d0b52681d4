// src/pipeline/record.rs

use std::time::SystemTime;

use crate::pipeline::sourcemap::SourceMap;

/// One file flowing through a task pipeline.
///
/// `path` is relative to the project root and always `/`-separated; it is the
/// record's identity (buckets and the orderer key on it). `base` is the glob
/// base the record was matched under, so a writer can place `relative()`
/// beneath a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub base: String,
    pub contents: Vec<u8>,
    pub modified: SystemTime,
    pub source_map: Option<SourceMap>,
}

impl FileRecord {
    pub fn new(
        path: impl Into<String>,
        base: impl Into<String>,
        contents: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents: contents.into(),
            modified,
            source_map: None,
        }
    }

    /// Path below `base`, e.g. `sub/logo.png` for `app/images/sub/logo.png`
    /// matched by `app/images/**/*.*`.
    pub fn relative(&self) -> &str {
        if self.base.is_empty() {
            return &self.path;
        }
        self.path
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.path)
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Replace the file name, keeping the directory part of `path`.
    pub fn set_file_name(&mut self, name: &str) {
        self.path = match self.path.rfind('/') {
            Some(idx) => format!("{}/{}", &self.path[..idx], name),
            None => name.to_string(),
        };
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}
