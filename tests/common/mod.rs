#![allow(dead_code)]

use std::error::Error;
use std::fs;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use assetflow::pipeline::FileRecord;
use tempfile::TempDir;

pub use assetflow_test_utils::{init_tracing, with_timeout, ConfigFileBuilder, ProjectFixture};

pub type TestResult = Result<(), Box<dyn Error>>;

/// A record at a fixed, arbitrary modification time.
pub fn record(path: &str, contents: &str) -> FileRecord {
    FileRecord::new(path, "", contents, at(0))
}

pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_000 + secs)
}

/// A real directory tree, for code that goes through the OS.
pub fn temp_tree(files: &[(&str, &str)]) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(dir)
}
