// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface used by every pipeline stage.
///
/// `now()` belongs here because "since last run" compares file modification
/// times with task start times, and both must come from the same clock.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Create parent directories as needed and replace the file contents.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn modified(&self, path: &Path) -> Result<SystemTime>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Current time on the clock that stamps modification times.
    fn now(&self) -> SystemTime;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file =
            fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents)
            .with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
        meta.modified()
            .with_context(|| format!("reading modification time of {:?}", path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).with_context(|| format!("removing dir {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
