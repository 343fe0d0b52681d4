// src/fs/mock.rs

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, modified: SystemTime },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock in seconds; every write advances it by one tick.
    ticks: u64,
}

/// In-memory filesystem with a logical clock.
///
/// Paths are normalised by dropping `.` components, so `./app/x.css` and
/// `app/x.css` name the same entry and `.` is the root.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn key(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn tick_time(ticks: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_000_000 + ticks)
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.entries.insert(PathBuf::new(), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a file, stamping it with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.ticks += 1;
        let modified = tick_time(state.ticks);
        Self::insert_file(&mut state, &key(path.as_ref()), content.into(), modified);
    }

    /// All file paths currently stored, sorted, `/`-separated.
    pub fn files(&self) -> Vec<String> {
        let state = self.lock();
        let mut files: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File { .. }))
            .map(|(p, _)| p.to_string_lossy().replace('\\', "/"))
            .collect();
        files.sort();
        files
    }

    fn insert_file(state: &mut MockState, path: &Path, contents: Vec<u8>, modified: SystemTime) {
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File { contents, modified });
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(state, parent);
            Self::link_child(state, parent, path);
        }
    }

    fn ensure_dir_entry(state: &mut MockState, path: &Path) {
        if state.entries.contains_key(path) {
            return;
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(state, parent);
            Self::link_child(state, parent, path);
        }
    }

    fn link_child(state: &mut MockState, parent: &Path, child: &Path) {
        let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }

    fn unlink_child(state: &mut MockState, path: &Path) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        let name = name.to_string_lossy();
        if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
            children.retain(|c| *c != name);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.lock();
        match state.entries.get(&key(path)) {
            Some(MockEntry::File { contents, .. }) => Ok(contents.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(&key(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(&key(path)),
            Some(MockEntry::File { .. })
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(&key(path)), Some(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.lock().entries.get(&key(path)) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Ok(UNIX_EPOCH),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        let k = key(path);
        match state.entries.get(&k) {
            Some(MockEntry::File { .. }) => {
                state.entries.remove(&k);
                Self::unlink_child(&mut state, &k);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        let k = key(path);
        if !matches!(state.entries.get(&k), Some(MockEntry::Dir(_))) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        state.entries.retain(|p, _| !p.starts_with(&k));
        Self::unlink_child(&mut state, &k);
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        match state.entries.get(&key(path)) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn now(&self) -> SystemTime {
        tick_time(self.lock().ticks)
    }
}
