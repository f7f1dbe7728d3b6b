//! The persistence medium behind [`EventStore`](crate::store::EventStore).
//!
//! The store only ever needs whole-value reads and writes of a single string
//! slot, so the medium is modelled as a tiny string key-value interface. The
//! browser's `localStorage` is the production shape of it; the CLI uses one
//! file per key, tests use memory.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{DatebookError, Result};

pub trait KeyValueStorage {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process storage. An optional byte capacity makes writes fail the way a
/// full `localStorage` quota does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: Some(bytes),
        }
    }

    /// Seed a slot directly, bypassing the capacity check.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(capacity) = self.capacity {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > capacity {
                return Err(DatebookError::StorageWrite(format!(
                    "quota exceeded: {} bytes needed, {} available",
                    needed, capacity
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DatebookError::StorageRead(format!(
                "{}: {}",
                self.path_for(key).display(),
                e
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let write = || -> std::io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            // Write-then-rename so a crash never leaves half a blob behind.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| DatebookError::StorageWrite(format!("{}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DatebookError::Io(e)),
        }
    }
}
