//! Client-local key-value storage.
//!
//! Session tokens and the backend list survive process restarts through a
//! [`LocalStore`]. [`FileStore`] keeps everything in one JSON document that is
//! replaced atomically on every write; [`MemoryStore`] is used by tests and
//! short-lived embeddings.

mod error;

pub use error::StorageError;

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the API key.
pub const API_KEY_KEY: &str = "apiKey";
/// Key holding the serialized backend configuration list.
pub const API_CONFIG_KEY: &str = "api_config";

/// A single pending change: `Some(value)` writes, `None` removes.
pub type Change<'a> = (&'a str, Option<&'a str>);

/// Persistent string key-value store.
///
/// `apply` must persist the whole batch or nothing.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(&[(key, None)])
    }
}

fn apply_changes(entries: &mut BTreeMap<String, String>, changes: &[Change<'_>]) {
    for (key, value) in changes {
        match value {
            Some(v) => {
                entries.insert((*key).to_string(), (*v).to_string());
            }
            None => {
                entries.remove(*key);
            }
        }
    }
}

/// In-memory store; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StorageError> {
        apply_changes(&mut self.entries.write(), changes);
        Ok(())
    }
}

/// JSON-file backed store.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write never leaves a truncated document behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened state file");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StorageError> {
        let mut guard = self.entries.write();
        let mut next = guard.clone();
        apply_changes(&mut next, changes);
        self.write_file(&next)?;
        *guard = next;
        Ok(())
    }
}
