//! Key-value storage scopes backing the session record.
//!
//! A scope behaves like browser storage: string keys to string values with
//! last-writer-wins semantics and no transactions. [`MemoryScope`] lives for the
//! process (the transient scope); [`FileScope`] is written through to a JSON
//! file and survives restarts (the durable scope).

mod session;

pub use session::{Durability, SessionStorage};

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait StorageScope: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-lifetime scope
#[derive(Debug, Default)]
pub struct MemoryScope {
    entries: DashMap<String, String>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageScope for MemoryScope {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Scope persisted as a single JSON object on disk.
///
/// The file is read once on open and rewritten in full after every mutation.
#[derive(Debug)]
pub struct FileScope {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileScope {
    /// Open the scope at `path`. A missing file starts empty; an unreadable or
    /// malformed file is logged and also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring malformed storage file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read storage file");
                BTreeMap::new()
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file storage scope");
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content).map_err(io_err)
    }
}

impl StorageScope for FileScope {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_scope_basic_operations() {
        let scope = MemoryScope::new();
        assert_eq!(scope.get("k").unwrap(), None);

        scope.set("k", "v1").unwrap();
        scope.set("k", "v2").unwrap();
        assert_eq!(scope.get("k").unwrap().as_deref(), Some("v2"));

        scope.remove("k").unwrap();
        scope.remove("k").unwrap();
        assert_eq!(scope.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_scope_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");

        let scope = FileScope::open(&path);
        scope.set("qms_user", "{\"id\":1}").unwrap();
        drop(scope);

        let reopened = FileScope::open(&path);
        assert_eq!(reopened.get("qms_user").unwrap().as_deref(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_file_scope_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");

        let scope = FileScope::open(&path);
        scope.set("a", "1").unwrap();
        scope.set("b", "2").unwrap();
        scope.remove("a").unwrap();

        let reopened = FileScope::open(&path);
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_file_scope_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        std::fs::write(&path, "not json").unwrap();

        let scope = FileScope::open(&path);
        assert_eq!(scope.get("qms_user").unwrap(), None);

        scope.set("qms_user", "x").unwrap();
        assert_eq!(FileScope::open(&path).get("qms_user").unwrap().as_deref(), Some("x"));
    }
}
