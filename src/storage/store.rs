use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Keys of the per-user profile records
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Preferences(String),
    Watchlist(String),
    History(String),
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Preferences(user) => write!(f, "preferences_{}", user),
            StorageKey::Watchlist(user) => write!(f, "watchlist_{}", user),
            StorageKey::History(user) => write!(f, "history_{}", user),
        }
    }
}

/// String key-value storage holding JSON documents
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>>;

    fn set(&self, key: &StorageKey, value: &str) -> AppResult<()>;

    fn remove(&self, key: &StorageKey) -> AppResult<()>;
}

/// One JSON file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        // User ids are opaque; keep them from escaping the root
        let file_name: String = key
            .to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file_name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &StorageKey, value: &str) -> AppResult<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.path_for(key), value)
            .map_err(|e| AppError::Storage(format!("Failed to save {}: {}", key, e)))?;
        tracing::debug!(key = %key, bytes = value.len(), "Stored profile record");
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> AppResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to remove {}: {}", key, e))),
        }
    }
}

/// In-process store, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        Ok(self.entries().get(&key.to_string()).cloned())
    }

    fn set(&self, key: &StorageKey, value: &str) -> AppResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> AppResult<()> {
        self.entries().remove(&key.to_string());
        Ok(())
    }
}
