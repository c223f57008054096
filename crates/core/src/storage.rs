//! Durable key-value storage used by the history store.
//!
//! The store only needs three operations on a single key. Two implementations ship with the
//! core: [`MemoryStorage`] for tests and ephemeral runs, and [`rda_files::FileStore`] for
//! on-disk persistence.

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

pub trait KeyValueStorage: Send + Sync {
    /// Returns the bytes stored under `key`, or `None` if nothing has been stored.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces whatever is stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Clearing a missing key is not an error.
    fn clear(&self, key: &str) -> StorageResult<()>;
}

impl KeyValueStorage for rda_files::FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read(key)?)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        Ok(self.write(key, value)?)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        Ok(self.remove(key)?)
    }
}

/// In-process storage. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `value` under `key`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value.into());
        storage
    }

    fn lock(&self, key: &str) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries.lock().map_err(|_| StorageError::Backend {
            key: key.to_owned(),
            message: "memory storage lock poisoned".into(),
        })
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.lock(key)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.lock(key)?.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        self.lock(key)?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_storage_set_get_clear() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", b"one").unwrap();
        storage.set("k", b"two").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some(b"two".to_vec()));

        storage.clear("k").unwrap();
        storage.clear("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn with_entry_prepopulates() {
        let storage = MemoryStorage::with_entry("rda_history", "[]");
        assert_eq!(storage.get("rda_history").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn file_store_implements_storage() {
        let temp_dir = TempDir::new().unwrap();
        let store = rda_files::FileStore::new(temp_dir.path()).unwrap();
        let storage: &dyn KeyValueStorage = &store;

        storage.set("rda_history", b"{}").unwrap();
        assert_eq!(storage.get("rda_history").unwrap(), Some(b"{}".to_vec()));
        storage.clear("rda_history").unwrap();
        assert_eq!(storage.get("rda_history").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_invalid_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = rda_files::FileStore::new(temp_dir.path()).unwrap();

        let err = KeyValueStorage::set(&store, "../escape", b"x").unwrap_err();
        assert!(matches!(err, StorageError::Files(_)));
    }
}
