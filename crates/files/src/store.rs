//! Directory-scoped key-value store implementation.

use crate::FilesError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Maximum accepted key length in bytes.
pub const MAX_KEY_LEN: usize = 128;

const VALUE_EXTENSION: &str = "json";

/// Key-value store backed by one directory.
///
/// The store holds no open handles between calls: every operation opens, uses and releases the
/// files it needs. It implements `Debug` but not `Clone` (single-owner semantics).
#[derive(Debug)]
pub struct FileStore {
    storage_dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path exists but is not a directory
    /// - the directory cannot be created or canonicalised
    pub fn new(storage_dir: &Path) -> Result<Self, FilesError> {
        if storage_dir.exists() && !storage_dir.is_dir() {
            return Err(FilesError::InvalidStorageDirectory(format!(
                "Path is not a directory: {}",
                storage_dir.display()
            )));
        }

        fs::create_dir_all(storage_dir).map_err(|e| {
            FilesError::InvalidStorageDirectory(format!(
                "Cannot create directory {}: {}",
                storage_dir.display(),
                e
            ))
        })?;

        let storage_dir = storage_dir.canonicalize().map_err(|e| {
            FilesError::InvalidStorageDirectory(format!(
                "Cannot canonicalize path {}: {}",
                storage_dir.display(),
                e
            ))
        })?;

        Ok(Self { storage_dir })
    }

    /// Returns the canonicalised storage directory.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Reads the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the key is invalid or the file exists but cannot be read.
    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>, FilesError> {
        let path = self.value_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))),
        }
    }

    /// Atomically replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the key is invalid, or the temporary file cannot be written,
    /// flushed or renamed into place. On failure the previous value is left untouched.
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<(), FilesError> {
        let path = self.value_path(key)?;
        let tmp_path = self.temp_path(key);

        let result = write_synced(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(e) = result {
            // Best effort; the temp file is never read back.
            let _ = fs::remove_file(&tmp_path);
            return Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            )));
        }

        tracing::debug!(key, bytes = bytes.len(), "stored value");
        Ok(())
    }

    /// Removes the value stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the key is invalid or the file cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), FilesError> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to remove {}: {}", path.display(), e),
            ))),
        }
    }

    /// Path of the file holding `key`: `<storage_dir>/<key>.json`.
    fn value_path(&self, key: &str) -> Result<PathBuf, FilesError> {
        validate_key(key)?;
        Ok(self
            .storage_dir
            .join(format!("{}.{}", key, VALUE_EXTENSION)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.storage_dir
            .join(format!(".{}.{}.tmp", key, VALUE_EXTENSION))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn validate_key(key: &str) -> Result<(), FilesError> {
    if key.is_empty() {
        return Err(FilesError::InvalidKey("key cannot be empty".into()));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(FilesError::InvalidKey(format!(
            "key exceeds maximum length of {} characters",
            MAX_KEY_LEN
        )));
    }

    let ok = key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
    if !ok {
        return Err(FilesError::InvalidKey(format!(
            "key '{}' contains invalid characters (only alphanumeric, '-', '_' allowed)",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("rda_data");

        let store = FileStore::new(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(store.storage_dir().ends_with("rda_data"));
    }

    #[test]
    fn test_new_rejects_file_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        fs::write(&path, "not a directory").unwrap();

        let result = FileStore::new(&path);

        assert!(matches!(result, Err(FilesError::InvalidStorageDirectory(_))));
    }

    #[test]
    fn test_read_missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        assert_eq!(store.read("rda_history").unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.write("rda_history", b"[1,2,3]").unwrap();

        assert_eq!(store.read("rda_history").unwrap(), Some(b"[1,2,3]".to_vec()));
        assert!(temp.path().join("rda_history.json").is_file());
    }

    #[test]
    fn test_write_replaces_and_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.write("rda_history", b"first").unwrap();
        store.write("rda_history", b"second").unwrap();

        assert_eq!(store.read("rda_history").unwrap(), Some(b"second".to_vec()));
        assert!(!temp.path().join(".rda_history.json.tmp").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.write("rda_history", b"value").unwrap();
        store.remove("rda_history").unwrap();
        store.remove("rda_history").unwrap();

        assert_eq!(store.read("rda_history").unwrap(), None);
    }

    #[test]
    fn test_keys_are_isolated() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        store.write("first", b"1").unwrap();
        store.write("second", b"2").unwrap();
        store.remove("first").unwrap();

        assert_eq!(store.read("first").unwrap(), None);
        assert_eq!(store.read("second").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();

        for key in ["", "../escape", "a/b", "dot.key", "space key"] {
            assert!(
                matches!(store.write(key, b"x"), Err(FilesError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }

        let long_key = "k".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(store.read(&long_key), Err(FilesError::InvalidKey(_))));
    }
}
