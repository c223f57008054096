//! RDA File Storage
//!
//! Durable key-value storage on the local filesystem. Each key is one file inside a single
//! storage directory:
//!
//! ```text
//! <storage_dir>/
//! ├── rda_history.json
//! └── .rda_history.json.tmp   # only while a write is in flight
//! ```
//!
//! ## Guarantees
//!
//! - Writes are atomic replaces: bytes go to a temporary sibling file which is flushed and then
//!   renamed over the target, so readers see either the old value or the new one, never a mix.
//! - Keys are restricted to `[A-Za-z0-9_-]`, so a key can never escape the storage directory.
//! - Reading or clearing a missing key is not an error.
//!
//! ## Example Usage
//!
//! ```no_run
//! use rda_files::FileStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new(Path::new("rda_data"))?;
//! store.write("rda_history", br#"{"version":1,"records":[]}"#)?;
//! assert!(store.read("rda_history")?.is_some());
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::{FileStore, MAX_KEY_LEN};

/// Errors that can occur during file storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Storage path exists but is not a directory, or cannot be created/canonicalised
    #[error("Invalid storage directory: {0}")]
    InvalidStorageDirectory(String),

    /// Key is empty, too long, or contains characters outside `[A-Za-z0-9_-]`
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
