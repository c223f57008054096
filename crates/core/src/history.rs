//! Capacity-bounded, most-recent-first history of analysis records.
//!
//! The history is loaded once from a [`KeyValueStorage`] when the store is opened and written
//! back in full after every mutation. Persistence failures are logged and otherwise ignored:
//! the in-memory list stays authoritative for the rest of the process.
//!
//! On disk the list is wrapped in a small envelope carrying a format version:
//!
//! ```json
//! { "version": 1, "records": [ ... ] }
//! ```

use crate::constants::{HISTORY_FORMAT_VERSION, HISTORY_STORAGE_KEY};
use crate::error::{StorageError, StorageResult};
use crate::record::AnalysisRecord;
use crate::storage::KeyValueStorage;
use rda_uuid::Identifier;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    records: &'a [AnalysisRecord],
}

#[derive(Deserialize)]
struct VersionTag {
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    records: Vec<AnalysisRecord>,
}

fn encode(records: &[AnalysisRecord]) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(&EnvelopeRef {
        version: HISTORY_FORMAT_VERSION,
        records,
    })
    .map_err(StorageError::Serialization)
}

fn decode(bytes: &[u8]) -> StorageResult<Vec<AnalysisRecord>> {
    let tag: VersionTag = serde_json::from_slice(bytes).map_err(StorageError::Deserialization)?;
    if tag.version != HISTORY_FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: tag.version,
            expected: HISTORY_FORMAT_VERSION,
        });
    }
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(StorageError::Deserialization)?;
    Ok(envelope.records)
}

pub struct HistoryStore {
    storage: Arc<dyn KeyValueStorage>,
    capacity: NonZeroUsize,
    records: Mutex<Vec<AnalysisRecord>>,
    /// Storage holds bytes that could not be decoded and have not been overwritten yet.
    unreadable: AtomicBool,
}

impl HistoryStore {
    /// Opens the history persisted in `storage`.
    ///
    /// Missing, malformed or unreadable data yields an empty history (with a warning for the
    /// latter two). A persisted list longer than `capacity` is cut down to its `capacity` most
    /// recent records.
    pub fn load(storage: Arc<dyn KeyValueStorage>, capacity: NonZeroUsize) -> Self {
        let mut unreadable = false;
        let mut records = match storage.get(HISTORY_STORAGE_KEY) {
            Ok(Some(bytes)) => decode(&bytes).unwrap_or_else(|e| {
                tracing::warn!(key = HISTORY_STORAGE_KEY, error = %e, "discarding unreadable history");
                unreadable = true;
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = HISTORY_STORAGE_KEY, error = %e, "failed to load history");
                Vec::new()
            }
        };

        if records.len() > capacity.get() {
            tracing::info!(
                loaded = records.len(),
                capacity = capacity.get(),
                "truncating history to capacity"
            );
            records.truncate(capacity.get());
        }

        tracing::debug!(records = records.len(), "history loaded");

        Self {
            storage,
            capacity,
            records: Mutex::new(records),
            unreadable: AtomicBool::new(unreadable),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Prepends `record`, evicting the oldest entries beyond capacity.
    pub fn add(&self, record: AnalysisRecord) {
        let mut records = self.lock();
        records.insert(0, record);
        if records.len() > self.capacity.get() {
            let evicted = records.len() - self.capacity.get();
            records.truncate(self.capacity.get());
            tracing::debug!(evicted, "history at capacity");
        }
        self.persist(&records);
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: Identifier) -> bool {
        let mut records = self.lock();
        match records.iter().position(|r| r.id() == id) {
            Some(index) => {
                records.remove(index);
                self.persist(&records);
                true
            }
            None => false,
        }
    }

    /// Empties the history and clears the persisted key.
    ///
    /// An already empty history leaves storage untouched, unless the key still holds bytes
    /// that were discarded on load.
    pub fn clear(&self) {
        let mut records = self.lock();
        let unreadable = self.unreadable.swap(false, Ordering::SeqCst);
        if records.is_empty() && !unreadable {
            return;
        }
        records.clear();
        if let Err(e) = self.storage.clear(HISTORY_STORAGE_KEY) {
            tracing::warn!(key = HISTORY_STORAGE_KEY, error = %e, "failed to clear persisted history");
        }
    }

    /// Snapshot of the history, most recent first.
    pub fn list(&self) -> Vec<AnalysisRecord> {
        self.lock().clone()
    }

    pub fn get(&self, id: Identifier) -> Option<AnalysisRecord> {
        self.lock().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AnalysisRecord>> {
        // A panic while holding the lock cannot leave the Vec half-modified.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, records: &[AnalysisRecord]) {
        let result = encode(records).and_then(|bytes| self.storage.set(HISTORY_STORAGE_KEY, &bytes));
        match result {
            Ok(()) => self.unreadable.store(false, Ordering::SeqCst),
            Err(e) => {
                tracing::warn!(key = HISTORY_STORAGE_KEY, error = %e, "failed to persist history");
            }
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::tests::{response_with_citations, test_assembler};
    use crate::storage::MemoryStorage;
    use std::sync::atomic::AtomicUsize;

    struct FailingStorage {
        writes: AtomicUsize,
    }

    impl KeyValueStorage for FailingStorage {
        fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
            Err(StorageError::Backend {
                key: key.into(),
                message: "quota exceeded".into(),
            })
        }

        fn set(&self, key: &str, _value: &[u8]) -> StorageResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Backend {
                key: key.into(),
                message: "quota exceeded".into(),
            })
        }

        fn clear(&self, key: &str) -> StorageResult<()> {
            Err(StorageError::Backend {
                key: key.into(),
                message: "quota exceeded".into(),
            })
        }
    }

    /// Counts writes so tests can check when nothing was persisted.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        sets: AtomicUsize,
        clears: AtomicUsize,
    }

    impl KeyValueStorage for CountingStorage {
        fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn clear(&self, key: &str) -> StorageResult<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear(key)
        }
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn records(n: usize) -> Vec<AnalysisRecord> {
        let assembler = test_assembler();
        (0..n)
            .map(|i| {
                assembler
                    .assemble(&response_with_citations(&["text"]), &format!("text {}", i))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn add_prepends_and_evicts_oldest() {
        let store = HistoryStore::load(Arc::new(MemoryStorage::new()), capacity(50));
        let all = records(51);

        for record in &all {
            store.add(record.clone());
        }

        let listed = store.list();
        assert_eq!(listed.len(), 50);
        assert_eq!(listed[0], all[50]);
        assert_eq!(listed[49], all[1]);
        assert!(store.get(all[0].id()).is_none());
    }

    #[test]
    fn remove_unknown_id_is_noop_without_write() {
        let storage = Arc::new(CountingStorage::default());
        let store = HistoryStore::load(storage.clone(), capacity(5));
        let all = records(2);
        store.add(all[0].clone());
        let writes_before = storage.sets.load(Ordering::SeqCst);

        assert!(!store.remove(all[1].id()));

        assert_eq!(store.list(), vec![all[0].clone()]);
        assert_eq!(storage.sets.load(Ordering::SeqCst), writes_before);
    }

    #[test]
    fn remove_deletes_matching_record() {
        let store = HistoryStore::load(Arc::new(MemoryStorage::new()), capacity(5));
        let all = records(3);
        for record in &all {
            store.add(record.clone());
        }

        assert!(store.remove(all[1].id()));

        assert_eq!(store.list(), vec![all[2].clone(), all[0].clone()]);
    }

    #[test]
    fn clear_empties_and_clears_storage() {
        let storage = Arc::new(CountingStorage::default());
        let store = HistoryStore::load(storage.clone(), capacity(5));
        store.clear();
        assert_eq!(storage.clears.load(Ordering::SeqCst), 0);

        store.add(records(1).remove(0));
        store.clear();

        assert!(store.is_empty());
        assert_eq!(storage.clears.load(Ordering::SeqCst), 1);
        assert_eq!(storage.inner.get(HISTORY_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn persisted_history_round_trips() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let all = records(3);
        {
            let store = HistoryStore::load(storage.clone(), capacity(10));
            for record in &all {
                store.add(record.clone());
            }
        }

        let reopened = HistoryStore::load(storage, capacity(10));

        assert_eq!(
            reopened.list(),
            vec![all[2].clone(), all[1].clone(), all[0].clone()]
        );
        assert_eq!(reopened.list()[0].patterns()[0].range(), all[2].patterns()[0].range());
    }

    #[test]
    fn persisted_scores_reload_bit_for_bit() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let assembler = test_assembler();
        let scores = [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            -1.603964615428183e143,
            0.1 + 0.2,
        ];
        let all: Vec<AnalysisRecord> = scores
            .iter()
            .map(|score| {
                let mut raw = response_with_citations(&["text"]);
                raw["score"] = serde_json::json!(score);
                raw["fingerprint"]["validationScore"] = serde_json::json!(score / 3.0);
                assembler.assemble(&raw, "some text").unwrap()
            })
            .collect();
        {
            let store = HistoryStore::load(storage.clone(), capacity(10));
            for record in &all {
                store.add(record.clone());
            }
        }

        let reopened = HistoryStore::load(storage, capacity(10));

        for record in &all {
            let loaded = reopened.get(record.id()).unwrap();
            assert_eq!(loaded.score().to_bits(), record.score().to_bits());
            assert_eq!(loaded, *record);
        }
    }

    #[test]
    fn clear_removes_bytes_discarded_on_load() {
        let storage = Arc::new(CountingStorage {
            inner: MemoryStorage::with_entry(HISTORY_STORAGE_KEY, &b"{\"version\": 7}"[..]),
            ..Default::default()
        });
        let store = HistoryStore::load(storage.clone(), capacity(5));
        assert!(store.is_empty());

        store.clear();
        assert_eq!(storage.clears.load(Ordering::SeqCst), 1);
        assert_eq!(storage.inner.get(HISTORY_STORAGE_KEY).unwrap(), None);

        store.clear();
        assert_eq!(storage.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn persisted_bytes_carry_version() {
        let storage = Arc::new(MemoryStorage::new());
        let store = HistoryStore::load(storage.clone(), capacity(10));
        store.add(records(1).remove(0));

        let bytes = storage.get(HISTORY_STORAGE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["records"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn malformed_or_unknown_data_loads_empty() {
        let payloads: [&[u8]; 4] = [
            b"not json",
            br#"[]"#,
            br#"{"version": 2, "records": []}"#,
            br#"{"version": 1, "records": [{"id": "nope"}]}"#,
        ];
        for payload in payloads {
            let storage = MemoryStorage::with_entry(HISTORY_STORAGE_KEY, payload);
            let store = HistoryStore::load(Arc::new(storage), capacity(10));
            assert!(store.is_empty());
        }
    }

    #[test]
    fn loaded_history_is_truncated_to_capacity() {
        let all = records(5);
        let bytes = encode(&all).unwrap();
        let storage = MemoryStorage::with_entry(HISTORY_STORAGE_KEY, bytes);

        let store = HistoryStore::load(Arc::new(storage), capacity(3));

        assert_eq!(store.list(), all[..3].to_vec());
        assert_eq!(store.capacity(), 3);
    }

    #[test]
    fn storage_failure_keeps_memory_state() {
        let storage = Arc::new(FailingStorage {
            writes: AtomicUsize::new(0),
        });
        let store = HistoryStore::load(storage.clone(), capacity(5));
        let all = records(2);

        store.add(all[0].clone());
        store.add(all[1].clone());
        assert!(store.remove(all[0].id()));

        assert_eq!(store.list(), vec![all[1].clone()]);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 3);

        store.clear();
        assert!(store.is_empty());
    }
}
