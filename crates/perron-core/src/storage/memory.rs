#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{RecordKey, Storage, StorageError};

/// In-memory storage for tests and simulation.
///
/// State is wrapped in `Arc<Mutex<>>` so clones share one map. Uses
/// `lock().expect()`, which panics if the mutex is poisoned; acceptable for
/// test code.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<RecordKey, Vec<u8>>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys holding a value.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.records.lock().expect("Mutex poisoned").len()
    }

    /// Whether no key holds a value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful writes since creation.
    ///
    /// Lets tests assert that an operation did not touch the store.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn write_count(&self) -> usize {
        *self.writes.lock().expect("Mutex poisoned")
    }
}

impl Storage for MemoryStorage {
    #[allow(clippy::expect_used)]
    fn write(&self, key: RecordKey, bytes: &[u8]) -> Result<(), StorageError> {
        self.records.lock().expect("Mutex poisoned").insert(key, bytes.to_vec());
        *self.writes.lock().expect("Mutex poisoned") += 1;
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn read(&self, key: RecordKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.records.lock().expect("Mutex poisoned").get(&key).cloned())
    }

    #[allow(clippy::expect_used)]
    fn remove(&self, key: RecordKey) -> Result<(), StorageError> {
        self.records.lock().expect("Mutex poisoned").remove(&key);
        Ok(())
    }
}
