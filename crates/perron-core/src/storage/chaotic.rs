//! Chaotic storage wrapper for fault injection testing.
//!
//! Delegates to an inner backend but fails a seeded fraction of operations
//! with `StorageError::Io`. Chaos tests use it to check that a failed write
//! never leaves a record that later reads back as something other than the
//! old value, the new value, or absence.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{RecordKey, Storage, StorageError};

/// Storage wrapper that randomly injects I/O failures.
///
/// Clones share the RNG and counters, so a clone handed to another component
/// draws from the same failure sequence.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure probability per operation, in [0.0, 1.0].
    failure_rate: f64,
    rng: Arc<Mutex<ChaCha8Rng>>,
    operations: Arc<Mutex<usize>>,
    failures: Arc<Mutex<usize>>,
}

impl<S: Storage> ChaoticStorage<S> {
    /// Wrap `inner`, failing operations with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            operations: Arc::new(Mutex::new(0)),
            failures: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage (for checking state after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of operations attempted.
    #[allow(clippy::expect_used)]
    pub fn operation_count(&self) -> usize {
        *self.operations.lock().expect("operation counter mutex poisoned")
    }

    /// Number of operations that were failed on purpose.
    #[allow(clippy::expect_used)]
    pub fn failure_count(&self) -> usize {
        *self.failures.lock().expect("failure counter mutex poisoned")
    }

    /// Count the operation and decide whether it fails.
    #[allow(clippy::expect_used)]
    fn inject(&self, op: &str, key: RecordKey) -> Result<(), StorageError> {
        *self.operations.lock().expect("operation counter mutex poisoned") += 1;

        let fail = self.rng.lock().expect("chaos RNG mutex poisoned").gen_bool(self.failure_rate);
        if fail {
            *self.failures.lock().expect("failure counter mutex poisoned") += 1;
            tracing::debug!(%key, op, "injected storage failure");
            return Err(StorageError::Io(format!("chaotic failure injection on {op} {key}")));
        }
        Ok(())
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn write(&self, key: RecordKey, bytes: &[u8]) -> Result<(), StorageError> {
        self.inject("write", key)?;
        self.inner.write(key, bytes)
    }

    fn read(&self, key: RecordKey) -> Result<Option<Vec<u8>>, StorageError> {
        self.inject("read", key)?;
        self.inner.read(key)
    }

    fn remove(&self, key: RecordKey) -> Result<(), StorageError> {
        self.inject("remove", key)?;
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[test]
    fn zero_rate_never_fails() {
        let storage = ChaoticStorage::new(MemoryStorage::new(), 0.0, 7);

        for _ in 0..100 {
            storage.write(RecordKey::SavedConnections, &[1]).unwrap();
        }
        assert_eq!(storage.operation_count(), 100);
        assert_eq!(storage.failure_count(), 0);
    }

    #[test]
    fn full_rate_always_fails_without_touching_inner() {
        let storage = ChaoticStorage::new(MemoryStorage::new(), 1.0, 7);

        let result = storage.write(RecordKey::SavedConnections, &[1]);
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(storage.inner().is_empty());
    }

    #[test]
    fn same_seed_same_failures() {
        let run = |seed| {
            let storage = ChaoticStorage::new(MemoryStorage::new(), 0.5, seed);
            (0..64)
                .map(|_| storage.read(RecordKey::PinnedConnection).is_err())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
    }
}
