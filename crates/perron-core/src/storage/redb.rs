//! Redb-backed durable storage.
//!
//! One table holds every record. Writes run in their own ACID transaction,
//! so a crash leaves either the old or the new value, never a torn one.

use std::{path::Path, sync::Arc};

use redb::{Database, TableDefinition};

use super::{RecordKey, Storage, StorageError};

/// Table: records
/// Key: `RecordKey` as big-endian u32 [4 bytes]
/// Value: CBOR-encoded record or count
const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at `path`, creating the records table
    /// if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(RECORDS).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn write(&self, key: RecordKey, bytes: &[u8]) -> Result<(), StorageError> {
        let key = key.to_bytes();
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(RECORDS).map_err(|e| StorageError::Io(e.to_string()))?;
            table.insert(key.as_slice(), bytes).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))
    }

    fn read(&self, key: RecordKey) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_bytes();
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(RECORDS).map_err(|e| StorageError::Io(e.to_string()))?;

        let value = table.get(key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn remove(&self, key: RecordKey) -> Result<(), StorageError> {
        let key = key.to_bytes();
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(RECORDS).map_err(|e| StorageError::Io(e.to_string()))?;
            table.remove(key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_key_encoding() {
        assert_eq!(RecordKey::SavedConnections.to_bytes(), [0, 0, 0, 1]);
        assert_eq!(RecordKey::PinnedConnection.to_bytes(), [0, 0, 0, 100]);
    }

    #[test]
    fn test_write_read_remove() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        assert_eq!(storage.read(RecordKey::FavoriteDestinations).unwrap(), None);

        storage.write(RecordKey::FavoriteDestinations, b"first").unwrap();
        storage.write(RecordKey::FavoriteDestinations, b"second").unwrap();
        assert_eq!(
            storage.read(RecordKey::FavoriteDestinations).unwrap().as_deref(),
            Some(&b"second"[..])
        );

        storage.remove(RecordKey::FavoriteDestinations).unwrap();
        assert!(!storage.exists(RecordKey::FavoriteDestinations).unwrap());

        // Removing again is a no-op.
        storage.remove(RecordKey::FavoriteDestinations).unwrap();
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.write(RecordKey::PinnedConnection, &[7; 32]).unwrap();
        }

        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.read(RecordKey::PinnedConnection).unwrap(), Some(vec![7; 32]));
    }
}
