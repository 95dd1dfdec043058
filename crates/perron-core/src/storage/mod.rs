//! Storage abstraction for Perron records.
//!
//! Backends store opaque byte blobs under a small fixed set of
//! [`RecordKey`]s. Encoding, validation and clamping live one layer up in
//! [`crate::RecordStore`] and [`crate::PinnedSlot`]; a backend never
//! interprets what it stores. The trait is synchronous, matching the
//! single-threaded callback model of the client.

mod chaotic;
mod error;
mod memory;
mod redb;

use std::fmt;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;

pub use self::redb::RedbStorage;

/// Logical record key.
///
/// The numeric values are persisted and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum RecordKey {
    /// Saved route list.
    SavedConnections = 1,
    /// Favorite station list.
    FavoriteStations = 2,
    /// Number of saved routes.
    SavedConnectionsCount = 3,
    /// Number of favorite stations.
    FavoriteStationsCount = 4,
    /// Favorite destination list.
    FavoriteDestinations = 5,
    /// Number of favorite destinations.
    FavoriteDestinationsCount = 6,
    /// Pinned connection slot.
    PinnedConnection = 100,
}

impl RecordKey {
    /// Numeric key value.
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Big-endian key bytes, as stored by byte-keyed backends.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.to_u32().to_be_bytes()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.to_u32())
    }
}

/// Key/value storage for record blobs.
///
/// Must be Clone (the record store and pinned slot share one backend), Send +
/// Sync, and synchronous. Implementations share internal state via Arc, so
/// clones access the same underlying storage.
///
/// # Panics
///
/// In-memory implementations may panic if an internal mutex is poisoned.
/// Acceptable for test and simulation code.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Store `bytes` under `key`, replacing any previous value.
    fn write(&self, key: RecordKey, bytes: &[u8]) -> Result<(), StorageError>;

    /// Stored bytes for `key`. `None` if never written or removed.
    fn read(&self, key: RecordKey) -> Result<Option<Vec<u8>>, StorageError>;

    /// Delete `key`. Removing an absent key is a no-op.
    fn remove(&self, key: RecordKey) -> Result<(), StorageError>;

    /// Whether `key` holds a value.
    fn exists(&self, key: RecordKey) -> Result<bool, StorageError> {
        Ok(self.read(key)?.is_some())
    }
}
