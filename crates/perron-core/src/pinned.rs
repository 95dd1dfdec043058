//! Pinned connection lifecycle.
//!
//! A single slot, independent of the record sets. An empty or unreadable
//! slot loads as the explicit inactive record, so callers never have to
//! distinguish "absent" from "cleared". The slot does not expire by itself:
//! whoever loads it checks [`PinnedConnection::is_expired`] and clears.

use tracing::{info, warn};

use crate::{
    PinnedConnection,
    storage::{RecordKey, Storage, StorageError},
};

/// Storage slot for the pinned connection.
#[derive(Clone)]
pub struct PinnedSlot<S: Storage> {
    storage: S,
}

impl<S: Storage> PinnedSlot<S> {
    /// Wrap a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Overwrite the slot.
    pub fn save(&self, pinned: &PinnedConnection) -> Result<(), StorageError> {
        let mut buf = Vec::new();
        ciborium::into_writer(pinned, &mut buf)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.write(RecordKey::PinnedConnection, &buf)?;

        info!(active = pinned.active, arrival = pinned.connection.arrival_time, "pinned connection saved");
        Ok(())
    }

    /// Current slot contents. The inactive default if nothing valid is
    /// stored.
    pub fn load(&self) -> Result<PinnedConnection, StorageError> {
        let Some(bytes) = self.storage.read(RecordKey::PinnedConnection)? else {
            info!("no pinned connection stored");
            return Ok(PinnedConnection::default());
        };

        match ciborium::from_reader::<PinnedConnection, _>(bytes.as_slice()) {
            Ok(pinned) => {
                info!(active = pinned.active, "loaded pinned connection");
                Ok(pinned)
            },
            Err(e) => {
                warn!(error = %e, "corrupted pinned connection, treating as inactive");
                Ok(PinnedConnection::default())
            },
        }
    }

    /// Replace the slot with the explicit inactive record.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.save(&PinnedConnection::default())?;
        info!("pinned connection cleared");
        Ok(())
    }

    /// Load the slot, clearing it first if the pin has expired at `now`
    /// (epoch seconds). Returns what survives: the pin, or the inactive
    /// record.
    pub fn load_unexpired(&self, now: i64) -> Result<PinnedConnection, StorageError> {
        let pinned = self.load()?;
        if pinned.is_expired(now) {
            info!(arrival = pinned.connection.arrival_time, now, "pinned connection expired");
            self.clear()?;
            return Ok(PinnedConnection::default());
        }
        Ok(pinned)
    }
}
