//! Typed, bounded record sets on top of a [`Storage`] backend.
//!
//! Each record set is stored as two entries: a count and a CBOR list. Saves
//! clamp to the set's capacity and overwrite the whole set. Loads trust
//! nothing they read back:
//!
//! - no count entry: the set is empty
//! - count undecodable, negative, or above capacity: the set is empty
//! - list entry missing, undecodable, or shorter than the count: the set is
//!   empty
//!
//! Corruption is logged at warn and never surfaces as an error. Only backend
//! I/O failures do.

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    BoundedVec, FavoriteDestination, MAX_FAVORITE_DESTINATIONS, MAX_FAVORITE_STATIONS,
    MAX_SAVED_CONNECTIONS, SavedConnection, Station,
    storage::{RecordKey, Storage, StorageError},
};

/// Where and how one record set is stored.
#[derive(Debug, Clone, Copy)]
struct RecordSet {
    name: &'static str,
    count: RecordKey,
    items: RecordKey,
    capacity: usize,
}

const SAVED_CONNECTIONS: RecordSet = RecordSet {
    name: "saved connections",
    count: RecordKey::SavedConnectionsCount,
    items: RecordKey::SavedConnections,
    capacity: MAX_SAVED_CONNECTIONS,
};

const FAVORITE_STATIONS: RecordSet = RecordSet {
    name: "favorite stations",
    count: RecordKey::FavoriteStationsCount,
    items: RecordKey::FavoriteStations,
    capacity: MAX_FAVORITE_STATIONS,
};

const FAVORITE_DESTINATIONS: RecordSet = RecordSet {
    name: "favorite destinations",
    count: RecordKey::FavoriteDestinationsCount,
    items: RecordKey::FavoriteDestinations,
    capacity: MAX_FAVORITE_DESTINATIONS,
};

/// Persistent store for saved routes, favorite stations and favorite
/// destinations.
///
/// Cheap to clone when the backend is.
#[derive(Clone)]
pub struct RecordStore<S: Storage> {
    storage: S,
}

impl<S: Storage> RecordStore<S> {
    /// Wrap a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Underlying backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace the saved routes, keeping at most [`MAX_SAVED_CONNECTIONS`].
    /// Returns the number stored.
    pub fn save_connections(&self, connections: &[SavedConnection]) -> Result<usize, StorageError> {
        self.save(SAVED_CONNECTIONS, connections)
    }

    /// Saved routes. Empty if none are stored or the stored set is corrupt.
    pub fn load_connections(
        &self,
    ) -> Result<BoundedVec<SavedConnection, MAX_SAVED_CONNECTIONS>, StorageError> {
        Ok(BoundedVec::clamped(self.load(SAVED_CONNECTIONS)?))
    }

    /// Copy the saved routes into `out` and return how many were copied.
    ///
    /// Returns 0 and leaves `out` untouched if nothing valid is stored or the
    /// stored count does not fit `out`.
    pub fn load_connections_into(&self, out: &mut [SavedConnection]) -> Result<usize, StorageError> {
        self.load_into(SAVED_CONNECTIONS, out)
    }

    /// Whether saving one more route would have to clamp.
    pub fn is_connection_limit_reached(&self) -> Result<bool, StorageError> {
        Ok(self.load_connections()?.len() >= MAX_SAVED_CONNECTIONS)
    }

    /// Replace the favorite stations, keeping at most
    /// [`MAX_FAVORITE_STATIONS`]. Returns the number stored.
    pub fn save_favorite_stations(&self, stations: &[Station]) -> Result<usize, StorageError> {
        self.save(FAVORITE_STATIONS, stations)
    }

    /// Favorite stations. Empty if none are stored or the stored set is
    /// corrupt.
    pub fn load_favorite_stations(
        &self,
    ) -> Result<BoundedVec<Station, MAX_FAVORITE_STATIONS>, StorageError> {
        Ok(BoundedVec::clamped(self.load(FAVORITE_STATIONS)?))
    }

    /// Copy the favorite stations into `out`. See
    /// [`RecordStore::load_connections_into`].
    pub fn load_favorite_stations_into(&self, out: &mut [Station]) -> Result<usize, StorageError> {
        self.load_into(FAVORITE_STATIONS, out)
    }

    /// Replace the favorite destinations, keeping at most
    /// [`MAX_FAVORITE_DESTINATIONS`]. Returns the number stored.
    pub fn save_favorite_destinations(
        &self,
        favorites: &[FavoriteDestination],
    ) -> Result<usize, StorageError> {
        self.save(FAVORITE_DESTINATIONS, favorites)
    }

    /// Favorite destinations. Empty if none are stored or the stored set is
    /// corrupt.
    pub fn load_favorite_destinations(
        &self,
    ) -> Result<BoundedVec<FavoriteDestination, MAX_FAVORITE_DESTINATIONS>, StorageError> {
        Ok(BoundedVec::clamped(self.load(FAVORITE_DESTINATIONS)?))
    }

    /// Copy the favorite destinations into `out`. See
    /// [`RecordStore::load_connections_into`].
    pub fn load_favorite_destinations_into(
        &self,
        out: &mut [FavoriteDestination],
    ) -> Result<usize, StorageError> {
        self.load_into(FAVORITE_DESTINATIONS, out)
    }

    fn save<T: Serialize>(&self, set: RecordSet, records: &[T]) -> Result<usize, StorageError> {
        let kept = records.len().min(set.capacity);
        if kept < records.len() {
            warn!(set = set.name, requested = records.len(), kept, "clamping record set to capacity");
        }

        // List first: a crash between the writes leaves an old count over a
        // new list, which loads as either a valid prefix or absence.
        self.storage.write(set.items, &encode(&records[..kept])?)?;
        self.storage.write(set.count, &encode(&(kept as i64))?)?;

        debug!(set = set.name, count = kept, "saved record set");
        Ok(kept)
    }

    fn load<T: DeserializeOwned>(&self, set: RecordSet) -> Result<Vec<T>, StorageError> {
        let Some(count) = self.stored_count(set)? else {
            return Ok(Vec::new());
        };
        if count == 0 {
            return Ok(Vec::new());
        }

        let Some(bytes) = self.storage.read(set.items)? else {
            warn!(set = set.name, count, "record count present but list missing, treating as empty");
            return Ok(Vec::new());
        };

        let mut records: Vec<T> = match ciborium::from_reader(bytes.as_slice()) {
            Ok(records) => records,
            Err(e) => {
                warn!(set = set.name, error = %e, "corrupted record list, treating as empty");
                return Ok(Vec::new());
            },
        };

        if records.len() < count {
            warn!(
                set = set.name,
                count,
                found = records.len(),
                "record list shorter than count, treating as empty"
            );
            return Ok(Vec::new());
        }

        records.truncate(count);
        Ok(records)
    }

    fn load_into<T: DeserializeOwned>(
        &self,
        set: RecordSet,
        out: &mut [T],
    ) -> Result<usize, StorageError> {
        let records = self.load::<T>(set)?;
        if records.len() > out.len() {
            warn!(
                set = set.name,
                count = records.len(),
                buffer = out.len(),
                "stored count exceeds destination buffer, treating as empty"
            );
            return Ok(0);
        }

        let count = records.len();
        for (slot, record) in out.iter_mut().zip(records) {
            *slot = record;
        }
        Ok(count)
    }

    /// Validated stored count. `None` if absent or invalid.
    fn stored_count(&self, set: RecordSet) -> Result<Option<usize>, StorageError> {
        let Some(bytes) = self.storage.read(set.count)? else {
            return Ok(None);
        };

        let raw: i64 = match ciborium::from_reader(bytes.as_slice()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(set = set.name, error = %e, "corrupted record count, treating as empty");
                return Ok(None);
            },
        };

        match usize::try_from(raw) {
            Ok(count) if count <= set.capacity => Ok(Some(count)),
            _ => {
                warn!(set = set.name, count = raw, capacity = set.capacity, "record count out of range, treating as empty");
                Ok(None)
            },
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(buf)
}
