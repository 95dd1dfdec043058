//! Dispatcher context for inbound station and favorites messages.
//!
//! Owns the two pieces of state inbound traffic accumulates into: the
//! nearby-station list and the favorites receive buffer. Each accepted
//! favorite overwrites the stored favorites list, so a session interrupted
//! halfway still leaves the items received so far.

use perron_core::{
    BoundedVec, FavoriteDestination, MAX_FAVORITE_DESTINATIONS, MAX_NEARBY_STATIONS,
    RecordStore, Station, Storage, StorageError,
};
use tracing::{debug, info, warn};

use crate::DomainEvent;

/// Accumulated inbound state.
#[derive(Debug, Default)]
pub struct Dispatcher {
    stations: BoundedVec<Station, MAX_NEARBY_STATIONS>,
    received: BoundedVec<FavoriteDestination, MAX_FAVORITE_DESTINATIONS>,
    announced: Option<u32>,
}

impl Dispatcher {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stations received since the last search started.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Favorites received in the current session.
    pub fn received_favorites(&self) -> &[FavoriteDestination] {
        &self.received
    }

    /// Drop all stations, ahead of a new search.
    pub fn clear_stations(&mut self) {
        self.stations.clear();
    }

    /// Append a station. `None` if the list is full.
    pub fn station_found(&mut self, station: Station) -> Option<DomainEvent> {
        if self.stations.push(station.clone()).is_err() {
            warn!(id = %station.id, capacity = MAX_NEARBY_STATIONS, "station list full, dropping station");
            return None;
        }

        debug!(id = %station.id, name = %station.name, total = self.stations.len(), "station found");
        Some(DomainEvent::StationFound { station, total: self.stations.len() })
    }

    /// Start a receive session: reset the buffer. An announced count of zero
    /// also clears the stored favorites, since no item will arrive to
    /// overwrite them; the count message alone otherwise never writes.
    pub fn favorites_announced<S: Storage>(
        &mut self,
        announced: u32,
        store: &RecordStore<S>,
    ) -> Result<Vec<DomainEvent>, StorageError> {
        self.received.clear();
        self.announced = Some(announced);
        info!(announced, "favorites receive session started");

        let mut events = vec![DomainEvent::FavoritesSessionStarted { announced }];
        if announced == 0 {
            store.save_favorite_destinations(&[])?;
            events.push(DomainEvent::FavoritesReceiveComplete { count: 0 });
        }
        Ok(events)
    }

    /// Accept one favorite and overwrite the stored list.
    ///
    /// Items beyond [`MAX_FAVORITE_DESTINATIONS`] are dropped without touching
    /// the store. Items arriving without an announced count still accumulate.
    pub fn favorite_received<S: Storage>(
        &mut self,
        favorite: FavoriteDestination,
        store: &RecordStore<S>,
    ) -> Result<Vec<DomainEvent>, StorageError> {
        if self.received.push(favorite.clone()).is_err() {
            warn!(id = %favorite.id, capacity = MAX_FAVORITE_DESTINATIONS, "favorites buffer full, dropping item");
            return Ok(Vec::new());
        }

        let stored = store.save_favorite_destinations(&self.received)?;
        debug!(id = %favorite.id, label = %favorite.label, stored, "favorite received");

        let mut events = vec![DomainEvent::FavoriteReceived { favorite, stored }];
        if self.announced.is_some_and(|n| n as usize == self.received.len()) {
            info!(count = stored, "favorites receive session complete");
            self.announced = None;
            events.push(DomainEvent::FavoritesReceiveComplete { count: stored });
        }
        Ok(events)
    }
}
