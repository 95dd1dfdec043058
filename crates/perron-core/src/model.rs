//! Record model: stations, saved routes, favorites and connections.
//!
//! All text fields are [`FixedStr`] buffers and all lists are bounded, so a
//! record's size is known up front. Timestamps are seconds since the Unix
//! epoch.

use serde::{Deserialize, Serialize};

use crate::{BoundedVec, FavoriteLabel, Platform, StationId, StationName, TrainType};

/// Maximum number of saved routes.
pub const MAX_SAVED_CONNECTIONS: usize = 10;
/// Maximum number of favorite destinations.
pub const MAX_FAVORITE_DESTINATIONS: usize = 10;
/// Maximum number of favorite stations.
pub const MAX_FAVORITE_STATIONS: usize = 20;
/// Maximum number of legs in one connection.
pub const MAX_SECTIONS: usize = 5;
/// Maximum number of stations kept from one nearby search.
pub const MAX_NEARBY_STATIONS: usize = 50;

/// A transit station.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Station identifier.
    pub id: StationId,
    /// Display name.
    pub name: StationName,
    /// Distance from the user in meters. Advisory only.
    pub distance_meters: i32,
}

impl Station {
    /// Create a station, truncating text fields to capacity.
    pub fn new(id: &str, name: &str, distance_meters: i32) -> Self {
        Self { id: id.into(), name: name.into(), distance_meters }
    }
}

/// A persisted departure/arrival pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    /// Departure station identifier.
    pub departure_id: StationId,
    /// Departure station name.
    pub departure_name: StationName,
    /// Arrival station identifier.
    pub arrival_id: StationId,
    /// Arrival station name.
    pub arrival_name: StationName,
}

impl SavedConnection {
    /// Create a route, truncating text fields to capacity.
    pub fn new(departure_id: &str, departure_name: &str, arrival_id: &str, arrival_name: &str) -> Self {
        Self {
            departure_id: departure_id.into(),
            departure_name: departure_name.into(),
            arrival_id: arrival_id.into(),
            arrival_name: arrival_name.into(),
        }
    }
}

/// A labeled destination shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteDestination {
    /// Station identifier.
    pub id: StationId,
    /// Station name.
    pub name: StationName,
    /// Short label such as "Home" or "Work".
    pub label: FavoriteLabel,
}

impl FavoriteDestination {
    /// Create a favorite, truncating text fields to capacity.
    pub fn new(id: &str, name: &str, label: &str) -> Self {
        Self { id: id.into(), name: name.into(), label: label.into() }
    }
}

/// One leg of a journey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySection {
    /// Departure station name.
    pub departure_station: StationName,
    /// Arrival station name.
    pub arrival_station: StationName,
    /// Departure time in epoch seconds.
    pub departure_time: i64,
    /// Arrival time in epoch seconds.
    pub arrival_time: i64,
    /// Departure platform.
    pub platform: Platform,
    /// Train category and number.
    pub train_type: TrainType,
    /// Delay in minutes.
    pub delay_minutes: i32,
}

/// A journey made of up to [`MAX_SECTIONS`] ordered legs.
///
/// The overall times should bound the section times. This is not enforced:
/// the companion is trusted for consistency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Legs in travel order.
    pub sections: BoundedVec<JourneySection, MAX_SECTIONS>,
    /// Overall departure time in epoch seconds.
    pub departure_time: i64,
    /// Overall arrival time in epoch seconds.
    pub arrival_time: i64,
    /// Total delay in minutes.
    pub total_delay_minutes: i32,
    /// Number of changes between legs.
    pub num_changes: i32,
}

impl Connection {
    /// A connection consisting of exactly one leg.
    ///
    /// Overall times and delay are taken from the leg.
    pub fn single(section: JourneySection, num_changes: i32) -> Self {
        let departure_time = section.departure_time;
        let arrival_time = section.arrival_time;
        let total_delay_minutes = section.delay_minutes;

        Self {
            sections: BoundedVec::clamped([section]),
            departure_time,
            arrival_time,
            total_delay_minutes,
            num_changes,
        }
    }

    /// Number of legs.
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Travel time in seconds. Zero if arrival precedes departure.
    pub fn duration_secs(&self) -> i64 {
        (self.arrival_time - self.departure_time).max(0)
    }
}

/// The single active journey, persisted across restarts.
///
/// The default value is the explicit "nothing pinned" record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedConnection {
    /// Pinned journey.
    pub connection: Connection,
    /// Route the journey was found for.
    pub route: SavedConnection,
    /// When the journey was pinned, in epoch seconds.
    pub pinned_at: i64,
    /// Whether the slot holds a live pin.
    pub active: bool,
}

impl PinnedConnection {
    /// An active pin.
    pub fn new(connection: Connection, route: SavedConnection, pinned_at: i64) -> Self {
        Self { connection, route, pinned_at, active: true }
    }

    /// Whether the pin is active and its arrival time lies strictly before
    /// `now` (epoch seconds). Inactive records never expire.
    pub fn is_expired(&self, now: i64) -> bool {
        self.active && self.connection.arrival_time < now
    }
}
