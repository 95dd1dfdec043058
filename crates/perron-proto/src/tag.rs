//! Numeric tag space for message fields.
//!
//! Every field exchanged with the companion is keyed by a `u32` tag. The tag
//! values are part of the wire contract and must never be renumbered.

use std::fmt;

/// Field tag identifying the meaning of a value in a [`crate::FieldSet`].
///
/// Tags are grouped by purpose. Gaps between groups leave room for new
/// fields without renumbering existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Tag {
    // Station search
    /// Marker: watch asks the companion for stations near the user.
    RequestNearbyStations = 1,
    /// Station identifier (text).
    StationId = 2,
    /// Station display name (text).
    StationName = 3,
    /// Distance from the user to the station in meters (integer).
    StationDistance = 4,

    // Connection fetch
    /// Marker: watch asks the companion for connections between two stations.
    RequestConnections = 10,
    /// Departure station identifier (text).
    DepartureStationId = 11,
    /// Arrival station identifier (text).
    ArrivalStationId = 12,
    /// Marker: the message carries connection data.
    ConnectionData = 13,
    /// Departure time in epoch seconds (integer).
    DepartureTime = 14,
    /// Arrival time in epoch seconds (integer).
    ArrivalTime = 15,
    /// Departure platform (text).
    Platform = 16,
    /// Train category and number, e.g. "IC 712" (text).
    TrainType = 17,
    /// Delay in minutes (integer).
    DelayMinutes = 18,
    /// Number of changes (integer).
    NumChanges = 19,

    // Favorites sync
    /// Marker: request the favorites list from the peer.
    RequestFavorites = 30,
    /// Number of favorite items that follow (integer).
    NumFavorites = 31,
    /// Favorite station identifier (text).
    FavoriteId = 32,
    /// Favorite station name (text).
    FavoriteName = 33,
    /// Short favorite label, e.g. "Home" (text).
    FavoriteLabel = 34,

    // Errors
    /// Human readable error reported by the companion (text).
    ErrorMessage = 40,
}

impl Tag {
    /// Every tag, in ascending numeric order.
    pub const ALL: [Tag; 20] = [
        Tag::RequestNearbyStations,
        Tag::StationId,
        Tag::StationName,
        Tag::StationDistance,
        Tag::RequestConnections,
        Tag::DepartureStationId,
        Tag::ArrivalStationId,
        Tag::ConnectionData,
        Tag::DepartureTime,
        Tag::ArrivalTime,
        Tag::Platform,
        Tag::TrainType,
        Tag::DelayMinutes,
        Tag::NumChanges,
        Tag::RequestFavorites,
        Tag::NumFavorites,
        Tag::FavoriteId,
        Tag::FavoriteName,
        Tag::FavoriteLabel,
        Tag::ErrorMessage,
    ];

    /// Numeric wire value.
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Parse a numeric wire value. `None` for keys outside the tag space.
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.to_u32() == value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.to_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u32_inverts_to_u32() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_u32(tag.to_u32()), Some(tag));
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(Tag::from_u32(0), None);
        assert_eq!(Tag::from_u32(5), None);
        assert_eq!(Tag::from_u32(u32::MAX), None);
    }

    #[test]
    fn all_is_sorted_and_unique() {
        let values: Vec<u32> = Tag::ALL.iter().map(|t| t.to_u32()).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(values, sorted);
    }
}
