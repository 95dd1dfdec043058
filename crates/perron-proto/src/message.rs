//! Typed messages and the ordered dispatch table.
//!
//! Inbound field sets carry no explicit type discriminator. The message kind
//! is inferred from which tags are present, testing the rows of
//! [`DISPATCH_TABLE`] in order and taking the first match. A field set that
//! matches no row is not a protocol error: callers drop it silently.
//!
//! # Invariants
//!
//! - Priority: rows are tested top to bottom. A field set carrying both the
//!   favorites-request marker and a full station triple is always
//!   [`MessageKind::FavoritesRequested`].
//! - Totality: classification and parsing never fail on optional fields.
//!   Missing optional fields default to empty text or zero.

use crate::{FieldSet, Tag};

/// Kind of an inbound message, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Companion asks for the favorites list.
    FavoritesRequested,
    /// One nearby station.
    StationFound,
    /// Start of a favorites receive session.
    FavoritesCountAnnounced,
    /// One favorite in a receive session.
    FavoriteItemReceived,
    /// Connection data for the watched route.
    ConnectionDataReceived,
    /// Companion reported an error.
    ErrorReported,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRule {
    /// Kind produced when the row matches.
    pub kind: MessageKind,
    /// Tags that must all be present for the row to match.
    pub required: &'static [Tag],
}

/// Ordered dispatch table. Earlier rows win.
pub const DISPATCH_TABLE: [DispatchRule; 6] = [
    DispatchRule { kind: MessageKind::FavoritesRequested, required: &[Tag::RequestFavorites] },
    DispatchRule {
        kind: MessageKind::StationFound,
        required: &[Tag::StationName, Tag::StationId, Tag::StationDistance],
    },
    DispatchRule { kind: MessageKind::FavoritesCountAnnounced, required: &[Tag::NumFavorites] },
    DispatchRule {
        kind: MessageKind::FavoriteItemReceived,
        required: &[Tag::FavoriteId, Tag::FavoriteName, Tag::FavoriteLabel],
    },
    DispatchRule {
        kind: MessageKind::ConnectionDataReceived,
        required: &[Tag::ConnectionData, Tag::DepartureTime, Tag::ArrivalTime],
    },
    DispatchRule { kind: MessageKind::ErrorReported, required: &[Tag::ErrorMessage] },
];

/// Classify a field set. `None` if no row of [`DISPATCH_TABLE`] matches.
pub fn classify(fields: &FieldSet) -> Option<MessageKind> {
    DISPATCH_TABLE.iter().find(|rule| fields.contains_all(rule.required)).map(|rule| rule.kind)
}

/// Connection data as carried on the wire.
///
/// The wire shape describes a single leg only; multi-leg journeys are not
/// representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionData {
    /// Departure time in epoch seconds.
    pub departure_time: i64,
    /// Arrival time in epoch seconds.
    pub arrival_time: i64,
    /// Departure platform. Empty if not sent.
    pub platform: String,
    /// Train category and number. Empty if not sent.
    pub train_type: String,
    /// Delay in minutes. Zero if not sent.
    pub delay_minutes: i32,
    /// Number of changes. Zero if not sent.
    pub num_changes: i32,
}

/// Parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Companion asks for the favorites list.
    FavoritesRequested,
    /// One nearby station.
    Station {
        /// Station identifier.
        id: String,
        /// Station name.
        name: String,
        /// Distance in meters (advisory).
        distance_meters: i32,
    },
    /// Start of a favorites receive session.
    FavoritesCount {
        /// Announced number of items. Negative wire values read as zero.
        count: u32,
    },
    /// One favorite destination.
    FavoriteItem {
        /// Station identifier.
        id: String,
        /// Station name.
        name: String,
        /// Short label.
        label: String,
    },
    /// Connection data.
    Connection(ConnectionData),
    /// Error reported by the companion.
    Error {
        /// Error text.
        message: String,
    },
}

impl InboundMessage {
    /// Classify and parse a field set. `None` if it matches no known shape.
    pub fn parse(fields: &FieldSet) -> Option<Self> {
        let message = match classify(fields)? {
            MessageKind::FavoritesRequested => Self::FavoritesRequested,
            MessageKind::StationFound => Self::Station {
                id: fields.text(Tag::StationId),
                name: fields.text(Tag::StationName),
                distance_meters: fields.int(Tag::StationDistance),
            },
            MessageKind::FavoritesCountAnnounced => {
                Self::FavoritesCount { count: u32::try_from(fields.int(Tag::NumFavorites)).unwrap_or(0) }
            },
            MessageKind::FavoriteItemReceived => Self::FavoriteItem {
                id: fields.text(Tag::FavoriteId),
                name: fields.text(Tag::FavoriteName),
                label: fields.text(Tag::FavoriteLabel),
            },
            MessageKind::ConnectionDataReceived => Self::Connection(ConnectionData {
                departure_time: i64::from(fields.int(Tag::DepartureTime)),
                arrival_time: i64::from(fields.int(Tag::ArrivalTime)),
                platform: fields.text(Tag::Platform),
                train_type: fields.text(Tag::TrainType),
                delay_minutes: fields.int(Tag::DelayMinutes),
                num_changes: fields.int(Tag::NumChanges),
            }),
            MessageKind::ErrorReported => Self::Error { message: fields.text(Tag::ErrorMessage) },
        };

        Some(message)
    }

    /// Dispatch kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::FavoritesRequested => MessageKind::FavoritesRequested,
            Self::Station { .. } => MessageKind::StationFound,
            Self::FavoritesCount { .. } => MessageKind::FavoritesCountAnnounced,
            Self::FavoriteItem { .. } => MessageKind::FavoriteItemReceived,
            Self::Connection(_) => MessageKind::ConnectionDataReceived,
            Self::Error { .. } => MessageKind::ErrorReported,
        }
    }

    /// Field set the companion would send for this message.
    pub fn to_field_set(&self) -> FieldSet {
        match self {
            Self::FavoritesRequested => FieldSet::new().with(Tag::RequestFavorites, 1u8),
            Self::Station { id, name, distance_meters } => FieldSet::new()
                .with(Tag::StationId, id.as_str())
                .with(Tag::StationName, name.as_str())
                .with(Tag::StationDistance, *distance_meters),
            Self::FavoritesCount { count } => FieldSet::new().with(Tag::NumFavorites, *count),
            Self::FavoriteItem { id, name, label } => FieldSet::new()
                .with(Tag::FavoriteId, id.as_str())
                .with(Tag::FavoriteName, name.as_str())
                .with(Tag::FavoriteLabel, label.as_str()),
            Self::Connection(data) => FieldSet::new()
                .with(Tag::ConnectionData, 1u8)
                .with(Tag::DepartureTime, saturate(data.departure_time))
                .with(Tag::ArrivalTime, saturate(data.arrival_time))
                .with(Tag::Platform, data.platform.as_str())
                .with(Tag::TrainType, data.train_type.as_str())
                .with(Tag::DelayMinutes, data.delay_minutes)
                .with(Tag::NumChanges, data.num_changes),
            Self::Error { message } => FieldSet::new().with(Tag::ErrorMessage, message.as_str()),
        }
    }
}

/// Outbound message built by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Ask for stations near the user.
    RequestNearbyStations,
    /// Ask for connections between two stations.
    RequestConnections {
        /// Departure station identifier.
        departure_id: String,
        /// Arrival station identifier.
        arrival_id: String,
    },
    /// Ask the companion for its favorites list.
    RequestFavorites,
    /// Announce the number of favorite items that follow.
    FavoritesCount {
        /// Number of items.
        count: u32,
    },
    /// One favorite destination.
    FavoriteItem {
        /// Station identifier.
        id: String,
        /// Station name.
        name: String,
        /// Short label.
        label: String,
    },
}

impl OutboundMessage {
    /// Build the wire field set.
    pub fn to_field_set(&self) -> FieldSet {
        match self {
            Self::RequestNearbyStations => FieldSet::new().with(Tag::RequestNearbyStations, 1u8),
            Self::RequestConnections { departure_id, arrival_id } => FieldSet::new()
                .with(Tag::RequestConnections, 1u8)
                .with(Tag::DepartureStationId, departure_id.as_str())
                .with(Tag::ArrivalStationId, arrival_id.as_str()),
            Self::RequestFavorites => FieldSet::new().with(Tag::RequestFavorites, 1u8),
            Self::FavoritesCount { count } => FieldSet::new().with(Tag::NumFavorites, *count),
            Self::FavoriteItem { id, name, label } => FieldSet::new()
                .with(Tag::FavoriteId, id.as_str())
                .with(Tag::FavoriteName, name.as_str())
                .with(Tag::FavoriteLabel, label.as_str()),
        }
    }

    /// Parse a field set as the companion sees it. `None` for unknown shapes.
    pub fn parse(fields: &FieldSet) -> Option<Self> {
        if fields.contains(Tag::RequestFavorites) {
            return Some(Self::RequestFavorites);
        }
        if fields.contains(Tag::RequestNearbyStations) {
            return Some(Self::RequestNearbyStations);
        }
        if fields.contains(Tag::RequestConnections) {
            return Some(Self::RequestConnections {
                departure_id: fields.text(Tag::DepartureStationId),
                arrival_id: fields.text(Tag::ArrivalStationId),
            });
        }
        if fields.contains(Tag::NumFavorites) {
            return Some(Self::FavoritesCount {
                count: u32::try_from(fields.int(Tag::NumFavorites)).unwrap_or(0),
            });
        }
        if fields.contains_all(&[Tag::FavoriteId, Tag::FavoriteName, Tag::FavoriteLabel]) {
            return Some(Self::FavoriteItem {
                id: fields.text(Tag::FavoriteId),
                name: fields.text(Tag::FavoriteName),
                label: fields.text(Tag::FavoriteLabel),
            });
        }
        None
    }
}

/// Clamp epoch seconds into the 32-bit wire range.
fn saturate(secs: i64) -> i32 {
    i32::try_from(secs).unwrap_or(if secs < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_triple() -> FieldSet {
        FieldSet::new()
            .with(Tag::StationName, "Zuerich HB")
            .with(Tag::StationId, "8503000")
            .with(Tag::StationDistance, 100i32)
    }

    #[test]
    fn favorites_request_wins_over_station() {
        let fields = station_triple().with(Tag::RequestFavorites, 1u8);
        assert_eq!(classify(&fields), Some(MessageKind::FavoritesRequested));
    }

    #[test]
    fn station_requires_full_triple() {
        let fields = FieldSet::new()
            .with(Tag::StationName, "Bern")
            .with(Tag::StationId, "8507000");
        assert_eq!(classify(&fields), None);

        assert_eq!(classify(&station_triple()), Some(MessageKind::StationFound));
    }

    #[test]
    fn connection_requires_marker_and_both_times() {
        let without_arrival = FieldSet::new()
            .with(Tag::ConnectionData, 1u8)
            .with(Tag::DepartureTime, 1_700_000_000i32);
        assert_eq!(classify(&without_arrival), None);

        let without_marker = FieldSet::new()
            .with(Tag::DepartureTime, 1_700_000_000i32)
            .with(Tag::ArrivalTime, 1_700_003_600i32);
        assert_eq!(classify(&without_marker), None);
    }

    #[test]
    fn train_type_alone_matches_nothing() {
        let fields = FieldSet::new().with(Tag::TrainType, "IC 712");
        assert_eq!(InboundMessage::parse(&fields), None);
    }

    #[test]
    fn connection_optional_fields_default() {
        let fields = FieldSet::new()
            .with(Tag::ConnectionData, 1u8)
            .with(Tag::DepartureTime, 1_700_000_000i32)
            .with(Tag::ArrivalTime, 1_700_003_600i32);

        let Some(InboundMessage::Connection(data)) = InboundMessage::parse(&fields) else {
            panic!("expected connection data");
        };

        assert_eq!(data.departure_time, 1_700_000_000);
        assert_eq!(data.arrival_time, 1_700_003_600);
        assert!(data.platform.is_empty());
        assert!(data.train_type.is_empty());
        assert_eq!(data.delay_minutes, 0);
        assert_eq!(data.num_changes, 0);
    }

    #[test]
    fn negative_count_reads_as_zero() {
        let fields = FieldSet::new().with(Tag::NumFavorites, -4i32);
        assert_eq!(InboundMessage::parse(&fields), Some(InboundMessage::FavoritesCount { count: 0 }));
    }

    #[test]
    fn mistyped_required_fields_are_coerced() {
        let fields = FieldSet::new()
            .with(Tag::StationName, "Bern")
            .with(Tag::StationId, 8_507_000u32)
            .with(Tag::StationDistance, "250");

        assert_eq!(
            InboundMessage::parse(&fields),
            Some(InboundMessage::Station {
                id: "8507000".into(),
                name: "Bern".into(),
                distance_meters: 250,
            })
        );
    }

    #[test]
    fn parse_kind_matches_classify() {
        let messages = [
            InboundMessage::FavoritesRequested,
            InboundMessage::FavoritesCount { count: 2 },
            InboundMessage::FavoriteItem { id: "1".into(), name: "Home".into(), label: "H".into() },
            InboundMessage::Error { message: "No connections found".into() },
        ];

        for message in messages {
            let fields = message.to_field_set();
            assert_eq!(classify(&fields), Some(message.kind()));
            assert_eq!(InboundMessage::parse(&fields), Some(message));
        }
    }

    #[test]
    fn request_connections_field_set() {
        let message = OutboundMessage::RequestConnections {
            departure_id: "8503000".into(),
            arrival_id: "8507000".into(),
        };
        let fields = message.to_field_set();

        assert!(fields.contains(Tag::RequestConnections));
        assert_eq!(fields.text(Tag::DepartureStationId), "8503000");
        assert_eq!(fields.text(Tag::ArrivalStationId), "8507000");
        assert_eq!(OutboundMessage::parse(&fields), Some(message));
    }
}
