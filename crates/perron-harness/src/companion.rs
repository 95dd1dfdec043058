//! Scripted phone-side companion.
//!
//! Answers the client's requests with canned data: a fixed set of stations
//! around Zurich, one connection per route, and its own favorites list. It
//! also records the favorites the client pushes to it.

use perron_core::FavoriteDestination;
use perron_proto::{ConnectionData, FieldSet, InboundMessage, OutboundMessage};
use tracing::debug;

/// Departure offset of canned connections from the current wall clock.
const DEPARTURE_OFFSET_SECS: i64 = 300;
/// Arrival offset of canned connections from the current wall clock.
const ARRIVAL_OFFSET_SECS: i64 = 4500;

/// Canned companion behavior.
#[derive(Debug, Clone)]
pub struct MockCompanion {
    stations: Vec<(String, String, i32)>,
    favorites: Vec<FavoriteDestination>,
    connection_error: Option<String>,
    announced: Option<u32>,
    received: Vec<FavoriteDestination>,
}

impl Default for MockCompanion {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompanion {
    /// Companion with four stations and no favorites.
    pub fn new() -> Self {
        let stations = [
            ("8503000", "Zuerich HB", 100),
            ("8503003", "Zuerich Stadelhofen", 450),
            ("8503006", "Zuerich Hardbruecke", 1200),
            ("8507000", "Bern", 2500),
        ];
        Self {
            stations: stations
                .into_iter()
                .map(|(id, name, distance)| (id.to_string(), name.to_string(), distance))
                .collect(),
            favorites: Vec::new(),
            connection_error: None,
            announced: None,
            received: Vec::new(),
        }
    }

    /// Replace the companion's own favorites list.
    #[must_use]
    pub fn with_favorites(mut self, favorites: Vec<FavoriteDestination>) -> Self {
        self.favorites = favorites;
        self
    }

    /// Answer every connections request with this error instead of data.
    #[must_use]
    pub fn with_connection_error(mut self, message: &str) -> Self {
        self.connection_error = Some(message.to_string());
        self
    }

    /// The message asking the client for its favorites.
    pub fn request_favorites(&self) -> FieldSet {
        InboundMessage::FavoritesRequested.to_field_set()
    }

    /// Count announced by the client's last favorites transfer.
    pub fn announced(&self) -> Option<u32> {
        self.announced
    }

    /// Favorites received from the client since the last announcement.
    pub fn received(&self) -> &[FavoriteDestination] {
        &self.received
    }

    /// Replies to one message from the client, in send order.
    ///
    /// `now_secs` is the wall clock used to stamp canned connections.
    pub fn respond(&mut self, message: &OutboundMessage, now_secs: i64) -> Vec<FieldSet> {
        let replies: Vec<InboundMessage> = match message {
            OutboundMessage::RequestNearbyStations => self
                .stations
                .iter()
                .map(|(id, name, distance)| InboundMessage::Station {
                    id: id.clone(),
                    name: name.clone(),
                    distance_meters: *distance,
                })
                .collect(),
            OutboundMessage::RequestConnections { departure_id, arrival_id } => {
                vec![self.connection_reply(departure_id, arrival_id, now_secs)]
            },
            OutboundMessage::RequestFavorites => {
                let count = InboundMessage::FavoritesCount { count: self.favorites.len() as u32 };
                std::iter::once(count)
                    .chain(self.favorites.iter().map(|f| InboundMessage::FavoriteItem {
                        id: f.id.to_string(),
                        name: f.name.to_string(),
                        label: f.label.to_string(),
                    }))
                    .collect()
            },
            OutboundMessage::FavoritesCount { count } => {
                self.announced = Some(*count);
                self.received.clear();
                Vec::new()
            },
            OutboundMessage::FavoriteItem { id, name, label } => {
                self.received.push(FavoriteDestination::new(id, name, label));
                Vec::new()
            },
        };

        debug!(?message, replies = replies.len(), "companion responding");
        replies.iter().map(InboundMessage::to_field_set).collect()
    }

    fn connection_reply(&self, departure_id: &str, arrival_id: &str, now_secs: i64) -> InboundMessage {
        if departure_id.is_empty() || arrival_id.is_empty() {
            return InboundMessage::Error { message: "Invalid station IDs".to_string() };
        }
        if let Some(message) = &self.connection_error {
            return InboundMessage::Error { message: message.clone() };
        }

        InboundMessage::Connection(ConnectionData {
            departure_time: now_secs + DEPARTURE_OFFSET_SECS,
            arrival_time: now_secs + ARRIVAL_OFFSET_SECS,
            platform: "7".to_string(),
            train_type: "IC 712".to_string(),
            delay_minutes: 3,
            num_changes: 0,
        })
    }
}
