//! Fuzz target for the client state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of inbound messages, send completions, timer
//!   expiries (owned and stale) and user intents
//! - Inbound messages drawn from every dispatch kind plus junk field sets
//!
//! # Invariants
//!
//! - NEVER panic
//! - At most one `Send` per step while nothing is in flight, none otherwise
//! - The outbound queue never exceeds its capacity
//! - Store loads always fit their bounded lists

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use perron_client::{ChannelError, Client, ClientAction, ClientConfig, ClientEvent, TimerId};
use perron_core::{MemoryStorage, SavedConnection};
use perron_proto::{ConnectionData, FieldSet, InboundMessage, Tag};

#[derive(Debug, Arbitrary)]
enum Op {
    Station { id: String, name: String, distance: i32 },
    FavoritesCount(i32),
    FavoriteItem { id: String, name: String, label: String },
    Connection { departure: i32, arrival: i32, delay: i32 },
    CompanionError(String),
    RequestFromCompanion,
    Junk(u8, String),
    Sent,
    Failed,
    Timer(u8),
    Search,
    Watch,
    Stop,
    RequestFavorites,
    Teardown,
}

fn event(op: Op) -> ClientEvent {
    let inbound = |message: InboundMessage| ClientEvent::Inbound(message.to_field_set());
    match op {
        Op::Station { id, name, distance } => {
            inbound(InboundMessage::Station { id, name, distance_meters: distance })
        },
        Op::FavoritesCount(count) => {
            ClientEvent::Inbound(FieldSet::new().with(Tag::NumFavorites, count))
        },
        Op::FavoriteItem { id, name, label } => inbound(InboundMessage::FavoriteItem { id, name, label }),
        Op::Connection { departure, arrival, delay } => inbound(InboundMessage::Connection(ConnectionData {
            departure_time: i64::from(departure),
            arrival_time: i64::from(arrival),
            platform: "7".into(),
            train_type: "IC 712".into(),
            delay_minutes: delay,
            num_changes: 0,
        })),
        Op::CompanionError(message) => inbound(InboundMessage::Error { message }),
        Op::RequestFromCompanion => inbound(InboundMessage::FavoritesRequested),
        Op::Junk(key, text) => {
            let mut fields = FieldSet::new();
            fields.insert_raw(u32::from(key), text);
            ClientEvent::Inbound(fields)
        },
        Op::Sent => ClientEvent::OutboundSent,
        Op::Failed => ClientEvent::OutboundFailed(ChannelError::NotConnected),
        Op::Timer(id) => ClientEvent::TimerFired(TimerId(u64::from(id))),
        Op::Search => ClientEvent::SearchNearbyStations,
        Op::Watch => ClientEvent::WatchConnections {
            route: SavedConnection::new("8503000", "Zuerich HB", "8507000", "Bern"),
        },
        Op::Stop => ClientEvent::StopWatching,
        Op::RequestFavorites => ClientEvent::RequestFavorites,
        Op::Teardown => ClientEvent::Teardown,
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let config = ClientConfig { pacing_delay: Duration::from_millis(50), outbound_queue_capacity: 4, ..ClientConfig::default() };
    let mut client = Client::new(config, MemoryStorage::new());

    for op in ops {
        let was_sending = client.is_sending();
        let is_completion = matches!(op, Op::Sent | Op::Failed);
        let Ok(actions) = client.handle(event(op)) else {
            continue;
        };

        let sends = actions.iter().filter(|a| matches!(a, ClientAction::Send(_))).count();
        assert!(sends <= 1);
        if was_sending && !is_completion {
            assert_eq!(sends, 0);
        }
        assert!(client.queued_sends() <= 4);

        let store = client.store();
        assert!(store.load_favorite_destinations().is_ok());
        assert!(store.load_connections().is_ok());
    }
});
