//! Client state machine tests, driving `Client::handle` directly.

use std::time::Duration;

use perron_client::{
    ChannelError, Client, ClientAction, ClientConfig, ClientEvent, ConnectionView, DomainEvent,
    TimerId, TransferPhase,
};
use perron_core::{
    Connection, FavoriteDestination, JourneySection, MAX_SAVED_CONNECTIONS, MemoryStorage,
    SavedConnection,
};
use perron_proto::{FieldSet, InboundMessage, OutboundMessage, Tag};

fn client() -> Client<MemoryStorage> {
    Client::new(ClientConfig::default(), MemoryStorage::new())
}

fn zurich_bern() -> SavedConnection {
    SavedConnection::new("8503000", "Zuerich HB", "8507000", "Bern")
}

fn sends(actions: &[ClientAction]) -> Vec<&OutboundMessage> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Send(message) => Some(message),
            _ => None,
        })
        .collect()
}

fn scheduled(actions: &[ClientAction]) -> Vec<(TimerId, Duration)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::ScheduleTimer { id, delay } => Some((*id, *delay)),
            _ => None,
        })
        .collect()
}

fn delivered(actions: &[ClientAction]) -> Vec<&DomainEvent> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Deliver(event) => Some(event),
            _ => None,
        })
        .collect()
}

#[test]
fn search_clears_stations_and_sends_request() {
    let mut client = client();

    let station = InboundMessage::Station {
        id: "8503000".into(),
        name: "Zuerich HB".into(),
        distance_meters: 120,
    };
    let actions = client.handle(ClientEvent::Inbound(station.to_field_set())).unwrap();
    assert!(matches!(delivered(&actions)[..], [DomainEvent::StationFound { total: 1, .. }]));
    assert_eq!(client.nearby_stations().len(), 1);

    let actions = client.handle(ClientEvent::SearchNearbyStations).unwrap();
    assert_eq!(sends(&actions), [&OutboundMessage::RequestNearbyStations]);
    assert!(client.nearby_stations().is_empty());
}

#[test]
fn watch_loads_then_refreshes() {
    let mut client = client();

    let actions = client.handle(ClientEvent::WatchConnections { route: zurich_bern() }).unwrap();
    assert_eq!(
        sends(&actions),
        [&OutboundMessage::RequestConnections {
            departure_id: "8503000".into(),
            arrival_id: "8507000".into(),
        }]
    );
    let timers = scheduled(&actions);
    let [(refresh, delay)] = timers[..] else {
        panic!("expected one refresh timer");
    };
    assert_eq!(delay, Duration::from_secs(60));
    assert!(client.connection_view().is_loading());

    client.handle(ClientEvent::OutboundSent).unwrap();

    let data = FieldSet::new()
        .with(Tag::ConnectionData, 1u8)
        .with(Tag::DepartureTime, 1_700_000_000i32)
        .with(Tag::ArrivalTime, 1_700_003_360i32)
        .with(Tag::Platform, "32")
        .with(Tag::TrainType, "IC 1")
        .with(Tag::DelayMinutes, 2i32);
    let actions = client.handle(ClientEvent::Inbound(data)).unwrap();

    let events = delivered(&actions);
    let [DomainEvent::ConnectionReceived { route: Some(route), connection }] = &events[..] else {
        panic!("expected connection event");
    };
    assert_eq!(*route, zurich_bern());
    assert_eq!(connection.num_sections(), 1);
    assert_eq!(connection.sections[0].departure_station, "Zuerich HB");
    assert_eq!(connection.sections[0].platform, "32");
    assert_eq!(connection.total_delay_minutes, 2);
    assert_eq!(client.connection_view().connections().len(), 1);

    let actions = client.handle(ClientEvent::TimerFired(refresh)).unwrap();
    assert_eq!(sends(&actions).len(), 1);
    assert_eq!(scheduled(&actions).len(), 1);

    let actions = client.handle(ClientEvent::StopWatching).unwrap();
    assert!(matches!(actions[..], [ClientAction::CancelTimer(_)]));
    assert_eq!(*client.connection_view(), ConnectionView::Idle);
}

#[test]
fn connection_data_without_watch_leaves_view_idle() {
    let mut client = client();
    let data = FieldSet::new()
        .with(Tag::ConnectionData, 1u8)
        .with(Tag::DepartureTime, 100i32)
        .with(Tag::ArrivalTime, 200i32);

    let actions = client.handle(ClientEvent::Inbound(data)).unwrap();
    assert!(matches!(delivered(&actions)[..], [DomainEvent::ConnectionReceived { route: None, .. }]));
    assert_eq!(*client.connection_view(), ConnectionView::Idle);
}

#[test]
fn only_one_send_in_flight() {
    let mut client = client();

    let first = client.handle(ClientEvent::SearchNearbyStations).unwrap();
    assert_eq!(sends(&first).len(), 1);

    let second = client.handle(ClientEvent::RequestFavorites).unwrap();
    assert!(sends(&second).is_empty());
    assert_eq!(client.queued_sends(), 1);

    let after_sent = client.handle(ClientEvent::OutboundSent).unwrap();
    assert_eq!(sends(&after_sent), [&OutboundMessage::RequestFavorites]);
    assert_eq!(client.queued_sends(), 0);
    assert!(client.is_sending());
}

#[test]
fn full_queue_drops_sends() {
    let config = ClientConfig { outbound_queue_capacity: 1, ..ClientConfig::default() };
    let mut client = Client::new(config, MemoryStorage::new());

    client.handle(ClientEvent::SearchNearbyStations).unwrap();
    client.handle(ClientEvent::RequestFavorites).unwrap();
    client.handle(ClientEvent::RequestFavorites).unwrap();
    assert_eq!(client.queued_sends(), 1);
}

#[test]
fn favorites_request_starts_paced_transfer() {
    let mut client = client();
    client
        .store()
        .save_favorite_destinations(&[
            FavoriteDestination::new("1", "Home", "H"),
            FavoriteDestination::new("2", "Work", "W"),
        ])
        .unwrap();

    let request = FieldSet::new().with(Tag::RequestFavorites, 1u8);
    let actions = client.handle(ClientEvent::Inbound(request.clone())).unwrap();
    assert_eq!(sends(&actions), [&OutboundMessage::FavoritesCount { count: 2 }]);
    assert!(matches!(
        delivered(&actions)[..],
        [DomainEvent::FavoritesTransferStarted { count: 2 }]
    ));

    // A second request while active is ignored.
    assert!(client.handle(ClientEvent::Inbound(request)).unwrap().is_empty());

    let actions = client.handle(ClientEvent::OutboundSent).unwrap();
    let timers = scheduled(&actions);
    let [(pacing, delay)] = timers[..] else {
        panic!("expected pacing timer");
    };
    assert_eq!(delay, Duration::from_millis(50));

    let actions = client.handle(ClientEvent::TimerFired(pacing)).unwrap();
    assert_eq!(
        sends(&actions),
        [&OutboundMessage::FavoriteItem { id: "1".into(), name: "Home".into(), label: "H".into() }]
    );
    assert_eq!(client.transfer().phase(), TransferPhase::SendingItem(0));

    let actions = client.handle(ClientEvent::OutboundFailed(ChannelError::NotConnected)).unwrap();
    assert!(matches!(
        delivered(&actions)[..],
        [DomainEvent::FavoritesTransferFailed { phase: TransferPhase::SendingItem(0) }]
    ));
    assert!(!client.transfer().is_active());
}

#[test]
fn stale_timer_is_ignored() {
    let mut client = client();
    assert!(client.handle(ClientEvent::TimerFired(TimerId(42))).unwrap().is_empty());
}

#[test]
fn malformed_inbound_is_dropped_without_store_writes() {
    let storage = MemoryStorage::new();
    let mut client = Client::new(ClientConfig::default(), storage.clone());

    let fields = FieldSet::new().with(Tag::TrainType, "IC 712");
    assert!(client.handle(ClientEvent::Inbound(fields)).unwrap().is_empty());
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn companion_error_is_delivered() {
    let mut client = client();
    let fields = FieldSet::new().with(Tag::ErrorMessage, "No connections found");

    let actions = client.handle(ClientEvent::Inbound(fields)).unwrap();
    assert_eq!(
        delivered(&actions),
        [&DomainEvent::CompanionError { message: "No connections found".into() }]
    );
}

#[test]
fn received_favorites_are_stored() {
    let mut client = client();

    client
        .handle(ClientEvent::Inbound(InboundMessage::FavoritesCount { count: 1 }.to_field_set()))
        .unwrap();
    let item = InboundMessage::FavoriteItem { id: "8507000".into(), name: "Bern".into(), label: "Work".into() };
    let actions = client.handle(ClientEvent::Inbound(item.to_field_set())).unwrap();

    assert!(matches!(
        delivered(&actions)[..],
        [DomainEvent::FavoriteReceived { stored: 1, .. }, DomainEvent::FavoritesReceiveComplete { count: 1 }]
    ));
    assert_eq!(client.store().load_favorite_destinations().unwrap()[0].label, "Work");
}

#[test]
fn add_route_respects_limit() {
    let client = client();
    for n in 0..MAX_SAVED_CONNECTIONS {
        let route = SavedConnection::new(&n.to_string(), "From", "8507000", "Bern");
        assert!(client.add_route(route).unwrap());
    }

    assert!(!client.add_route(zurich_bern()).unwrap());
    assert_eq!(client.store().load_connections().unwrap().len(), MAX_SAVED_CONNECTIONS);

    let removed = client.remove_route(0).unwrap().unwrap();
    assert_eq!(removed.departure_id, "0");
    assert!(client.remove_route(MAX_SAVED_CONNECTIONS).unwrap().is_none());
}

#[test]
fn restore_pinned_clears_expired() {
    let client = client();
    let section = JourneySection {
        departure_station: "Zuerich HB".into(),
        arrival_station: "Bern".into(),
        departure_time: 1_000,
        arrival_time: 4_000,
        ..JourneySection::default()
    };

    client.pin(Connection::single(section, 0), zurich_bern(), 900).unwrap();
    assert!(client.restore_pinned(4_000).unwrap().active);
    assert!(!client.restore_pinned(4_001).unwrap().active);
    assert!(!client.restore_pinned(0).unwrap().active);
}

#[test]
fn teardown_cancels_timers_and_aborts_transfer() {
    let mut client = client();
    client.store().save_favorite_destinations(&[FavoriteDestination::new("1", "Home", "H")]).unwrap();

    client.handle(ClientEvent::WatchConnections { route: zurich_bern() }).unwrap();
    client.handle(ClientEvent::Inbound(FieldSet::new().with(Tag::RequestFavorites, 1u8))).unwrap();
    client.handle(ClientEvent::OutboundSent).unwrap();
    client.handle(ClientEvent::OutboundSent).unwrap();

    let actions = client.handle(ClientEvent::Teardown).unwrap();
    let cancelled = actions.iter().filter(|a| matches!(a, ClientAction::CancelTimer(_))).count();
    assert_eq!(cancelled, 2);
    assert!(!client.transfer().is_active());
    assert_eq!(client.queued_sends(), 0);
}

#[test]
fn confirmation_after_teardown_is_not_credited_to_next_transfer() {
    let mut client = client();
    client
        .store()
        .save_favorite_destinations(&[
            FavoriteDestination::new("1", "Home", "H"),
            FavoriteDestination::new("2", "Work", "W"),
        ])
        .unwrap();
    let request = FieldSet::new().with(Tag::RequestFavorites, 1u8);

    client.handle(ClientEvent::Inbound(request.clone())).unwrap();
    let actions = client.handle(ClientEvent::OutboundSent).unwrap();
    let timers = scheduled(&actions);
    let [(pacing, _)] = timers[..] else {
        panic!("expected pacing timer");
    };
    client.handle(ClientEvent::TimerFired(pacing)).unwrap();
    client.handle(ClientEvent::Teardown).unwrap();
    assert!(client.is_sending());

    // The second transfer's count waits for the host to finish the first item.
    let actions = client.handle(ClientEvent::Inbound(request)).unwrap();
    assert!(sends(&actions).is_empty());
    assert_eq!(client.queued_sends(), 1);

    let actions = client.handle(ClientEvent::OutboundSent).unwrap();
    assert!(scheduled(&actions).is_empty());
    assert_eq!(sends(&actions), [&OutboundMessage::FavoritesCount { count: 2 }]);
    assert_eq!(client.transfer().phase(), TransferPhase::SendingCount);

    let actions = client.handle(ClientEvent::OutboundSent).unwrap();
    assert_eq!(scheduled(&actions).len(), 1);
}

#[test]
fn failure_after_teardown_does_not_fail_next_transfer() {
    let mut client = client();
    client.store().save_favorite_destinations(&[FavoriteDestination::new("1", "Home", "H")]).unwrap();
    let request = FieldSet::new().with(Tag::RequestFavorites, 1u8);

    client.handle(ClientEvent::Inbound(request.clone())).unwrap();
    client.handle(ClientEvent::Teardown).unwrap();
    client.handle(ClientEvent::Inbound(request)).unwrap();

    let actions = client.handle(ClientEvent::OutboundFailed(ChannelError::NotConnected)).unwrap();
    assert!(delivered(&actions).is_empty());
    assert_eq!(sends(&actions), [&OutboundMessage::FavoritesCount { count: 1 }]);
    assert!(client.transfer().is_active());
}

#[test]
fn transfer_sends_snapshot_taken_at_start() {
    let mut client = client();
    client
        .store()
        .save_favorite_destinations(&[
            FavoriteDestination::new("1", "Home", "H"),
            FavoriteDestination::new("2", "Work", "W"),
        ])
        .unwrap();

    client.handle(ClientEvent::Inbound(FieldSet::new().with(Tag::RequestFavorites, 1u8))).unwrap();

    // The companion pushes a different list while the transfer runs.
    client
        .handle(ClientEvent::Inbound(InboundMessage::FavoritesCount { count: 1 }.to_field_set()))
        .unwrap();
    let item = InboundMessage::FavoriteItem { id: "9".into(), name: "Gym".into(), label: "G".into() };
    client.handle(ClientEvent::Inbound(item.to_field_set())).unwrap();
    assert_eq!(client.store().load_favorite_destinations().unwrap().len(), 1);

    let mut items = Vec::new();
    let mut next = ClientEvent::OutboundSent;
    loop {
        let actions = client.handle(next).unwrap();
        items.extend(sends(&actions).into_iter().cloned());
        if let Some(&(id, _)) = scheduled(&actions).first() {
            next = ClientEvent::TimerFired(id);
        } else if !sends(&actions).is_empty() {
            next = ClientEvent::OutboundSent;
        } else {
            break;
        }
    }

    assert_eq!(
        items,
        [
            OutboundMessage::FavoriteItem { id: "1".into(), name: "Home".into(), label: "H".into() },
            OutboundMessage::FavoriteItem { id: "2".into(), name: "Work".into(), label: "W".into() },
        ]
    );
    assert!(!client.transfer().is_active());
}
