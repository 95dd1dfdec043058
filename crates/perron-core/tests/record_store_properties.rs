//! Property tests for record persistence.

use perron_core::{
    FavoriteDestination, MAX_FAVORITE_DESTINATIONS, MAX_FAVORITE_STATIONS, MAX_SAVED_CONNECTIONS,
    MemoryStorage, RecordStore, RedbStorage, SavedConnection, Station,
};
use proptest::prelude::*;
use tempfile::tempdir;

fn arbitrary_route() -> impl Strategy<Value = SavedConnection> {
    ("[0-9]{7}", "[A-Za-z ]{1,40}", "[0-9]{7}", "[A-Za-z ]{1,40}").prop_map(
        |(dep_id, dep_name, arr_id, arr_name)| {
            SavedConnection::new(&dep_id, &dep_name, &arr_id, &arr_name)
        },
    )
}

fn arbitrary_station() -> impl Strategy<Value = Station> {
    ("[0-9]{7}", "\\PC{1,40}", any::<i32>())
        .prop_map(|(id, name, distance)| Station::new(&id, &name, distance))
}

fn arbitrary_favorite() -> impl Strategy<Value = FavoriteDestination> {
    ("[0-9]{7}", "[A-Za-z ]{1,40}", "[A-Za-z]{1,20}")
        .prop_map(|(id, name, label)| FavoriteDestination::new(&id, &name, &label))
}

proptest! {
    #[test]
    fn prop_connections_round_trip(routes in prop::collection::vec(arbitrary_route(), 0..=MAX_SAVED_CONNECTIONS)) {
        let store = RecordStore::new(MemoryStorage::new());

        prop_assert_eq!(store.save_connections(&routes).unwrap(), routes.len());
        let loaded = store.load_connections().unwrap();
        prop_assert_eq!(loaded.as_slice(), routes.as_slice());
    }

    #[test]
    fn prop_connections_clamp(routes in prop::collection::vec(arbitrary_route(), 0..MAX_SAVED_CONNECTIONS * 2)) {
        let store = RecordStore::new(MemoryStorage::new());
        let stored = store.save_connections(&routes).unwrap();

        prop_assert_eq!(stored, routes.len().min(MAX_SAVED_CONNECTIONS));
        let loaded = store.load_connections().unwrap();
        prop_assert_eq!(loaded.as_slice(), &routes[..stored]);
        prop_assert_eq!(store.is_connection_limit_reached().unwrap(), stored == MAX_SAVED_CONNECTIONS);
    }

    #[test]
    fn prop_favorite_stations_round_trip(stations in prop::collection::vec(arbitrary_station(), 0..=MAX_FAVORITE_STATIONS)) {
        let store = RecordStore::new(MemoryStorage::new());
        store.save_favorite_stations(&stations).unwrap();

        let mut out = vec![Station::default(); MAX_FAVORITE_STATIONS];
        let count = store.load_favorite_stations_into(&mut out).unwrap();
        prop_assert_eq!(&out[..count], stations.as_slice());
    }

    #[test]
    fn prop_favorite_destinations_clamp(favorites in prop::collection::vec(arbitrary_favorite(), 0..MAX_FAVORITE_DESTINATIONS * 2)) {
        let store = RecordStore::new(MemoryStorage::new());
        store.save_favorite_destinations(&favorites).unwrap();

        let loaded = store.load_favorite_destinations().unwrap();
        prop_assert_eq!(loaded.len(), favorites.len().min(MAX_FAVORITE_DESTINATIONS));
        prop_assert!(favorites.starts_with(loaded.as_slice()));
    }

    #[test]
    fn prop_favorite_destinations_into_short_buffer(
        favorites in prop::collection::vec(arbitrary_favorite(), 0..=MAX_FAVORITE_DESTINATIONS),
        room in 0..=MAX_FAVORITE_DESTINATIONS,
    ) {
        let store = RecordStore::new(MemoryStorage::new());
        store.save_favorite_destinations(&favorites).unwrap();

        let mut out = vec![FavoriteDestination::default(); room];
        let count = store.load_favorite_destinations_into(&mut out).unwrap();
        let expected = if favorites.len() <= room { favorites.len() } else { 0 };
        prop_assert_eq!(count, expected);
        prop_assert_eq!(&out[..count], &favorites[..count]);
    }
}

#[test]
fn redb_round_trip_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("perron.redb");
    let routes = vec![
        SavedConnection::new("8503000", "Zuerich HB", "8507000", "Bern"),
        SavedConnection::new("8507000", "Bern", "8505000", "Luzern"),
    ];

    {
        let store = RecordStore::new(RedbStorage::open(&path).unwrap());
        store.save_connections(&routes).unwrap();
        store
            .save_favorite_destinations(&[FavoriteDestination::new("8503000", "Zuerich HB", "Work")])
            .unwrap();
    }

    let store = RecordStore::new(RedbStorage::open(&path).unwrap());
    assert_eq!(store.load_connections().unwrap().as_slice(), routes.as_slice());
    assert_eq!(store.load_favorite_destinations().unwrap()[0].label, "Work");
}
