//! Favorites transfer under random send failures.
//!
//! Whatever fails, the transfer must end in exactly one terminal event, the
//! companion must hold an in-order prefix of the stored list, and no item
//! may follow its predecessor sooner than the pacing delay.

use std::time::Duration;

use perron_client::{ClientConfig, DomainEvent};
use perron_core::{FavoriteDestination, MAX_FAVORITE_DESTINATIONS, MemoryStorage};
use perron_harness::{MockCompanion, SimChannel, SimDriver, SimEnv};
use proptest::prelude::*;

fn favorites(n: usize) -> Vec<FavoriteDestination> {
    (0..n)
        .map(|i| FavoriteDestination::new(&format!("85{i:05}"), &format!("Station {i}"), &format!("L{i}")))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transfer_ends_cleanly_under_failures(
        count in 0..=MAX_FAVORITE_DESTINATIONS,
        rate in 0.0f64..0.5,
        seed in any::<u64>(),
    ) {
        let env = SimEnv::new();
        let channel = SimChannel::new(env.clone()).with_failure_rate(rate, seed);
        let mut driver = SimDriver::with_channel(
            env,
            channel,
            ClientConfig::default(),
            MemoryStorage::new(),
            MockCompanion::new(),
        )
        .unwrap();
        let stored = favorites(count);
        driver.client().store().save_favorite_destinations(&stored).unwrap();

        let request = driver.companion().request_favorites();
        driver.inject(&request).unwrap();
        driver.run_for(Duration::from_secs(5)).unwrap();

        let terminal: Vec<_> = driver
            .events()
            .iter()
            .filter(|e| matches!(
                e,
                DomainEvent::FavoritesTransferCompleted { .. } | DomainEvent::FavoritesTransferFailed { .. }
            ))
            .collect();
        prop_assert_eq!(terminal.len(), 1);
        prop_assert!(!driver.client().transfer().is_active());

        let received = driver.companion().received();
        prop_assert!(received.len() <= stored.len());
        prop_assert_eq!(received, &stored[..received.len()]);
        if matches!(terminal[0], DomainEvent::FavoritesTransferCompleted { .. }) {
            prop_assert_eq!(received.len(), stored.len());
        }

        let attempts = driver.channel().attempts();
        for pair in attempts.windows(2) {
            prop_assert!(pair[1].at - pair[0].at >= Duration::from_millis(50));
        }
    }
}
