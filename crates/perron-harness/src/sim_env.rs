//! Virtual clock implementing [`Environment`].
//!
//! All clones share one clock. Time only moves when a test or the driver
//! calls [`SimEnv::advance`] (or `sleep`, which advances instead of
//! waiting).

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use perron_core::Environment;

/// Wall-clock seconds the simulation starts at (2023-11-14T22:13:20Z).
pub const DEFAULT_EPOCH_SECS: i64 = 1_700_000_000;

/// Instant on the virtual clock: time elapsed since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the simulation started.
    pub fn elapsed(self) -> Duration {
        self.0
    }

    /// This instant moved forward by `delay`.
    pub fn after(self, delay: Duration) -> Self {
        Self(self.0.saturating_add(delay))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Shared virtual clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed: Arc<Mutex<Duration>>,
    epoch_secs: i64,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Clock at zero, wall clock at [`DEFAULT_EPOCH_SECS`].
    pub fn new() -> Self {
        Self::with_epoch(DEFAULT_EPOCH_SECS)
    }

    /// Clock at zero, wall clock at `epoch_secs`.
    pub fn with_epoch(epoch_secs: i64) -> Self {
        Self { elapsed: Arc::new(Mutex::new(Duration::ZERO)), epoch_secs }
    }

    /// Move the clock forward.
    #[allow(clippy::expect_used, reason = "Mutex poisoning indicates a panic elsewhere")]
    pub fn advance(&self, delay: Duration) {
        let mut elapsed = self.elapsed.lock().expect("clock mutex poisoned");
        *elapsed = elapsed.saturating_add(delay);
    }

    /// Move the clock to `instant`. Earlier instants are ignored so the
    /// clock never goes backwards.
    #[allow(clippy::expect_used, reason = "Mutex poisoning indicates a panic elsewhere")]
    pub fn advance_to(&self, instant: SimInstant) {
        let mut elapsed = self.elapsed.lock().expect("clock mutex poisoned");
        if instant.0 > *elapsed {
            *elapsed = instant.0;
        }
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    #[allow(clippy::expect_used, reason = "Mutex poisoning indicates a panic elsewhere")]
    fn now(&self) -> SimInstant {
        SimInstant(*self.elapsed.lock().expect("clock mutex poisoned"))
    }

    fn wall_clock_secs(&self) -> i64 {
        let secs = i64::try_from(self.now().elapsed().as_secs()).unwrap_or(i64::MAX);
        self.epoch_secs.saturating_add(secs)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}
