//! Production Environment implementation using the system clock.
//!
//! `SystemEnv` reads `std::time::Instant` for monotonic time, the system
//! clock for epoch seconds, and sleeps on the tokio timer wheel.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use perron_core::Environment;

/// Production environment using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    /// Clocks set before 1970 read as the epoch itself.
    #[allow(clippy::disallowed_methods)]
    fn wall_clock_secs(&self) -> i64 {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
