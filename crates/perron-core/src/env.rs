//! Environment abstraction for deterministic testing.
//!
//! Protocol and storage logic never read the clock directly. Drivers pass
//! time in, taken from an [`Environment`]: the system clock in the binary, a
//! virtual clock in the simulation harness.

use std::time::Duration;

/// Time source and async sleep for drivers.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual
    /// instant advanced by the test.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time in seconds since the Unix epoch.
    ///
    /// Used for pinned-connection expiry and `pinned_at` stamps, which are
    /// compared against timestamps sent by the companion.
    fn wall_clock_secs(&self) -> i64;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines express delays as timer
    /// actions instead.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
