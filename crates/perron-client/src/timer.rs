//! Timer identifiers and the timer host abstraction.

use std::{fmt, time::Duration};

/// Identifier of a one-shot timer armed by the client.
///
/// Ids are never reused within one client, so a fired id that the client no
/// longer owns is recognizably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Host for one-shot timers.
///
/// # Invariants
///
/// - A cancelled timer never appears in `poll_expired`.
/// - Expired timers are returned in deadline order; ties in scheduling order.
pub trait TimerService {
    /// Arm timer `id` to fire once after `delay`. Re-arming an armed id
    /// replaces its deadline.
    fn schedule(&mut self, id: TimerId, delay: Duration);

    /// Disarm timer `id`. No-op if not armed.
    fn cancel(&mut self, id: TimerId);

    /// Next timer whose deadline has passed, removing it.
    fn poll_expired(&mut self) -> Option<TimerId>;
}
