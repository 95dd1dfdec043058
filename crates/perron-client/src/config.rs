//! Client configuration.

use std::time::Duration;

use perron_proto::DEFAULT_MESSAGE_CAPACITY;

/// Tunables for the client and its runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Delay between a send confirmation and the next favorites item.
    pub pacing_delay: Duration,
    /// Interval between connection refreshes while a route is watched.
    pub refresh_interval: Duration,
    /// Inbox buffer size in bytes, passed to `MessageChannel::open`.
    pub inbox_capacity: usize,
    /// Outbox buffer size in bytes, passed to `MessageChannel::open`.
    pub outbox_capacity: usize,
    /// Sends queued behind the in-flight one before new sends are dropped.
    pub outbound_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(50),
            refresh_interval: Duration::from_secs(60),
            inbox_capacity: DEFAULT_MESSAGE_CAPACITY,
            outbox_capacity: DEFAULT_MESSAGE_CAPACITY,
            outbound_queue_capacity: 8,
        }
    }
}
