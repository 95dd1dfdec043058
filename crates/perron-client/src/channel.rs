//! Message channel abstraction.
//!
//! Models the host's duplex message transport: opened once, at most one
//! outbound message in flight, completion reported asynchronously. The
//! channel knows nothing about message meaning.

use perron_proto::{FieldSet, Tag, Value};

use crate::ChannelError;

/// Outbound message under construction, obtained from
/// [`MessageChannel::begin_send`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboxHandle {
    fields: FieldSet,
}

impl OutboxHandle {
    /// Empty handle. Channel implementations hand these out from
    /// `begin_send`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn write(&mut self, tag: Tag, value: impl Into<Value>) {
        self.fields.insert(tag, value);
    }

    /// Copy every field of `fields` into the handle.
    pub fn write_all(&mut self, fields: &FieldSet) {
        for (key, value) in fields.iter() {
            self.fields.insert_raw(key, value.clone());
        }
    }

    /// Fields written so far.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Consume into the field set to transmit.
    pub fn into_fields(self) -> FieldSet {
        self.fields
    }
}

/// Asynchronous notifications from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// An inbound field set arrived.
    Received(FieldSet),
    /// An inbound message was dropped by the host.
    Dropped(ChannelError),
    /// The in-flight outbound message was delivered.
    Sent,
    /// The in-flight outbound message failed.
    Failed(ChannelError),
}

/// Host message transport.
///
/// # Invariants
///
/// - `open` succeeds at most once per channel.
/// - Between a successful `send` and the matching `Sent` or `Failed` event,
///   `begin_send` returns `ChannelError::Busy`.
/// - Inbound messages are reported in arrival order; outbound completions in
///   send order.
pub trait MessageChannel {
    /// Allocate buffers and start the transport.
    fn open(&mut self, inbox_capacity: usize, outbox_capacity: usize) -> Result<(), ChannelError>;

    /// Start a new outbound message.
    fn begin_send(&mut self) -> Result<OutboxHandle, ChannelError>;

    /// Submit a message started with `begin_send`. Completion is reported
    /// later as [`ChannelEvent::Sent`] or [`ChannelEvent::Failed`].
    fn send(&mut self, handle: OutboxHandle) -> Result<(), ChannelError>;

    /// Next pending notification, if any.
    fn poll_event(&mut self) -> Option<ChannelEvent>;
}
