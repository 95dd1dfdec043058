//! In-process loopback channel.
//!
//! Stands in for the phone link when syncing from the command line: every
//! send is accepted and confirmed on the next poll, and the companion's side
//! is a recording of what arrived. Sends can be scripted to fail so the
//! abort path can be exercised from the binary.

use std::collections::{BTreeSet, VecDeque};

use perron_client::{ChannelError, ChannelEvent, MessageChannel, OutboxHandle};
use perron_core::Environment;
use perron_proto::{FieldSet, OutboundMessage};
use tracing::debug;

/// Loopback [`MessageChannel`] stamping deliveries with `E`'s clock.
#[derive(Debug)]
pub struct LoopbackChannel<E: Environment> {
    env: E,
    outbox_capacity: Option<usize>,
    in_flight: bool,
    sends: usize,
    fail_at: BTreeSet<usize>,
    events: VecDeque<ChannelEvent>,
    delivered: Vec<(E::Instant, OutboundMessage)>,
}

impl<E: Environment> LoopbackChannel<E> {
    /// Unopened loopback channel.
    pub fn new(env: E) -> Self {
        Self {
            env,
            outbox_capacity: None,
            in_flight: false,
            sends: 0,
            fail_at: BTreeSet::new(),
            events: VecDeque::new(),
            delivered: Vec::new(),
        }
    }

    /// Fail the send with zero-based index `index`.
    #[must_use]
    pub fn failing_send(mut self, index: usize) -> Self {
        self.fail_at.insert(index);
        self
    }

    /// Queue an inbound message as if the companion sent it.
    pub fn inject(&mut self, fields: FieldSet) {
        self.events.push_back(ChannelEvent::Received(fields));
    }

    /// Whether notifications are waiting to be polled.
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Messages the companion side received, with their send instants.
    pub fn delivered(&self) -> &[(E::Instant, OutboundMessage)] {
        &self.delivered
    }
}

impl<E: Environment> MessageChannel for LoopbackChannel<E> {
    fn open(&mut self, _inbox_capacity: usize, outbox_capacity: usize) -> Result<(), ChannelError> {
        if self.outbox_capacity.is_some() {
            return Err(ChannelError::AlreadyOpen);
        }
        self.outbox_capacity = Some(outbox_capacity);
        Ok(())
    }

    fn begin_send(&mut self) -> Result<OutboxHandle, ChannelError> {
        if self.outbox_capacity.is_none() {
            return Err(ChannelError::NotOpen);
        }
        if self.in_flight {
            return Err(ChannelError::Busy);
        }
        Ok(OutboxHandle::new())
    }

    fn send(&mut self, handle: OutboxHandle) -> Result<(), ChannelError> {
        let Some(capacity) = self.outbox_capacity else {
            return Err(ChannelError::NotOpen);
        };
        if self.in_flight {
            return Err(ChannelError::Busy);
        }

        let fields = handle.into_fields();
        fields.encode_bounded(capacity)?;

        let index = self.sends;
        self.sends += 1;
        self.in_flight = true;

        if self.fail_at.remove(&index) {
            debug!(index, "loopback send failing as scripted");
            self.events.push_back(ChannelEvent::Failed(ChannelError::NotConnected));
            return Ok(());
        }

        if let Some(message) = OutboundMessage::parse(&fields) {
            self.delivered.push((self.env.now(), message));
        }
        self.events.push_back(ChannelEvent::Sent);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<ChannelEvent> {
        let event = self.events.pop_front()?;
        if matches!(event, ChannelEvent::Sent | ChannelEvent::Failed(_)) {
            self.in_flight = false;
        }
        Some(event)
    }
}
