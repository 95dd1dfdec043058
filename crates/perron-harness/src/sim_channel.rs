//! Simulated host message channel.
//!
//! Enforces the host's contract: opened once, one outbound message in
//! flight, completion reported asynchronously. Outbound field sets are
//! encoded against the outbox capacity and decoded again, so a message that
//! would not fit the real buffer fails here too.
//!
//! Failure injection is either scripted (fail the n-th send) or random from a
//! seeded ChaCha8 generator, so every run is reproducible.

use std::collections::{BTreeSet, VecDeque};

use perron_client::{ChannelError, ChannelEvent, MessageChannel, OutboxHandle};
use perron_core::Environment;
use perron_proto::{FieldSet, OutboundMessage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{SimEnv, SimInstant};

/// One call to `send`, whether or not it was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAttempt {
    /// Zero-based send index.
    pub index: usize,
    /// When `send` was called.
    pub at: SimInstant,
    /// Fields submitted.
    pub fields: FieldSet,
    /// Whether the send was confirmed.
    pub delivered: bool,
}

/// An outbound message the companion received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// When it was sent.
    pub at: SimInstant,
    /// Fields after the encode/decode round trip.
    pub fields: FieldSet,
}

impl Delivery {
    /// The message as the companion would parse it.
    pub fn message(&self) -> Option<OutboundMessage> {
        OutboundMessage::parse(&self.fields)
    }
}

/// In-memory [`MessageChannel`] with a virtual clock and failure injection.
#[derive(Debug)]
pub struct SimChannel {
    env: SimEnv,
    capacities: Option<(usize, usize)>,
    in_flight: bool,
    /// A handle was handed out by `begin_send` and not yet sent.
    begun: bool,
    events: VecDeque<ChannelEvent>,
    attempts: Vec<SendAttempt>,
    delivered: Vec<Delivery>,
    unread: usize,
    fail_at: BTreeSet<usize>,
    failure_rate: f64,
    rng: ChaCha8Rng,
    connected: bool,
}

impl SimChannel {
    /// Reliable channel on `env`'s clock.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            capacities: None,
            in_flight: false,
            begun: false,
            events: VecDeque::new(),
            attempts: Vec::new(),
            delivered: Vec::new(),
            unread: 0,
            fail_at: BTreeSet::new(),
            failure_rate: 0.0,
            rng: ChaCha8Rng::seed_from_u64(0),
            connected: true,
        }
    }

    /// Fail each send with probability `rate`, drawn from a generator seeded
    /// with `seed`.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64, seed: u64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Fail the send with zero-based index `index`.
    pub fn fail_send(&mut self, index: usize) {
        self.fail_at.insert(index);
    }

    /// Simulate the phone dropping off (or coming back). While disconnected
    /// every send fails with `NotConnected`.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Whether `open` succeeded.
    pub fn is_open(&self) -> bool {
        self.capacities.is_some()
    }

    /// Whether a send awaits completion.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether notifications are waiting to be polled.
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Queue an inbound field set from the companion.
    ///
    /// The set is encoded against the inbox capacity first. One that does
    /// not fit is reported as dropped, as the host would.
    pub fn inject(&mut self, fields: &FieldSet) {
        let capacity = self.inbox_capacity();
        let event = match fields.encode_bounded(capacity) {
            Ok(bytes) => Self::received(&bytes),
            Err(err) => ChannelEvent::Dropped(err.into()),
        };
        self.events.push_back(event);
    }

    /// Queue raw inbound bytes. Bytes that do not decode are reported as
    /// dropped.
    pub fn inject_bytes(&mut self, bytes: &[u8]) {
        let capacity = self.inbox_capacity();
        let event = if bytes.len() > capacity {
            ChannelEvent::Dropped(ChannelError::BufferOverflow { size: bytes.len(), capacity })
        } else {
            Self::received(bytes)
        };
        self.events.push_back(event);
    }

    /// Every send attempt so far.
    pub fn attempts(&self) -> &[SendAttempt] {
        &self.attempts
    }

    /// Every delivered message so far.
    pub fn delivered(&self) -> &[Delivery] {
        &self.delivered
    }

    /// Deliveries not yet returned by this method.
    pub fn take_new_deliveries(&mut self) -> Vec<Delivery> {
        let fresh = self.delivered[self.unread..].to_vec();
        self.unread = self.delivered.len();
        fresh
    }

    fn inbox_capacity(&self) -> usize {
        self.capacities.map_or(perron_proto::DEFAULT_MESSAGE_CAPACITY, |(inbox, _)| inbox)
    }

    fn received(bytes: &[u8]) -> ChannelEvent {
        match FieldSet::decode(bytes) {
            Ok(fields) => ChannelEvent::Received(fields),
            Err(err) => ChannelEvent::Dropped(err.into()),
        }
    }

    fn should_fail(&mut self, index: usize) -> Option<ChannelError> {
        if !self.connected {
            return Some(ChannelError::NotConnected);
        }
        if self.fail_at.remove(&index) {
            return Some(ChannelError::NotConnected);
        }
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return Some(ChannelError::Internal("injected failure".to_string()));
        }
        None
    }
}

impl MessageChannel for SimChannel {
    fn open(&mut self, inbox_capacity: usize, outbox_capacity: usize) -> Result<(), ChannelError> {
        if self.capacities.is_some() {
            return Err(ChannelError::AlreadyOpen);
        }
        self.capacities = Some((inbox_capacity, outbox_capacity));
        Ok(())
    }

    fn begin_send(&mut self) -> Result<OutboxHandle, ChannelError> {
        if self.capacities.is_none() {
            return Err(ChannelError::NotOpen);
        }
        if self.in_flight {
            return Err(ChannelError::Busy);
        }
        if self.begun {
            return Err(ChannelError::Pending);
        }
        self.begun = true;
        Ok(OutboxHandle::new())
    }

    fn send(&mut self, handle: OutboxHandle) -> Result<(), ChannelError> {
        let Some((_, outbox)) = self.capacities else {
            return Err(ChannelError::NotOpen);
        };
        self.begun = false;
        if self.in_flight {
            return Err(ChannelError::Busy);
        }

        let fields = handle.into_fields();
        let bytes = fields.encode_bounded(outbox)?;
        let index = self.attempts.len();
        let at = self.env.now();

        self.in_flight = true;
        let outcome = self.should_fail(index);
        let delivered = outcome.is_none();
        self.attempts.push(SendAttempt { index, at, fields, delivered });

        match outcome {
            None => {
                let fields = FieldSet::decode(&bytes)?;
                debug!(index, fields = fields.len(), "simulated send delivered");
                self.delivered.push(Delivery { at, fields });
                self.events.push_back(ChannelEvent::Sent);
            },
            Some(reason) => {
                debug!(index, %reason, "simulated send failed");
                self.events.push_back(ChannelEvent::Failed(reason));
            },
        }
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

#[cfg(test)]
mod tests {
    use perron_proto::Tag;

    use super::*;

    fn open_channel() -> SimChannel {
        let mut channel = SimChannel::new(SimEnv::new());
        channel.open(512, 512).unwrap();
        channel
    }

    fn send(channel: &mut SimChannel, fields: &FieldSet) -> Result<(), ChannelError> {
        let mut handle = channel.begin_send()?;
        handle.write_all(fields);
        channel.send(handle)
    }

    #[test]
    fn opens_once() {
        let mut channel = SimChannel::new(SimEnv::new());
        assert_eq!(channel.begin_send(), Err(ChannelError::NotOpen));
        channel.open(512, 512).unwrap();
        assert_eq!(channel.open(512, 512), Err(ChannelError::AlreadyOpen));
    }

    #[test]
    fn busy_until_completion_is_polled() {
        let mut channel = open_channel();
        let fields = FieldSet::new().with(Tag::RequestNearbyStations, 1u8);

        send(&mut channel, &fields).unwrap();
        assert_eq!(channel.begin_send(), Err(ChannelError::Busy));

        assert_eq!(channel.poll_event(), Some(ChannelEvent::Sent));
        assert!(channel.begin_send().is_ok());
        assert_eq!(channel.delivered()[0].message(), Some(OutboundMessage::RequestNearbyStations));
    }

    #[test]
    fn second_begin_without_send_is_pending() {
        let mut channel = open_channel();
        let mut handle = channel.begin_send().unwrap();
        assert_eq!(channel.begin_send(), Err(ChannelError::Pending));

        handle.write_all(&FieldSet::new().with(Tag::RequestNearbyStations, 1u8));
        channel.send(handle).unwrap();
        assert_eq!(channel.poll_event(), Some(ChannelEvent::Sent));
        assert!(channel.begin_send().is_ok());
    }

    #[test]
    fn scripted_failure_hits_only_that_send() {
        let mut channel = open_channel();
        channel.fail_send(1);
        let fields = FieldSet::new().with(Tag::RequestFavorites, 1u8);

        for _ in 0..3 {
            send(&mut channel, &fields).unwrap();
            channel.poll_event();
        }

        let delivered: Vec<bool> = channel.attempts().iter().map(|a| a.delivered).collect();
        assert_eq!(delivered, [true, false, true]);
        assert_eq!(channel.delivered().len(), 2);
    }

    #[test]
    fn oversized_send_is_rejected_before_flight() {
        let mut channel = SimChannel::new(SimEnv::new());
        channel.open(512, 16).unwrap();
        let fields = FieldSet::new().with(Tag::FavoriteName, "x".repeat(64));

        let err = send(&mut channel, &fields).unwrap_err();
        assert!(matches!(err, ChannelError::BufferOverflow { capacity: 16, .. }));
        assert!(!channel.is_in_flight());
    }

    #[test]
    fn undecodable_inbound_is_dropped() {
        let mut channel = open_channel();
        channel.inject_bytes(&[0xff, 0x00, 0x13]);
        assert!(matches!(channel.poll_event(), Some(ChannelEvent::Dropped(ChannelError::Malformed(_)))));
    }
}
