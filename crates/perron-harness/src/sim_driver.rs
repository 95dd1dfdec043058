//! Simulation driver.
//!
//! Runs the production [`Runtime`] against [`SimChannel`], [`SimTimers`] and
//! a [`MockCompanion`], all on one [`SimEnv`] clock. Delivered messages are
//! answered by the companion immediately; time only moves when a test asks
//! for it with [`SimDriver::run_for`].

use std::time::Duration;

use perron_client::{ChannelError, Client, ClientConfig, ClientError, ClientEvent, DomainEvent, Runtime};
use perron_core::{Environment, Storage};
use perron_proto::FieldSet;
use tracing::trace;

use crate::{MockCompanion, SimChannel, SimEnv, SimTimers};

/// Upper bound on settle iterations before a run is declared livelocked.
const MAX_SETTLE_ROUNDS: usize = 10_000;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

impl From<ClientError> for SimDriverError {
    fn from(err: ClientError) -> Self {
        Self(err.to_string())
    }
}

impl From<ChannelError> for SimDriverError {
    fn from(err: ChannelError) -> Self {
        Self(err.to_string())
    }
}

/// Deterministic driver for end-to-end client scenarios.
pub struct SimDriver<S: Storage> {
    env: SimEnv,
    runtime: Runtime<SimChannel, SimTimers, S>,
    companion: MockCompanion,
    events: Vec<DomainEvent>,
}

impl<S: Storage> SimDriver<S> {
    /// Driver with a reliable channel.
    pub fn new(config: ClientConfig, storage: S, companion: MockCompanion) -> Result<Self, SimDriverError> {
        let env = SimEnv::new();
        let channel = SimChannel::new(env.clone());
        Self::with_channel(env, channel, config, storage, companion)
    }

    /// Driver over a pre-configured channel. `channel` must share `env`.
    pub fn with_channel(
        env: SimEnv,
        channel: SimChannel,
        config: ClientConfig,
        storage: S,
        companion: MockCompanion,
    ) -> Result<Self, SimDriverError> {
        let timers = SimTimers::new(env.clone());
        let runtime = Runtime::open(Client::new(config, storage), channel, timers)?;
        Ok(Self { env, runtime, companion, events: Vec::new() })
    }

    /// The virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// The client under test.
    pub fn client(&self) -> &Client<S> {
        self.runtime.client()
    }

    /// The simulated channel.
    pub fn channel(&self) -> &SimChannel {
        self.runtime.channel()
    }

    /// The simulated channel, mutably (for scripting failures).
    pub fn channel_mut(&mut self) -> &mut SimChannel {
        self.runtime.channel_mut()
    }

    /// The companion.
    pub fn companion(&self) -> &MockCompanion {
        &self.companion
    }

    /// Every domain event delivered so far.
    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Take the domain events delivered so far.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed a user or lifecycle event, then settle without moving time.
    pub fn submit(&mut self, event: ClientEvent) -> Result<(), SimDriverError> {
        let delivered = self.runtime.submit(event)?;
        self.events.extend(delivered);
        self.settle()
    }

    /// Queue a field set from the companion, then settle.
    pub fn inject(&mut self, fields: &FieldSet) -> Result<(), SimDriverError> {
        self.runtime.channel_mut().inject(fields);
        self.settle()
    }

    /// Queue raw bytes from the companion, then settle.
    pub fn inject_bytes(&mut self, bytes: &[u8]) -> Result<(), SimDriverError> {
        self.runtime.channel_mut().inject_bytes(bytes);
        self.settle()
    }

    /// Advance virtual time by `duration`, firing every timer due on the way
    /// at its own deadline.
    pub fn run_for(&mut self, duration: Duration) -> Result<(), SimDriverError> {
        let end = self.env.now().after(duration);
        self.settle()?;

        while let Some(deadline) = self.runtime.timers().next_deadline() {
            if deadline > end {
                break;
            }
            self.env.advance_to(deadline);
            self.settle()?;
        }

        self.env.advance_to(end);
        self.settle()
    }

    /// Process channel notifications, companion replies and due timers
    /// until nothing is left at the current instant.
    pub fn settle(&mut self) -> Result<(), SimDriverError> {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let delivered = self.runtime.poll()?;
            self.events.extend(delivered);
            self.answer_deliveries();

            if !self.has_due_work() {
                return Ok(());
            }
        }

        Err(SimDriverError(format!("no quiescence after {MAX_SETTLE_ROUNDS} rounds")))
    }

    fn answer_deliveries(&mut self) {
        let now_secs = self.env.wall_clock_secs();
        let deliveries = self.runtime.channel_mut().take_new_deliveries();

        for delivery in deliveries {
            let Some(message) = delivery.message() else {
                trace!("companion ignoring unparseable delivery");
                continue;
            };
            for reply in self.companion.respond(&message, now_secs) {
                self.runtime.channel_mut().inject(&reply);
            }
        }
    }

    fn has_due_work(&self) -> bool {
        let timer_due = self.runtime.timers().next_deadline().is_some_and(|deadline| deadline <= self.env.now());
        self.runtime.channel().has_pending_events() || self.runtime.pending_work() > 0 || timer_due
    }
}
