//! Synchronous runtime executing client actions.
//!
//! The runtime is the single caller of [`Client::handle`]. Events are
//! processed from a FIFO work queue: actions that produce follow-up events
//! (a failed `begin_send`, for instance) push them onto the queue instead of
//! recursing into the client.

use std::collections::VecDeque;

use perron_core::Storage;
use tracing::{debug, warn};

use crate::{
    ChannelError, ChannelEvent, Client, ClientAction, ClientError, ClientEvent, DomainEvent,
    MessageChannel, TimerService,
};

/// Drives a [`Client`] against a channel and a timer host.
pub struct Runtime<C, T, S>
where
    C: MessageChannel,
    T: TimerService,
    S: Storage,
{
    client: Client<S>,
    channel: C,
    timers: T,
    work: VecDeque<ClientEvent>,
}

impl<C, T, S> Runtime<C, T, S>
where
    C: MessageChannel,
    T: TimerService,
    S: Storage,
{
    /// Open `channel` with the client's configured capacities.
    ///
    /// # Errors
    ///
    /// Returns the channel's error if it cannot be opened.
    pub fn open(client: Client<S>, mut channel: C, timers: T) -> Result<Self, ChannelError> {
        let config = client.config();
        channel.open(config.inbox_capacity, config.outbox_capacity)?;
        Ok(Self { client, channel, timers, work: VecDeque::new() })
    }

    /// The client.
    pub fn client(&self) -> &Client<S> {
        &self.client
    }

    /// The channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The channel, mutably (for simulation scripting).
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// The timer host.
    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// The timer host, mutably (for advancing virtual time).
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Events waiting to be processed.
    pub fn pending_work(&self) -> usize {
        self.work.len()
    }

    /// Feed an event and process the work queue until it is empty.
    ///
    /// Returns the domain events delivered along the way.
    ///
    /// # Errors
    ///
    /// Stops at the first event the client fails to handle. Events queued
    /// after it stay queued for the next call.
    pub fn submit(&mut self, event: ClientEvent) -> Result<Vec<DomainEvent>, ClientError> {
        self.work.push_back(event);
        self.run_queue()
    }

    /// Collect channel notifications and expired timers, then process the
    /// work queue.
    pub fn poll(&mut self) -> Result<Vec<DomainEvent>, ClientError> {
        self.collect();
        self.run_queue()
    }

    fn collect(&mut self) {
        while let Some(event) = self.channel.poll_event() {
            self.work.push_back(match event {
                ChannelEvent::Received(fields) => ClientEvent::Inbound(fields),
                ChannelEvent::Dropped(reason) => ClientEvent::InboundDropped(reason),
                ChannelEvent::Sent => ClientEvent::OutboundSent,
                ChannelEvent::Failed(reason) => ClientEvent::OutboundFailed(reason),
            });
        }
        while let Some(id) = self.timers.poll_expired() {
            self.work.push_back(ClientEvent::TimerFired(id));
        }
    }

    fn run_queue(&mut self) -> Result<Vec<DomainEvent>, ClientError> {
        let mut delivered = Vec::new();

        while let Some(event) = self.work.pop_front() {
            let actions = self.client.handle(event)?;
            for action in actions {
                self.execute(action, &mut delivered);
            }
        }

        Ok(delivered)
    }

    fn execute(&mut self, action: ClientAction, delivered: &mut Vec<DomainEvent>) {
        match action {
            ClientAction::Send(message) => {
                let fields = message.to_field_set();
                let result = self.channel.begin_send().and_then(|mut handle| {
                    handle.write_all(&fields);
                    self.channel.send(handle)
                });
                if let Err(reason) = result {
                    warn!(?message, %reason, "send could not be started");
                    self.work.push_back(ClientEvent::OutboundFailed(reason));
                }
            },
            ClientAction::ScheduleTimer { id, delay } => {
                debug!(timer = %id, ?delay, "arming timer");
                self.timers.schedule(id, delay);
            },
            ClientAction::CancelTimer(id) => {
                debug!(timer = %id, "cancelling timer");
                self.timers.cancel(id);
            },
            ClientAction::Deliver(event) => delivered.push(event),
        }
    }
}
