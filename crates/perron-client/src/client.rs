//! Client state machine.
//!
//! The `Client` ties the dispatcher, the favorites transfer, the watched
//! route and the outbound queue together. All of its state is owned here;
//! nothing is global.

use std::collections::VecDeque;

use perron_core::{
    Connection, FavoriteDestination, JourneySection, PinnedConnection, PinnedSlot, RecordStore,
    SavedConnection, Station, Storage,
};
use perron_proto::{ConnectionData, FieldSet, InboundMessage, OutboundMessage};
use tracing::{debug, error, info, warn};

use crate::{
    ChannelError, ClientConfig, ClientError, ConnectionView, Dispatcher, FavoritesTransfer,
    SentOutcome, TimerId, TransferError, TransferPhase,
    event::{ClientAction, ClientEvent, DomainEvent, SendOrigin},
};

/// Client for the companion protocol.
pub struct Client<S: Storage> {
    config: ClientConfig,
    store: RecordStore<S>,
    pinned: PinnedSlot<S>,
    dispatcher: Dispatcher,
    transfer: FavoritesTransfer,
    view: ConnectionView,
    /// Armed connection refresh timer while a route is watched.
    refresh_timer: Option<TimerId>,
    /// Origin of the send awaiting confirmation.
    in_flight: Option<SendOrigin>,
    /// Sends waiting for the in-flight one to complete.
    queue: VecDeque<(SendOrigin, OutboundMessage)>,
    next_timer: u64,
}

impl<S: Storage> Client<S> {
    /// Create a client persisting to `storage`.
    pub fn new(config: ClientConfig, storage: S) -> Self {
        Self {
            config,
            store: RecordStore::new(storage.clone()),
            pinned: PinnedSlot::new(storage),
            dispatcher: Dispatcher::new(),
            transfer: FavoritesTransfer::new(),
            view: ConnectionView::Idle,
            refresh_timer: None,
            in_flight: None,
            queue: VecDeque::new(),
            next_timer: 0,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Persistent record store.
    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// Stations from the latest nearby search.
    pub fn nearby_stations(&self) -> &[Station] {
        self.dispatcher.stations()
    }

    /// State of the watched route.
    pub fn connection_view(&self) -> &ConnectionView {
        &self.view
    }

    /// Favorites transfer state.
    pub fn transfer(&self) -> &FavoritesTransfer {
        &self.transfer
    }

    /// Whether a send is awaiting confirmation.
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of sends queued behind the in-flight one.
    pub fn queued_sends(&self) -> usize {
        self.queue.len()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Inbound(fields) => self.handle_inbound(&fields),
            ClientEvent::InboundDropped(reason) => {
                warn!(%reason, "inbound message dropped");
                Ok(Vec::new())
            },
            ClientEvent::OutboundSent => Ok(self.handle_outbound_sent()),
            ClientEvent::OutboundFailed(reason) => Ok(self.handle_outbound_failed(&reason)),
            ClientEvent::TimerFired(id) => Ok(self.handle_timer(id)),
            ClientEvent::SearchNearbyStations => Ok(self.handle_search_nearby()),
            ClientEvent::WatchConnections { route } => Ok(self.handle_watch(route)),
            ClientEvent::StopWatching => Ok(self.handle_stop_watching()),
            ClientEvent::RequestFavorites => {
                let mut actions = Vec::new();
                self.enqueue(SendOrigin::Request, OutboundMessage::RequestFavorites, &mut actions);
                Ok(actions)
            },
            ClientEvent::Teardown => Ok(self.handle_teardown()),
        }
    }

    /// Startup check of the pinned slot: load it, clear it if the journey
    /// arrived before `now` (epoch seconds), and return what survives.
    pub fn restore_pinned(&self, now: i64) -> Result<PinnedConnection, ClientError> {
        Ok(self.pinned.load_unexpired(now)?)
    }

    /// Pin `connection` as the active journey, replacing any previous pin.
    pub fn pin(
        &self,
        connection: Connection,
        route: SavedConnection,
        now: i64,
    ) -> Result<PinnedConnection, ClientError> {
        let pinned = PinnedConnection::new(connection, route, now);
        self.pinned.save(&pinned)?;
        Ok(pinned)
    }

    /// Clear the pinned slot.
    pub fn unpin(&self) -> Result<(), ClientError> {
        Ok(self.pinned.clear()?)
    }

    /// Append a saved route. Returns `false` without writing if the list is
    /// already full.
    pub fn add_route(&self, route: SavedConnection) -> Result<bool, ClientError> {
        if self.store.is_connection_limit_reached()? {
            warn!(from = %route.departure_name, to = %route.arrival_name, "saved route limit reached");
            return Ok(false);
        }

        let mut routes = self.store.load_connections()?.into_vec();
        routes.push(route);
        self.store.save_connections(&routes)?;
        Ok(true)
    }

    /// Remove the saved route at `index`. Returns the removed route, `None`
    /// if out of range.
    pub fn remove_route(&self, index: usize) -> Result<Option<SavedConnection>, ClientError> {
        let mut routes = self.store.load_connections()?;
        let Some(removed) = routes.remove(index) else {
            return Ok(None);
        };
        self.store.save_connections(&routes)?;
        Ok(Some(removed))
    }

    fn handle_inbound(&mut self, fields: &FieldSet) -> Result<Vec<ClientAction>, ClientError> {
        let Some(message) = InboundMessage::parse(fields) else {
            debug!(fields = fields.len(), "inbound message matches no known shape, dropping");
            return Ok(Vec::new());
        };

        let mut actions = Vec::new();
        match message {
            InboundMessage::FavoritesRequested => self.start_transfer(&mut actions)?,
            InboundMessage::Station { id, name, distance_meters } => {
                let station = Station::new(&id, &name, distance_meters);
                actions.extend(self.dispatcher.station_found(station).map(ClientAction::Deliver));
            },
            InboundMessage::FavoritesCount { count } => {
                let events = self.dispatcher.favorites_announced(count, &self.store)?;
                actions.extend(events.into_iter().map(ClientAction::Deliver));
            },
            InboundMessage::FavoriteItem { id, name, label } => {
                let favorite = FavoriteDestination::new(&id, &name, &label);
                let events = self.dispatcher.favorite_received(favorite, &self.store)?;
                actions.extend(events.into_iter().map(ClientAction::Deliver));
            },
            InboundMessage::Connection(data) => {
                actions.push(ClientAction::Deliver(self.connection_received(&data)));
            },
            InboundMessage::Error { message } => {
                error!(%message, "companion reported an error");
                actions.push(ClientAction::Deliver(DomainEvent::CompanionError { message }));
            },
        }
        Ok(actions)
    }

    fn start_transfer(&mut self, actions: &mut Vec<ClientAction>) -> Result<(), ClientError> {
        if self.transfer.is_active() {
            let err = TransferError::InProgress { phase: self.transfer.phase() };
            warn!(error = %err, "ignoring favorites request");
            return Ok(());
        }

        let favorites = self.store.load_favorite_destinations()?.into_vec();
        let count = favorites.len();
        match self.transfer.start(favorites) {
            Ok(message) => {
                actions.push(ClientAction::Deliver(DomainEvent::FavoritesTransferStarted { count }));
                self.enqueue(SendOrigin::FavoritesCount, message, actions);
            },
            Err(e) => warn!(error = %e, "favorites transfer rejected"),
        }
        Ok(())
    }

    fn connection_received(&mut self, data: &ConnectionData) -> DomainEvent {
        let route = self.view.route().cloned();
        let (departure_station, arrival_station) = route
            .as_ref()
            .map(|r| (r.departure_name.clone(), r.arrival_name.clone()))
            .unwrap_or_default();

        let section = JourneySection {
            departure_station,
            arrival_station,
            departure_time: data.departure_time,
            arrival_time: data.arrival_time,
            platform: data.platform.as_str().into(),
            train_type: data.train_type.as_str().into(),
            delay_minutes: data.delay_minutes,
        };
        let connection = Connection::single(section, data.num_changes);

        match &route {
            Some(route) => {
                debug!(from = %route.departure_name, to = %route.arrival_name, "connection data received");
                self.view =
                    ConnectionView::Loaded { route: route.clone(), connections: vec![connection.clone()] };
            },
            None => debug!("connection data received with no watched route"),
        }

        DomainEvent::ConnectionReceived { route, connection }
    }

    fn handle_outbound_sent(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        let Some(origin) = self.in_flight.take() else {
            warn!("send confirmation with nothing in flight");
            return actions;
        };
        debug!(?origin, "outbound message sent");

        if matches!(origin, SendOrigin::FavoritesCount | SendOrigin::FavoriteItem(_)) {
            let timer = self.allocate_timer();
            match self.transfer.on_sent(timer) {
                SentOutcome::Schedule(id) => {
                    actions.push(ClientAction::ScheduleTimer { id, delay: self.config.pacing_delay });
                },
                SentOutcome::Completed { sent } => {
                    actions.push(ClientAction::Deliver(DomainEvent::FavoritesTransferCompleted { sent }));
                },
                SentOutcome::Ignored => {},
            }
        }

        self.pump_queue(&mut actions);
        actions
    }

    fn handle_outbound_failed(&mut self, reason: &ChannelError) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        let origin = self.in_flight.take();
        warn!(?origin, %reason, "outbound message failed");

        if matches!(origin, Some(SendOrigin::FavoritesCount | SendOrigin::FavoriteItem(_))) {
            self.fail_transfer(&mut actions);
        }

        self.pump_queue(&mut actions);
        actions
    }

    fn handle_timer(&mut self, id: TimerId) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        if self.refresh_timer == Some(id) {
            if let Some(route) = self.view.route().cloned() {
                debug!(from = %route.departure_name, to = %route.arrival_name, "refreshing connections");
                self.enqueue(SendOrigin::Request, request_connections(&route), &mut actions);
                self.arm_refresh(&mut actions);
            }
            return actions;
        }

        if let Some(message) = self.transfer.on_timer(id) {
            let index = match self.transfer.phase() {
                TransferPhase::SendingItem(index) => index,
                TransferPhase::Idle | TransferPhase::SendingCount => 0,
            };
            self.enqueue(SendOrigin::FavoriteItem(index), message, &mut actions);
            return actions;
        }

        debug!(timer = %id, "ignoring stale timer");
        actions
    }

    fn handle_search_nearby(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        self.dispatcher.clear_stations();
        self.enqueue(SendOrigin::Request, OutboundMessage::RequestNearbyStations, &mut actions);
        actions
    }

    fn handle_watch(&mut self, route: SavedConnection) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if let Some(id) = self.refresh_timer.take() {
            actions.push(ClientAction::CancelTimer(id));
        }

        info!(from = %route.departure_name, to = %route.arrival_name, "watching connections");
        self.enqueue(SendOrigin::Request, request_connections(&route), &mut actions);
        self.view = ConnectionView::Loading { route };
        self.arm_refresh(&mut actions);
        actions
    }

    fn handle_stop_watching(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if let Some(id) = self.refresh_timer.take() {
            actions.push(ClientAction::CancelTimer(id));
        }
        self.view = ConnectionView::Idle;
        actions
    }

    fn handle_teardown(&mut self) -> Vec<ClientAction> {
        let mut actions = self.handle_stop_watching();
        if let Some(id) = self.transfer.abort() {
            actions.push(ClientAction::CancelTimer(id));
        }
        // The host still owns the in-flight send; keep the slot busy but stop
        // its completion from reaching the next transfer.
        if matches!(self.in_flight, Some(SendOrigin::FavoritesCount | SendOrigin::FavoriteItem(_))) {
            self.in_flight = Some(SendOrigin::Detached);
        }
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "dropping queued sends on teardown");
        }
        self.queue.clear();
        info!("client torn down");
        actions
    }

    /// Send now if nothing is in flight, else queue. Drops the message when
    /// the queue is full.
    fn enqueue(&mut self, origin: SendOrigin, message: OutboundMessage, actions: &mut Vec<ClientAction>) {
        if self.in_flight.is_none() {
            self.in_flight = Some(origin);
            actions.push(ClientAction::Send(message));
            return;
        }

        if self.queue.len() >= self.config.outbound_queue_capacity {
            warn!(?origin, capacity = self.config.outbound_queue_capacity, "outbound queue full, dropping message");
            if matches!(origin, SendOrigin::FavoritesCount | SendOrigin::FavoriteItem(_)) {
                self.fail_transfer(actions);
            }
            return;
        }

        self.queue.push_back((origin, message));
    }

    fn pump_queue(&mut self, actions: &mut Vec<ClientAction>) {
        if self.in_flight.is_some() {
            return;
        }
        if let Some((origin, message)) = self.queue.pop_front() {
            self.in_flight = Some(origin);
            actions.push(ClientAction::Send(message));
        }
    }

    fn fail_transfer(&mut self, actions: &mut Vec<ClientAction>) {
        if let Some(phase) = self.transfer.on_failed() {
            actions.push(ClientAction::Deliver(DomainEvent::FavoritesTransferFailed { phase }));
        }
    }

    fn arm_refresh(&mut self, actions: &mut Vec<ClientAction>) {
        let id = self.allocate_timer();
        self.refresh_timer = Some(id);
        actions.push(ClientAction::ScheduleTimer { id, delay: self.config.refresh_interval });
    }

    fn allocate_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }
}

fn request_connections(route: &SavedConnection) -> OutboundMessage {
    OutboundMessage::RequestConnections {
        departure_id: route.departure_id.to_string(),
        arrival_id: route.arrival_id.to_string(),
    }
}
