//! Subcommand implementations.
//!
//! Record commands write a short human-readable summary to `out`. The sync
//! command returns a [`SyncReport`] for the caller to print.

use std::{io::Write, time::Duration};

use perron_client::{Client, ClientConfig, ClientEvent, DomainEvent, Runtime, TransferPhase};
use perron_core::{
    Connection, Environment, FavoriteDestination, JourneySection, MAX_FAVORITE_DESTINATIONS,
    MAX_FAVORITE_STATIONS, MAX_SAVED_CONNECTIONS, SavedConnection, Station, Storage,
};
use perron_proto::{InboundMessage, OutboundMessage};
use tracing::{debug, info};

use crate::{CliError, EnvTimers, LoopbackChannel};

/// Startup path: restore the pinned journey (clearing it if it has arrived)
/// and list every stored record.
pub fn status<S: Storage>(client: &Client<S>, now: i64, out: &mut impl Write) -> Result<(), CliError> {
    let pinned = client.restore_pinned(now)?;
    if pinned.active {
        let route = &pinned.route;
        writeln!(
            out,
            "pinned: {} -> {} departs {} arrives {} ({} min, {} min delay)",
            route.departure_name,
            route.arrival_name,
            pinned.connection.departure_time,
            pinned.connection.arrival_time,
            pinned.connection.duration_secs() / 60,
            pinned.connection.total_delay_minutes,
        )?;
    } else {
        writeln!(out, "pinned: none")?;
    }

    let routes = client.store().load_connections()?;
    writeln!(out, "routes ({}/{MAX_SAVED_CONNECTIONS}):", routes.len())?;
    for (index, route) in routes.iter().enumerate() {
        writeln!(
            out,
            "  [{index}] {} ({}) -> {} ({})",
            route.departure_name, route.departure_id, route.arrival_name, route.arrival_id
        )?;
    }

    let favorites = client.store().load_favorite_destinations()?;
    writeln!(out, "favorites ({}/{MAX_FAVORITE_DESTINATIONS}):", favorites.len())?;
    for (index, favorite) in favorites.iter().enumerate() {
        writeln!(out, "  [{index}] {} {} ({})", favorite.label, favorite.name, favorite.id)?;
    }

    let stations = client.store().load_favorite_stations()?;
    writeln!(out, "stations ({}/{MAX_FAVORITE_STATIONS}):", stations.len())?;
    for (index, station) in stations.iter().enumerate() {
        writeln!(out, "  [{index}] {} ({})", station.name, station.id)?;
    }

    Ok(())
}

/// Append a saved route.
pub fn add_route<S: Storage>(
    client: &Client<S>,
    route: SavedConnection,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let summary = format!("{} -> {}", route.departure_name, route.arrival_name);
    if !client.add_route(route)? {
        return Err(CliError::ListFull { kind: "route", capacity: MAX_SAVED_CONNECTIONS });
    }
    writeln!(out, "added route {summary}")?;
    Ok(())
}

/// Remove the saved route at `index`.
pub fn remove_route<S: Storage>(client: &Client<S>, index: usize, out: &mut impl Write) -> Result<(), CliError> {
    let removed = client.remove_route(index)?.ok_or(CliError::NoSuchIndex { kind: "route", index })?;
    writeln!(out, "removed route {} -> {}", removed.departure_name, removed.arrival_name)?;
    Ok(())
}

/// Connection details supplied on the command line for `pin`.
#[derive(Debug, Clone, Default)]
pub struct PinRequest {
    /// Index of the saved route.
    pub route_index: usize,
    /// Departure, epoch seconds.
    pub departure_time: i64,
    /// Arrival, epoch seconds.
    pub arrival_time: i64,
    /// Departure platform.
    pub platform: String,
    /// Train category and number.
    pub train_type: String,
    /// Delay in minutes.
    pub delay_minutes: i32,
}

/// Pin a single-leg journey on a saved route.
pub fn pin<S: Storage>(
    client: &Client<S>,
    request: &PinRequest,
    now: i64,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let routes = client.store().load_connections()?;
    let route = routes
        .get(request.route_index)
        .cloned()
        .ok_or(CliError::NoSuchIndex { kind: "route", index: request.route_index })?;

    let section = JourneySection {
        departure_station: route.departure_name.clone(),
        arrival_station: route.arrival_name.clone(),
        departure_time: request.departure_time,
        arrival_time: request.arrival_time,
        platform: request.platform.as_str().into(),
        train_type: request.train_type.as_str().into(),
        delay_minutes: request.delay_minutes,
    };
    let pinned = client.pin(Connection::single(section, 0), route, now)?;

    writeln!(
        out,
        "pinned {} -> {} until {}",
        pinned.route.departure_name, pinned.route.arrival_name, pinned.connection.arrival_time
    )?;
    Ok(())
}

/// Clear the pinned slot.
pub fn clear_pinned<S: Storage>(client: &Client<S>, out: &mut impl Write) -> Result<(), CliError> {
    client.unpin()?;
    writeln!(out, "pinned connection cleared")?;
    Ok(())
}

/// Append a favorite destination.
pub fn add_favorite<S: Storage>(
    client: &Client<S>,
    favorite: FavoriteDestination,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut favorites = client.store().load_favorite_destinations()?;
    let summary = format!("{} {}", favorite.label, favorite.name);
    favorites
        .push(favorite)
        .map_err(|_| CliError::ListFull { kind: "favorite", capacity: MAX_FAVORITE_DESTINATIONS })?;
    client.store().save_favorite_destinations(&favorites)?;

    writeln!(out, "added favorite {summary}")?;
    Ok(())
}

/// Append a favorite station.
pub fn add_station<S: Storage>(client: &Client<S>, station: Station, out: &mut impl Write) -> Result<(), CliError> {
    let mut stations = client.store().load_favorite_stations()?;
    let summary = station.name.to_string();
    stations
        .push(station)
        .map_err(|_| CliError::ListFull { kind: "station", capacity: MAX_FAVORITE_STATIONS })?;
    client.store().save_favorite_stations(&stations)?;

    writeln!(out, "added station {summary}")?;
    Ok(())
}

/// How a favorites sync ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every item was confirmed.
    Completed {
        /// Items sent.
        sent: usize,
    },
    /// A send failed and the transfer stopped.
    Failed {
        /// Phase that failed.
        phase: TransferPhase,
    },
}

/// Result of [`sync_favorites`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// How the transfer ended.
    pub outcome: SyncOutcome,
    /// Messages the companion received, with their offset from the first.
    pub delivered: Vec<(Duration, OutboundMessage)>,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (offset, message) in &self.delivered {
            match message {
                OutboundMessage::FavoritesCount { count } => {
                    writeln!(f, "+{:>5}ms  count {count}", offset.as_millis())?;
                },
                OutboundMessage::FavoriteItem { id, name, label } => {
                    writeln!(f, "+{:>5}ms  item  {label} {name} ({id})", offset.as_millis())?;
                },
                other => writeln!(f, "+{:>5}ms  {other:?}", offset.as_millis())?,
            }
        }
        match self.outcome {
            SyncOutcome::Completed { sent } => write!(f, "sync complete: {sent} favorites sent"),
            SyncOutcome::Failed { phase } => write!(f, "sync failed at {phase:?}"),
        }
    }
}

/// Run the paced favorites transfer against a loopback companion.
///
/// The companion's favorites request is injected first; the runtime then
/// runs until the transfer completes or fails, sleeping on `env` between
/// pacing timers.
pub async fn sync_favorites<E, S>(
    env: E,
    config: ClientConfig,
    storage: S,
    channel: LoopbackChannel<E>,
) -> Result<SyncReport, CliError>
where
    E: Environment,
    S: Storage,
{
    let timers = EnvTimers::new(env.clone());
    let mut runtime = Runtime::open(Client::new(config, storage), channel, timers)?;
    runtime.channel_mut().inject(InboundMessage::FavoritesRequested.to_field_set());

    let outcome = loop {
        let events = runtime.poll()?;
        if let Some(outcome) = events.iter().find_map(terminal) {
            break outcome;
        }

        if runtime.channel().has_pending_events() {
            continue;
        }
        match runtime.timers().next_wait() {
            Some(wait) => {
                debug!(?wait, "waiting for pacing timer");
                env.sleep(wait).await;
            },
            None => return Err(CliError::Stalled),
        }
    };

    runtime.submit(ClientEvent::Teardown)?;
    info!(?outcome, "favorites sync finished");

    let delivered = runtime.channel().delivered();
    let start = delivered.first().map(|(at, _)| *at);
    let delivered = delivered
        .iter()
        .map(|(at, message)| (start.map_or(Duration::ZERO, |start| *at - start), message.clone()))
        .collect();

    Ok(SyncReport { outcome, delivered })
}

fn terminal(event: &DomainEvent) -> Option<SyncOutcome> {
    match event {
        DomainEvent::FavoritesTransferCompleted { sent } => Some(SyncOutcome::Completed { sent: *sent }),
        DomainEvent::FavoritesTransferFailed { phase } => Some(SyncOutcome::Failed { phase: *phase }),
        _ => None,
    }
}
