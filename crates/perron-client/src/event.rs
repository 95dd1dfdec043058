//! Client events and actions.

use std::time::Duration;

use perron_core::{Connection, FavoriteDestination, SavedConnection, Station};
use perron_proto::{FieldSet, OutboundMessage};

use crate::{ChannelError, TimerId, TransferPhase};

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Forwarding channel notifications (inbound messages, send completions)
/// - Reporting timers the client armed once they expire
/// - Forwarding user intents from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Field set received from the companion.
    Inbound(FieldSet),

    /// The host dropped an inbound message.
    InboundDropped(ChannelError),

    /// The in-flight outbound message was delivered.
    OutboundSent,

    /// The in-flight outbound message could not be started or delivered.
    OutboundFailed(ChannelError),

    /// A timer armed with [`ClientAction::ScheduleTimer`] expired.
    TimerFired(TimerId),

    /// User wants stations near their location.
    SearchNearbyStations,

    /// User opened a saved route: fetch connections now and periodically.
    WatchConnections {
        /// Route to watch.
        route: SavedConnection,
    },

    /// User left the route view.
    StopWatching,

    /// User wants the companion's favorites list.
    RequestFavorites,

    /// Process is shutting down: cancel timers and drop queued sends.
    Teardown,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Send a message to the companion. Never emitted while another send is
    /// in flight.
    Send(OutboundMessage),

    /// Arm a one-shot timer.
    ScheduleTimer {
        /// Timer to arm.
        id: TimerId,
        /// Delay until it fires.
        delay: Duration,
    },

    /// Disarm a timer.
    CancelTimer(TimerId),

    /// Hand a domain event to the UI.
    Deliver(DomainEvent),
}

/// Why a send was issued. Tracked for the in-flight message so its
/// completion reaches the right state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOrigin {
    /// User-initiated request.
    Request,
    /// Favorites count announcement.
    FavoritesCount,
    /// Favorites item at the given index.
    FavoriteItem(usize),
    /// Issued by a transfer that was torn down while the send was in flight.
    /// Its completion only frees the channel.
    Detached,
}

/// Parsed results delivered to UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A nearby station was appended to the station list.
    StationFound {
        /// The station.
        station: Station,
        /// Stations in the list after the append.
        total: usize,
    },

    /// The companion announced a favorites list; the receive buffer was
    /// reset.
    FavoritesSessionStarted {
        /// Number of items announced.
        announced: u32,
    },

    /// A favorite was accepted and the stored list overwritten.
    FavoriteReceived {
        /// The favorite.
        favorite: FavoriteDestination,
        /// Favorites stored after the write.
        stored: usize,
    },

    /// As many favorites as announced have been received.
    FavoritesReceiveComplete {
        /// Favorites stored.
        count: usize,
    },

    /// The companion asked for favorites and the count went out.
    FavoritesTransferStarted {
        /// Number of items to send.
        count: usize,
    },

    /// Every favorite item was confirmed sent.
    FavoritesTransferCompleted {
        /// Number of items sent.
        sent: usize,
    },

    /// A send failed and the favorites transfer stopped.
    FavoritesTransferFailed {
        /// Phase that failed.
        phase: TransferPhase,
    },

    /// Connection data arrived.
    ConnectionReceived {
        /// Watched route, if any.
        route: Option<SavedConnection>,
        /// The connection.
        connection: Connection,
    },

    /// The companion reported an error.
    CompanionError {
        /// Error text.
        message: String,
    },
}
