//! Favorites transfer state machine.
//!
//! Sends the stored favorites to the companion one message at a time: first
//! the count, then each item, each only after the previous send was
//! confirmed and the pacing delay has passed.
//!
//! ```text
//! Idle -> SendingCount -> SendingItem(0) -> .. -> SendingItem(n-1) -> Idle
//!              |                |                      |
//!              +--- failure ----+------ failure -------+--> Idle
//! ```
//!
//! # Invariants
//!
//! - At most one operation is pending: either a send awaiting confirmation
//!   or one armed timer. Confirmations and timers that do not match the
//!   pending operation are ignored.
//! - A failure never retries. The transfer returns to `Idle`.
//! - Items are sent in stored order, each exactly once.

use perron_core::FavoriteDestination;
use perron_proto::OutboundMessage;
use tracing::{debug, info, warn};

use crate::{TimerId, TransferError};

/// Observable phase of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// No transfer running.
    Idle,
    /// Count message sent or about to be followed by item 0.
    SendingCount,
    /// Item at the index sent or about to be followed by the next.
    SendingItem(usize),
}

/// The single pending operation of a running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    AwaitingSend,
    Timer(TimerId),
}

/// Result of a send confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentOutcome {
    /// Arm this timer for the pacing delay; the next item follows when it
    /// fires.
    Schedule(TimerId),
    /// All items were sent. The transfer is idle again.
    Completed {
        /// Number of items sent.
        sent: usize,
    },
    /// No send was pending; the confirmation is not ours.
    Ignored,
}

/// Paced, one-at-a-time favorites sender.
#[derive(Debug, Default)]
pub struct FavoritesTransfer {
    favorites: Vec<FavoriteDestination>,
    phase: Option<TransferPhase>,
    pending: Option<Pending>,
}

impl FavoritesTransfer {
    /// Idle transfer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> TransferPhase {
        self.phase.unwrap_or(TransferPhase::Idle)
    }

    /// Whether a transfer is running.
    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// Timer currently armed by the transfer, if any.
    pub fn armed_timer(&self) -> Option<TimerId> {
        match self.pending {
            Some(Pending::Timer(id)) => Some(id),
            _ => None,
        }
    }

    /// Start sending `favorites`. Returns the count message to send.
    ///
    /// # Errors
    ///
    /// [`TransferError::InProgress`] if a transfer is already running. The
    /// running transfer is not affected.
    pub fn start(
        &mut self,
        favorites: Vec<FavoriteDestination>,
    ) -> Result<OutboundMessage, TransferError> {
        if let Some(phase) = self.phase {
            return Err(TransferError::InProgress { phase });
        }

        let count = favorites.len();
        self.favorites = favorites;
        self.phase = Some(TransferPhase::SendingCount);
        self.pending = Some(Pending::AwaitingSend);

        info!(count, "favorites transfer started");
        Ok(OutboundMessage::FavoritesCount { count: count as u32 })
    }

    /// The pending send was confirmed.
    ///
    /// `next_timer` is armed if another item follows; otherwise it is unused.
    pub fn on_sent(&mut self, next_timer: TimerId) -> SentOutcome {
        if self.pending != Some(Pending::AwaitingSend) {
            return SentOutcome::Ignored;
        }

        let has_next = match self.phase() {
            TransferPhase::Idle => return SentOutcome::Ignored,
            TransferPhase::SendingCount => !self.favorites.is_empty(),
            TransferPhase::SendingItem(index) => index + 1 < self.favorites.len(),
        };

        if has_next {
            self.pending = Some(Pending::Timer(next_timer));
            debug!(phase = ?self.phase(), timer = %next_timer, "favorites send confirmed, pacing");
            return SentOutcome::Schedule(next_timer);
        }

        let sent = self.favorites.len();
        self.reset();
        info!(sent, "favorites transfer complete");
        SentOutcome::Completed { sent }
    }

    /// A timer fired. Returns the next item to send if `id` is the armed
    /// pacing timer; `None` for stale or foreign timers.
    pub fn on_timer(&mut self, id: TimerId) -> Option<OutboundMessage> {
        if self.pending != Some(Pending::Timer(id)) {
            return None;
        }

        let index = match self.phase() {
            TransferPhase::Idle => return None,
            TransferPhase::SendingCount => 0,
            TransferPhase::SendingItem(index) => index + 1,
        };
        let favorite = self.favorites.get(index)?;
        let message = OutboundMessage::FavoriteItem {
            id: favorite.id.to_string(),
            name: favorite.name.to_string(),
            label: favorite.label.to_string(),
        };

        self.phase = Some(TransferPhase::SendingItem(index));
        self.pending = Some(Pending::AwaitingSend);
        debug!(index, "sending favorite item");
        Some(message)
    }

    /// The pending send failed. Aborts the transfer and returns the phase
    /// that failed; `None` if no send was pending.
    pub fn on_failed(&mut self) -> Option<TransferPhase> {
        if self.pending != Some(Pending::AwaitingSend) {
            return None;
        }

        let phase = self.phase();
        self.reset();
        warn!(?phase, "favorites transfer aborted after send failure");
        Some(phase)
    }

    /// Stop unconditionally. Returns the armed timer, which the caller must
    /// cancel.
    pub fn abort(&mut self) -> Option<TimerId> {
        let timer = self.armed_timer();
        if self.is_active() {
            debug!(phase = ?self.phase(), "favorites transfer aborted");
        }
        self.reset();
        timer
    }

    fn reset(&mut self) {
        self.favorites.clear();
        self.phase = None;
        self.pending = None;
    }
}
