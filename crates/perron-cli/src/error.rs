//! Binary error type.

use perron_client::{ChannelError, ClientError};
use perron_core::StorageError;
use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Error, Debug)]
pub enum CliError {
    /// Store backend failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Client operation failed.
    #[error("client: {0}")]
    Client(#[from] ClientError),

    /// Channel could not be opened.
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    /// Writing output failed.
    #[error("output: {0}")]
    Io(#[from] std::io::Error),

    /// No record at the given position.
    #[error("no {kind} at index {index}")]
    NoSuchIndex {
        /// Record kind.
        kind: &'static str,
        /// Requested index.
        index: usize,
    },

    /// The list is already at capacity.
    #[error("{kind} list is full ({capacity} entries)")]
    ListFull {
        /// Record kind.
        kind: &'static str,
        /// List capacity.
        capacity: usize,
    },

    /// Sync stopped making progress: nothing in flight, no timer armed and
    /// no terminal event.
    #[error("favorites sync stalled")]
    Stalled,
}
