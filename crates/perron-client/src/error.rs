//! Client error types.

use perron_core::StorageError;
use perron_proto::ProtocolError;
use thiserror::Error;

use crate::TransferPhase;

/// Errors that abort handling of a single client event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Reading or writing persisted records failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Returns true if retrying the event may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
        }
    }
}

/// Transport failures, mirroring the host channel's result codes.
///
/// None of these are fatal. The affected message is lost; nothing retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A send is already in flight.
    #[error("channel busy: a send is already in flight")]
    Busy,

    /// The previous operation has not completed.
    #[error("operation pending")]
    Pending,

    /// The message does not fit the buffer.
    #[error("buffer overflow: {size} bytes exceeds capacity of {capacity} bytes")]
    BufferOverflow {
        /// Encoded size in bytes.
        size: usize,
        /// Buffer capacity in bytes.
        capacity: usize,
    },

    /// The companion is not connected.
    #[error("companion not connected")]
    NotConnected,

    /// The channel was closed.
    #[error("channel closed")]
    Closed,

    /// The channel was used before `open`.
    #[error("channel not open")]
    NotOpen,

    /// `open` was called twice.
    #[error("channel already open")]
    AlreadyOpen,

    /// Bytes could not be decoded as a field set.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Host-internal failure.
    #[error("internal channel error: {0}")]
    Internal(String),
}

impl ChannelError {
    /// Returns true if the same send may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy | Self::Pending | Self::NotConnected)
    }
}

impl From<ProtocolError> for ChannelError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MessageTooLarge { size, capacity } => {
                Self::BufferOverflow { size, capacity }
            },
            ProtocolError::Encode(reason) => Self::Internal(reason),
            ProtocolError::Decode(reason) => Self::Malformed(reason),
        }
    }
}

/// Rejected favorites transfer trigger.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferError {
    /// A transfer is already running.
    #[error("favorites transfer already in progress ({phase:?})")]
    InProgress {
        /// Phase of the running transfer.
        phase: TransferPhase,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_encode_maps_to_buffer_overflow() {
        let err = ChannelError::from(ProtocolError::MessageTooLarge { size: 600, capacity: 512 });
        assert_eq!(err, ChannelError::BufferOverflow { size: 600, capacity: 512 });
        assert!(!err.is_transient());
    }

    #[test]
    fn busy_is_transient() {
        assert!(ChannelError::Busy.is_transient());
        assert!(!ChannelError::Closed.is_transient());
        assert!(ClientError::Storage(StorageError::Io("locked".into())).is_transient());
    }
}
