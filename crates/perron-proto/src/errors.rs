//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding field sets.
///
/// Dispatch itself never fails: a field set that matches no known shape is
/// dropped, not reported. These errors only cover the byte-level codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// CBOR serialization failed.
    #[error("failed to encode field set: {0}")]
    Encode(String),

    /// Bytes are not a valid CBOR field set.
    #[error("failed to decode field set: {0}")]
    Decode(String),

    /// Encoded message does not fit the transport buffer.
    #[error("message of {size} bytes exceeds buffer capacity of {capacity} bytes")]
    MessageTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Buffer capacity in bytes.
        capacity: usize,
    },
}
