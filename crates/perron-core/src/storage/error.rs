//! Storage error types.

use thiserror::Error;

/// Errors raised by storage backends and record encoding.
///
/// Corrupted record contents are not an error: the record store treats them
/// as absent. These variants cover failures to reach or write the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend I/O failed (database open, transaction, table access).
    #[error("storage I/O error: {0}")]
    Io(String),

    /// A record could not be encoded for writing.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Returns true if the operation may succeed on retry.
    ///
    /// I/O failures can be transient (lock contention, injected faults).
    /// Encoding failures are deterministic and never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_transient() {
        assert!(StorageError::Io("database locked".into()).is_transient());
        assert!(!StorageError::Serialization("bad value".into()).is_transient());
    }
}
