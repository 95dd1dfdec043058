//! Error types for bounded collections.

use thiserror::Error;

/// A push or conversion would exceed a collection's fixed capacity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("capacity of {capacity} items exceeded")]
pub struct CapacityExceeded {
    /// Capacity of the collection.
    pub capacity: usize,
}
