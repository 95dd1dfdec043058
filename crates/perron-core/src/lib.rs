//! Perron domain core.
//!
//! Everything that must survive a restart lives here: the bounded record
//! model, the [`Storage`] abstraction with its backends, the
//! [`RecordStore`] that validates what it reads back, and the single
//! [`PinnedSlot`] for the active journey.
//!
//! # Components
//!
//! - [`FixedStr`]: text with a hard byte capacity, truncated silently
//! - [`BoundedVec`]: list that rejects pushes beyond its capacity
//! - [`model`]: stations, saved routes, favorites, connections
//! - [`storage`]: raw key/value backends (memory, redb, chaotic)
//! - [`RecordStore`]: typed, clamped, corruption-tolerant record sets
//! - [`PinnedSlot`]: save/load/clear of the pinned connection
//! - [`env`]: time abstraction shared by drivers and simulation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bounded;
pub mod env;
mod error;
pub mod model;
mod pinned;
mod record_store;
pub mod storage;
mod text;

pub use bounded::BoundedVec;
pub use env::Environment;
pub use error::CapacityExceeded;
pub use model::{
    Connection, FavoriteDestination, JourneySection, MAX_FAVORITE_DESTINATIONS,
    MAX_FAVORITE_STATIONS, MAX_NEARBY_STATIONS, MAX_SAVED_CONNECTIONS, MAX_SECTIONS,
    PinnedConnection, SavedConnection, Station,
};
pub use pinned::PinnedSlot;
pub use record_store::RecordStore;
pub use storage::{ChaoticStorage, MemoryStorage, RecordKey, RedbStorage, Storage, StorageError};
pub use text::{FavoriteLabel, FixedStr, Platform, StationId, StationName, TrainType};
