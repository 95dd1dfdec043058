//! Perron wire protocol.
//!
//! Messages exchanged with the companion application are flat maps from a
//! numeric [`Tag`] to a typed [`Value`], carried as a [`FieldSet`] and encoded
//! as CBOR. There is no message type field: the kind of an inbound message is
//! decided by which tags it carries, using the ordered [`DISPATCH_TABLE`].
//!
//! This crate holds no domain state. Interpreting messages (station lists,
//! favorites sessions, connection views) is the job of `perron-client`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
mod field_set;
mod message;
mod tag;
mod value;

pub use errors::{ProtocolError, Result};
pub use field_set::FieldSet;
pub use message::{
    ConnectionData, DISPATCH_TABLE, DispatchRule, InboundMessage, MessageKind, OutboundMessage,
    classify,
};
pub use tag::Tag;
pub use value::Value;

/// Default inbox and outbox capacity in bytes.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 512;
