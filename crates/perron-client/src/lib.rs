//! Client
//!
//! Action-based client state machine for the Perron companion protocol.
//! Looks up nearby stations, watches connections for a saved route,
//! receives and sends the favorites list, and manages the pinned journey.
//!
//! # Architecture
//!
//! The [`Client`] is sans-IO. It receives [`ClientEvent`]s (inbound field
//! sets, send confirmations, timer expiries, user intents), updates its
//! state, and returns [`ClientAction`]s for the caller to execute: send a
//! message, arm or cancel a timer, or deliver a [`DomainEvent`] to the UI.
//! The [`Runtime`] is the caller used in practice: it executes actions
//! against a [`MessageChannel`] and a [`TimerService`], feeding follow-up
//! events through a work queue instead of recursing.
//!
//! # Components
//!
//! - [`Client`]: top-level state machine
//! - [`Dispatcher`]: nearby stations and favorites receive session
//! - [`FavoritesTransfer`]: paced, one-at-a-time favorites send
//! - [`ConnectionView`]: state of the watched route
//! - [`Runtime`]: synchronous action executor

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod client;
mod config;
mod dispatch;
mod error;
mod event;
mod runtime;
mod timer;
mod transfer;
mod view;

pub use channel::{ChannelEvent, MessageChannel, OutboxHandle};
pub use client::Client;
pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use error::{ChannelError, ClientError, TransferError};
pub use event::{ClientAction, ClientEvent, DomainEvent, SendOrigin};
pub use runtime::Runtime;
pub use timer::{TimerId, TimerService};
pub use transfer::{FavoritesTransfer, SentOutcome, TransferPhase};
pub use view::ConnectionView;
