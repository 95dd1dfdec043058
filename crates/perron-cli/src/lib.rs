//! Command-line front end for the Perron client.
//!
//! Everything the binary does lives here so it can be tested without a
//! process boundary: record management against a redb store, the startup
//! pinned-connection check, and a live favorites sync against an in-process
//! loopback companion.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod error;
pub mod loopback;
pub mod system_env;
pub mod timers;

pub use commands::{SyncOutcome, SyncReport, sync_favorites};
pub use error::CliError;
pub use loopback::LoopbackChannel;
pub use system_env::SystemEnv;
pub use timers::EnvTimers;
