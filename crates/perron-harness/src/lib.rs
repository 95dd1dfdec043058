//! Deterministic simulation harness for the Perron client.
//!
//! Virtual-time implementations of the host seams ([`Environment`],
//! [`MessageChannel`], [`TimerService`]) so the production [`Runtime`] runs
//! unchanged in tests. Nothing here sleeps: time moves only when the driver
//! advances the [`SimEnv`] clock to the next timer deadline.
//!
//! [`Environment`]: perron_core::Environment
//! [`MessageChannel`]: perron_client::MessageChannel
//! [`TimerService`]: perron_client::TimerService
//! [`Runtime`]: perron_client::Runtime

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod companion;
pub mod sim_channel;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_timers;

pub use companion::MockCompanion;
pub use sim_channel::{Delivery, SendAttempt, SimChannel};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_timers::SimTimers;
