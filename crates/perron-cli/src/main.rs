//! Perron command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Show the pinned journey (clearing it if it has arrived) and stored lists
//! perron --db perron.redb status
//!
//! # Save a route and pin a journey on it
//! perron add-route 8503000 "Zuerich HB" 8507000 Bern
//! perron pin 0 --departure 1700000300 --arrival 1700004500 --platform 7 --train "IC 712"
//!
//! # Push the stored favorites to a loopback companion, failing the third send
//! perron sync-favorites --fail-send 2
//! ```

use std::{io::Write, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use perron_cli::{
    LoopbackChannel, SystemEnv,
    commands::{self, PinRequest},
    sync_favorites,
};
use perron_client::{Client, ClientConfig};
use perron_core::{Environment, FavoriteDestination, RedbStorage, SavedConnection, Station};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Perron transit client
#[derive(Parser, Debug)]
#[command(name = "perron")]
#[command(about = "Manage the Perron record store and sync favorites")]
#[command(version)]
struct Args {
    /// Path to the record database
    #[arg(long, default_value = "perron.redb")]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Delay between a favorites send confirmation and the next item
    #[arg(long, default_value = "50")]
    pacing_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the pinned journey and list stored records
    Status,

    /// Save a route
    AddRoute {
        /// Departure station id
        from_id: String,
        /// Departure station name
        from_name: String,
        /// Arrival station id
        to_id: String,
        /// Arrival station name
        to_name: String,
    },

    /// Remove the saved route at INDEX
    RemoveRoute {
        /// Position shown by `status`
        index: usize,
    },

    /// Pin a journey on the saved route at ROUTE
    Pin {
        /// Route position shown by `status`
        route: usize,
        /// Departure, epoch seconds
        #[arg(long)]
        departure: i64,
        /// Arrival, epoch seconds
        #[arg(long)]
        arrival: i64,
        /// Departure platform
        #[arg(long, default_value = "")]
        platform: String,
        /// Train category and number
        #[arg(long, default_value = "")]
        train: String,
        /// Delay in minutes
        #[arg(long, default_value = "0")]
        delay: i32,
    },

    /// Clear the pinned journey
    ClearPinned,

    /// Save a favorite destination
    AddFavorite {
        /// Station id
        id: String,
        /// Station name
        name: String,
        /// Short label such as "Home"
        label: String,
    },

    /// Save a favorite station
    AddStation {
        /// Station id
        id: String,
        /// Station name
        name: String,
    },

    /// Send the stored favorites to a loopback companion, paced
    SyncFavorites {
        /// Fail the send with this zero-based index (0 is the count)
        #[arg(long)]
        fail_send: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let env = SystemEnv::new();
    let config = ClientConfig { pacing_delay: Duration::from_millis(args.pacing_ms), ..ClientConfig::default() };
    let storage = RedbStorage::open(&args.db)?;
    tracing::debug!(db = %args.db.display(), "record store opened");

    let client = Client::new(config.clone(), storage.clone());
    let mut out = std::io::stdout().lock();
    let now = env.wall_clock_secs();

    match args.command {
        Command::Status => commands::status(&client, now, &mut out)?,
        Command::AddRoute { from_id, from_name, to_id, to_name } => {
            let route = SavedConnection::new(&from_id, &from_name, &to_id, &to_name);
            commands::add_route(&client, route, &mut out)?;
        },
        Command::RemoveRoute { index } => commands::remove_route(&client, index, &mut out)?,
        Command::Pin { route, departure, arrival, platform, train, delay } => {
            let request = PinRequest {
                route_index: route,
                departure_time: departure,
                arrival_time: arrival,
                platform,
                train_type: train,
                delay_minutes: delay,
            };
            commands::pin(&client, &request, now, &mut out)?;
        },
        Command::ClearPinned => commands::clear_pinned(&client, &mut out)?,
        Command::AddFavorite { id, name, label } => {
            commands::add_favorite(&client, FavoriteDestination::new(&id, &name, &label), &mut out)?;
        },
        Command::AddStation { id, name } => {
            commands::add_station(&client, Station::new(&id, &name, 0), &mut out)?;
        },
        Command::SyncFavorites { fail_send } => {
            let mut channel = LoopbackChannel::new(env);
            if let Some(index) = fail_send {
                channel = channel.failing_send(index);
            }
            let report = sync_favorites(env, config, storage, channel).await?;
            writeln!(out, "{report}")?;
        },
    }

    Ok(())
}
