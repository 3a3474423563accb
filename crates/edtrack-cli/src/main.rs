use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use edtrack_lib::{EdsmClient, FlightAnalytics, RegistryStore, DEFAULT_IDLE_THRESHOLD_SECS};

mod commands;

use commands::commander::InventoryArg;
use commands::poi::PoiCommand;

#[derive(Parser, Debug)]
#[command(author, version, about = "EDSM commander registry and travel analytics")]
struct Cli {
    /// Override the registry data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a chat identity as a commander, optionally with an EDSM API key.
    Register {
        /// Chat identity to bind (a user id or handle).
        identity: String,
        /// Commander name to bind it to.
        commander: String,
        /// EDSM API key, needed for commanders with private profiles.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Report where a commander currently is.
    #[command(visible_alias = "location")]
    Locate {
        /// Chat identity or commander name.
        name: String,
    },
    /// Manage points of interest.
    #[command(subcommand)]
    Poi(PoiCommand),
    /// Distance between two commanders, POIs or systems.
    Distance {
        from: String,
        to: String,
    },
    /// Detailed information on a system or POI.
    #[command(visible_alias = "system")]
    Info {
        name: String,
    },
    /// Systems within a radius of a commander, POI or system.
    Radius {
        name: String,
        /// Outer radius in light years.
        radius: f64,
        /// Inner radius in light years.
        #[arg(default_value_t = 0.0)]
        min_radius: f64,
    },
    /// Jumps per hour over a commander's recent play sessions.
    JumpRate {
        name: String,
        /// Gap in seconds beyond which jumps count as separate sessions.
        #[arg(long, default_value_t = DEFAULT_IDLE_THRESHOLD_SECS)]
        idle_threshold: i64,
    },
    /// Average jump distance over a commander's recent route.
    AvgJump {
        name: String,
    },
    /// Estimated jumps and flying time to a target system.
    Eta {
        name: String,
        target: String,
    },
    /// Recent route of a commander as a coordinate series.
    Route {
        name: String,
    },
    /// Credit balance of a commander.
    Balance {
        name: String,
    },
    /// Ranks of a commander.
    Ranks {
        name: String,
    },
    /// One of a commander's inventories.
    Materials {
        name: String,
        /// Inventory to show.
        #[arg(long, value_enum, default_value = "materials")]
        kind: InventoryArg,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut registry = open_registry(cli.data_dir)?;
    let client = EdsmClient::new().context("failed to build the EDSM client")?;
    let analytics = FlightAnalytics::new();

    match cli.command {
        Command::Register {
            identity,
            commander,
            api_key,
        } => commands::register::run(&mut registry, &identity, &commander, api_key),
        Command::Locate { name } => commands::locate::run(&registry, &client, &name),
        Command::Poi(command) => commands::poi::run(&mut registry, &client, command),
        Command::Distance { from, to } => commands::distance::run(&registry, &client, &from, &to),
        Command::Info { name } => commands::info::run(&registry, &client, &name),
        Command::Radius {
            name,
            radius,
            min_radius,
        } => commands::radius::run(&registry, &client, &name, radius, min_radius),
        Command::JumpRate {
            name,
            idle_threshold,
        } => commands::travel::jump_rate(&registry, &client, &analytics, &name, idle_threshold),
        Command::AvgJump { name } => {
            commands::travel::average_jump(&registry, &client, &analytics, &name)
        }
        Command::Eta { name, target } => {
            commands::travel::eta(&registry, &client, &analytics, &name, &target)
        }
        Command::Route { name } => commands::travel::route(&registry, &client, &analytics, &name),
        Command::Balance { name } => commands::commander::balance(&registry, &client, &name),
        Command::Ranks { name } => commands::commander::ranks(&registry, &client, &name),
        Command::Materials { name, kind } => {
            commands::commander::materials(&registry, &client, &name, kind)
        }
    }
}

fn open_registry(data_dir: Option<PathBuf>) -> Result<RegistryStore> {
    let store = match data_dir {
        Some(dir) => RegistryStore::open(dir),
        None => RegistryStore::open_default(),
    };
    store.context("failed to open the registry store")
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
