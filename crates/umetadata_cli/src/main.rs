#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

//! # umetadata
//!
//! Operator tool for the station metadata store: seed it from JSON and
//! inspect what is active at a given instant.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser, Debug)]
#[clap(name = "umetadata", version, about = "Station metadata store tooling.")]
struct Cli {
    /// Optional TOML config file.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Database file; overrides `[database] path`.
    #[clap(long, global = true)]
    database: Option<PathBuf>,

    /// Log level; overrides `[logging] level`.
    #[clap(long, global = true)]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bulk insert a JSON array of station records.
    Load {
        #[clap(long)]
        file: PathBuf,
    },

    /// Bulk insert a JSON array of channel records.
    LoadChannels {
        #[clap(long)]
        file: PathBuf,
    },

    /// Print every station active at an instant.
    Stations {
        /// Epoch seconds; defaults to now.
        #[clap(long)]
        at: Option<i64>,
    },

    /// Print one active station.
    Station {
        network: String,
        name: String,
        #[clap(long)]
        at: Option<i64>,
    },

    /// Print every channel active at an instant.
    Channels {
        #[clap(long)]
        at: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?
        .with_overrides(cli.database.clone(), cli.log_level.clone());
    init_logging(&config)?;

    let db_path = config.database.path.as_path();
    match cli.command {
        Commands::Load { file } => commands::load_stations(db_path, &file),
        Commands::LoadChannels { file } => commands::load_channels(db_path, &file),
        Commands::Stations { at } => commands::print_stations(db_path, at),
        Commands::Station { network, name, at } => {
            commands::print_station(db_path, &network, &name, at)
        }
        Commands::Channels { at } => commands::print_channels(db_path, at),
    }
}

fn init_logging(config: &CliConfig) -> Result<()> {
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(umetadata_core::default_log_level());
    match &config.logging.dir {
        Some(dir) => {
            let dir = std::path::absolute(dir)
                .with_context(|| format!("invalid log directory `{}`", dir.display()))?;
            umetadata_core::init_logging(level, &dir.to_string_lossy())
        }
        None => umetadata_core::init_stderr_logging(level),
    }
    .map_err(|err| anyhow!(err))
}
