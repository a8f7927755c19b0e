// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raidledger - quota ledger and leaderboards for raid-run guilds.
//!
//! This is the binary entry point.

mod report;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use raidledger_config::RaidledgerConfig;
use raidledger_core::{RaidledgerError, StorageAdapter};
use raidledger_quota::QuotaService;
use raidledger_storage::SqliteStorage;

/// Raidledger - quota ledger and leaderboards for raid-run guilds.
#[derive(Parser, Debug)]
#[command(name = "raidledger", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Open the database, apply pending migrations, and report health.
    Migrate,
    /// Print all-time quota stats for a user.
    Stats { guild_id: String, user_id: String },
    /// Print the current-period leaderboard for a role.
    Leaderboard {
        guild_id: String,
        role_id: String,
        /// Role member ids to rank.
        #[arg(required = true)]
        member_ids: Vec<String>,
    },
    /// Print the current quota period of a role.
    Period { guild_id: String, role_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => raidledger_config::load_and_validate_path(path),
        None => raidledger_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            raidledger_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Migrate => report::run_migrate(&config).await,
        Commands::Stats { guild_id, user_id } => {
            report::run_stats(&config, &guild_id, &user_id).await
        }
        Commands::Leaderboard {
            guild_id,
            role_id,
            member_ids,
        } => report::run_leaderboard(&config, &guild_id, &role_id, &member_ids).await,
        Commands::Period { guild_id, role_id } => {
            report::run_period(&config, &guild_id, &role_id).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Opens SQLite (running migrations) and builds the quota service over it.
pub(crate) async fn open_service(
    config: &RaidledgerConfig,
) -> Result<(SqliteStorage, QuotaService), RaidledgerError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let quota = QuotaService::new(storage.database()?.clone(), config.quota.clone());
    Ok((storage, quota))
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("raidledger={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
