use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use feedsub::api::{self, AppState, SqliteSessions};
use feedsub::config::Config;
use feedsub::feed::Fetcher;
use feedsub::storage::{Database, DatabaseError};

#[derive(Parser, Debug)]
#[command(name = "feedsub", about = "Feed discovery and subscription service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "feedsub.toml")]
    config: PathBuf,

    /// Listen address, overrides `bind` in the config file
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// SQLite database path, overrides `database_path` in the config file
    #[arg(long, value_name = "FILE")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let address: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.bind))?;

    let db = match Database::open(&config.database_path).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: database '{}' is locked by another process. Stop it and try again.",
                config.database_path
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let fetcher = Fetcher::new(&config.fetch_settings()).context("Failed to build HTTP client")?;
    if config.allow_private_networks {
        tracing::warn!("Private network fetches are enabled");
    }

    let sessions = Arc::new(SqliteSessions::new(db.clone()));
    let state = AppState::new(db, fetcher, sessions);

    api::run(address, state)
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}
