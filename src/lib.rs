pub mod cli;
pub mod client;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::deadline::CLIENT_DEADLINE;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for reading stored quotes in `history`.
const HISTORY_DEADLINE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Serve,
    Fetch,
    History { limit: u32 },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        AppCommand::Serve => {
            let fetcher = providers::AwesomeApiFetcher::new(&config.server.upstream_url)?;
            let store = store::SqliteQuoteStore::new(&config.server.database_path);
            let service = server::QuoteService::new(Arc::new(fetcher), Arc::new(store));

            let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
                .await
                .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
            server::serve(listener, server::router(Arc::new(service))).await
        }
        AppCommand::Fetch => {
            info!("Requesting quote from {}", config.client.service_url);
            let fetcher = providers::ServiceFetcher::new(&config.client.service_url)?;
            client::run(
                &fetcher,
                Path::new(&config.client.output_path),
                CLIENT_DEADLINE,
            )
            .await;
            Ok(())
        }
        AppCommand::History { limit } => {
            let store = store::SqliteQuoteStore::new(&config.server.database_path);
            let quotes = store
                .history(limit, HISTORY_DEADLINE)
                .await
                .with_context(|| {
                    format!("Failed to read quotes from {}", store.path().display())
                })?;
            println!("{}", cli::history::display_history(&quotes));
            Ok(())
        }
    }
}
