//! # thela-api: Binary Entry Point
//!
//! Reads configuration from the environment, initializes logging and
//! storage, and serves the API.

use std::sync::Arc;

use anyhow::Context;
use thela_api::db::transactions::PgTransactionStore;
use thela_api::state::{AppConfig, AppState, LogFormat};
use thela_chain::{MemoryStore, TransactionStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(?config, "starting thela-api");

    let store: Arc<dyn TransactionStore> = match thela_api::db::init_pool(&config)
        .await
        .context("database initialization failed")?
    {
        Some(pool) => Arc::new(PgTransactionStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    let port = config.port;
    let app = thela_api::app(AppState::with_store(config, store));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Thela API listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
