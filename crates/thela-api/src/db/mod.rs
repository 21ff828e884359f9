//! # Database Persistence Layer
//!
//! PostgreSQL persistence for transaction chains via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the API stores
//! records in PostgreSQL through [`transactions::PgTransactionStore`]. When
//! absent the API runs on the in-memory store, which does not survive a
//! restart.

pub mod transactions;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppConfig;

/// Initialize the connection pool and run embedded migrations.
///
/// Returns `None` if no database URL is configured (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!(
            "DATABASE_URL not set, running with the in-memory store. \
             Transaction chains will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(2_u32.min(config.database_max_connections))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
