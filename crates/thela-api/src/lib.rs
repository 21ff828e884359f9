//! # thela-api: HTTP Service for the Thela Ledger
//!
//! Exposes [`thela_chain::TransactionChain`] over HTTP. Storage is
//! PostgreSQL when `DATABASE_URL` is set and the in-memory store otherwise.
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/v1/supplychain/*` | [`routes::supply_chain`] | Transaction chains |
//! | `/health/*` | this module | Liveness / readiness probes |
//! | `/openapi.json` | [`openapi`] | OpenAPI 3.1 document |
//!
//! Every request passes through `tower-http`'s `TraceLayer`.

pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::supply_chain::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the router is serving.
async fn readiness() -> &'static str {
    "ready"
}
