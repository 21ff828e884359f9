//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Thela Supply-Chain Ledger API",
        version = "0.1.0",
        description = "Per-vendor hash-chained supply-chain transactions: append, verify, lookup by hash, listings and entity ratings.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::supply_chain::create_transaction,
        crate::routes::supply_chain::get_transaction_by_hash,
        crate::routes::supply_chain::list_vendor_transactions,
        crate::routes::supply_chain::verify_chain,
        crate::routes::supply_chain::rate_entity,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::supply_chain::CreateTransactionRequest,
        crate::routes::supply_chain::TransactionListResponse,
        crate::routes::supply_chain::VerifyChainResponse,
        crate::routes::supply_chain::RateEntityRequest,
    )),
    tags(
        (name = "supplychain", description = "Supply-chain transaction chains"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
