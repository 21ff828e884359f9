//! # Supply-Chain Transaction API
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/v1/supplychain/transactions` | `create_transaction` |
//! | `GET` | `/v1/supplychain/transactions/{hash}` | `get_transaction_by_hash` |
//! | `GET` | `/v1/supplychain/vendors/{vendor_id}/transactions` | `list_vendor_transactions` |
//! | `GET` | `/v1/supplychain/vendors/{vendor_id}/verify` | `verify_chain` |
//! | `POST` | `/v1/supplychain/rate` | `rate_entity` |
//!
//! Verification always answers 200: a broken or tampered chain is reported
//! in the body with `chain_valid: false`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thela_chain::{
    EntityType, NewTransaction, PageRequest, RatingRequest, RecordVerification, TransactionRecord,
};
use thela_core::{is_sha256_hex, VendorId};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, parse_vendor_id};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request to append a bill to a vendor's chain.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub vendor_id: Uuid,
    /// Bill number, date, supply-chain hops, line items, total and metadata.
    /// Amounts are integer paise; quantities are integer thousandths of
    /// the unit.
    #[schema(value_type = Object)]
    pub transaction: NewTransaction,
}

/// Pagination query for vendor listings.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size, 1..=100 (default 10).
    pub limit: Option<u32>,
}

/// One page of a vendor's transactions, newest bill first.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<TransactionRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// Integrity report for one vendor chain.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyChainResponse {
    pub vendor_id: Uuid,
    pub chain_valid: bool,
    pub total_transactions: usize,
    /// Per-record results in chain order.
    #[schema(value_type = Vec<Object>)]
    pub verification_results: Vec<RecordVerification>,
}

/// Request to rate a participant of a stored transaction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RateEntityRequest {
    pub transaction_id: Uuid,
    /// "farmer", "mandi", "middleman" or "vendor".
    #[schema(value_type = String)]
    pub entity_type: EntityType,
    pub entity_name: String,
    /// 1..=5.
    pub rating: u8,
}

impl From<RateEntityRequest> for RatingRequest {
    fn from(req: RateEntityRequest) -> Self {
        Self {
            transaction_id: req.transaction_id,
            entity_type: req.entity_type,
            entity_name: req.entity_name,
            rating: req.rating,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/supplychain/transactions", post(create_transaction))
        .route(
            "/v1/supplychain/transactions/{hash}",
            get(get_transaction_by_hash),
        )
        .route(
            "/v1/supplychain/vendors/{vendor_id}/transactions",
            get(list_vendor_transactions),
        )
        .route(
            "/v1/supplychain/vendors/{vendor_id}/verify",
            get(verify_chain),
        )
        .route("/v1/supplychain/rate", post(rate_entity))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/supplychain/transactions: Append a bill to the vendor's chain.
#[utoipa::path(
    post,
    path = "/v1/supplychain/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction chained", body = serde_json::Value),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 409, description = "Vendor chain kept moving", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "supplychain"
)]
pub(crate) async fn create_transaction(
    State(state): State<AppState>,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionRecord>), AppError> {
    let req = extract_json(body)?;
    let record = state
        .chain
        .append(VendorId::from_uuid(req.vendor_id), req.transaction)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/supplychain/transactions/{hash}: Look up a record by its hash.
#[utoipa::path(
    get,
    path = "/v1/supplychain/transactions/{hash}",
    params(("hash" = String, Path, description = "64-character hex record hash")),
    responses(
        (status = 200, description = "Transaction found", body = serde_json::Value),
        (status = 404, description = "No transaction with this hash", body = crate::error::ErrorBody),
    ),
    tag = "supplychain"
)]
pub(crate) async fn get_transaction_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<TransactionRecord>, AppError> {
    if !is_sha256_hex(&hash) {
        return Err(AppError::NotFound(format!("transaction {hash}")));
    }
    state
        .chain
        .find_by_hash(&hash)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("transaction {hash}")))
}

/// GET /v1/supplychain/vendors/{vendor_id}/transactions: Paginated listing.
#[utoipa::path(
    get,
    path = "/v1/supplychain/vendors/{vendor_id}/transactions",
    params(
        ("vendor_id" = Uuid, Path, description = "Vendor ID"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of transactions", body = TransactionListResponse),
        (status = 400, description = "Malformed vendor ID or query", body = crate::error::ErrorBody),
    ),
    tag = "supplychain"
)]
pub(crate) async fn list_vendor_transactions(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let vendor_id = parse_vendor_id(&vendor_id)?;
    let query = extract_query(query)?;
    let page = state
        .chain
        .list(vendor_id, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(Json(TransactionListResponse {
        transactions: page.items,
        page: page.page,
        limit: page.limit,
        total: page.total,
        pages: page.pages,
    }))
}

/// GET /v1/supplychain/vendors/{vendor_id}/verify: Verify the vendor's chain.
#[utoipa::path(
    get,
    path = "/v1/supplychain/vendors/{vendor_id}/verify",
    params(("vendor_id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Verification report, valid or not", body = VerifyChainResponse),
        (status = 400, description = "Malformed vendor ID", body = crate::error::ErrorBody),
    ),
    tag = "supplychain"
)]
pub(crate) async fn verify_chain(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> Result<Json<VerifyChainResponse>, AppError> {
    let vendor_id = parse_vendor_id(&vendor_id)?;
    let report = state.chain.verify(vendor_id).await?;
    Ok(Json(VerifyChainResponse {
        vendor_id: *vendor_id.as_uuid(),
        chain_valid: report.chain_valid,
        total_transactions: report.total_transactions,
        verification_results: report.verification_results,
    }))
}

/// POST /v1/supplychain/rate: Rate one participant of a transaction.
#[utoipa::path(
    post,
    path = "/v1/supplychain/rate",
    request_body = RateEntityRequest,
    responses(
        (status = 200, description = "Rating recorded", body = serde_json::Value),
        (status = 404, description = "Transaction or entity not found", body = crate::error::ErrorBody),
        (status = 422, description = "Rating out of range", body = crate::error::ErrorBody),
    ),
    tag = "supplychain"
)]
pub(crate) async fn rate_entity(
    State(state): State<AppState>,
    body: Result<Json<RateEntityRequest>, JsonRejection>,
) -> Result<Json<TransactionRecord>, AppError> {
    let req = extract_json(body)?;
    let record = state.chain.rate_entity(req.into()).await?;
    Ok(Json(record))
}
