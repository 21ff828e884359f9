//! # Request Extraction Helpers
//!
//! Maps Axum rejections onto [`AppError`] so every failure uses the same
//! JSON error body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use thela_core::VendorId;

use crate::error::AppError;

/// Extract a JSON body.
///
/// A well-formed body with missing or mistyped fields is a validation
/// failure (422); anything unparseable is a bad request (400).
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| match err {
        JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
        other => AppError::BadRequest(other.body_text()),
    })
}

/// Extract query parameters. Any rejection is a bad request (400).
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a vendor identifier taken from the path.
pub fn parse_vendor_id(raw: &str) -> Result<VendorId, AppError> {
    Ok(VendorId::parse(raw)?)
}
