//! Errors returned by [`crate::TransactionChain`].
//!
//! Chain invalidity is not an error: `verify` reports it as data in
//! [`crate::ChainVerification`].

use thela_core::{CanonicalizationError, VendorId};
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationReport;

#[derive(Error, Debug)]
pub enum ChainError {
    /// Malformed or out-of-range input. Never retried.
    #[error("invalid transaction: {0}")]
    Validation(ValidationReport),

    /// A referenced record or supply-chain hop does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Another writer kept moving the vendor's tail.
    #[error("append conflict for vendor {vendor_id} after {attempts} attempts")]
    Conflict { vendor_id: VendorId, attempts: u32 },

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationReport> for ChainError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}
