//! # thela-chain: Per-Vendor Transaction Hash Chains
//!
//! Every vendor owns an append-only chain of supply-chain bills. Each record
//! stores the hash of the record before it (`previous_hash`) and a SHA-256
//! digest of its own hash-covered content (`hash`). [`TransactionChain`]
//! appends records with correct linkage and verifies a chain end to end,
//! reporting tampered records and broken links as data.
//!
//! ## Layout
//!
//! - [`record`]: the record model and its digest projection.
//! - [`validation`]: input checks run before anything is chained.
//! - [`store`]: the [`TransactionStore`] persistence trait.
//! - [`memory`]: [`MemoryStore`], the in-process store.
//! - [`verify`]: the pure verification walk.
//! - [`chain`]: [`TransactionChain`], which ties them together.
//!
//! ## Ordering
//!
//! Chain order is the explicit 0-based `sequence` assigned at append time,
//! not the upload timestamp.

pub mod chain;
pub mod error;
pub mod memory;
pub mod record;
pub mod store;
pub mod validation;
pub mod verify;

pub use chain::{RatingRequest, TransactionChain, MAX_APPEND_ATTEMPTS};
pub use error::ChainError;
pub use memory::MemoryStore;
pub use record::{
    EntityType, LineItem, NewTransaction, RecordMetadata, SupplyChainEntry, TransactionRecord,
    UploadMetadata,
};
pub use store::{
    PageRequest, StoreError, TransactionPage, TransactionStore, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
pub use validation::{FieldViolation, ValidationReport};
pub use verify::{verify_records, ChainVerification, RecordVerification, VerificationReason};
