//! # Persistence Collaborator
//!
//! [`TransactionStore`] is everything the chain needs from storage. Two
//! implementations exist: [`crate::MemoryStore`] here, and a PostgreSQL
//! store in `thela-api`.
//!
//! ## Append contract
//!
//! `insert_if_tail` is a compare-and-swap on the vendor's tail. The record
//! carries its expected predecessor in `previous_hash` (the genesis
//! sentinel for an empty chain) and its expected position in `sequence`.
//! If either no longer matches the stored tail the store must refuse with
//! [`StoreError::TailMoved`] and write nothing. Together with the
//! per-vendor lock in [`crate::TransactionChain`] this guarantees no two
//! records ever share a predecessor.

use async_trait::async_trait;
use thela_core::VendorId;
use thiserror::Error;
use uuid::Uuid;

use crate::record::TransactionRecord;

/// Errors surfaced by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The vendor's tail changed between read and insert.
    #[error("tail moved for vendor {vendor_id}: expected {expected}, found {actual}")]
    TailMoved {
        vendor_id: VendorId,
        expected: String,
        actual: String,
    },

    /// Backend failure (connection, query, decoding).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Default page size for vendor listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp to `page >= 1` and `1 <= limit <= MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a vendor's records, newest bill first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TransactionPage {
    pub items: Vec<TransactionRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl TransactionPage {
    pub fn new(items: Vec<TransactionRecord>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

/// Record storage keyed by vendor.
#[async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// The vendor's last record in chain order, if any.
    async fn find_tail_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// Insert `record` only if the vendor's current tail hash equals
    /// `record.previous_hash` and its length equals `record.sequence`.
    async fn insert_if_tail(&self, record: TransactionRecord)
        -> Result<TransactionRecord, StoreError>;

    /// All of the vendor's records in ascending `sequence`.
    async fn find_all_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TransactionRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError>;

    /// A page of the vendor's records ordered by `bill_date` descending,
    /// ties broken by `sequence` descending, plus the vendor's total count.
    async fn list_by_vendor(
        &self,
        vendor_id: &VendorId,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError>;

    /// Set the rating of one supply-chain hop. Touches nothing else.
    /// Returns the updated record, or `None` if the record or index is absent.
    async fn update_rating(
        &self,
        id: Uuid,
        entry_index: usize,
        rating: u8,
    ) -> Result<Option<TransactionRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn page_count_rounds_up() {
        let req = PageRequest::new(Some(1), Some(10));
        assert_eq!(TransactionPage::new(vec![], req, 0).pages, 0);
        assert_eq!(TransactionPage::new(vec![], req, 10).pages, 1);
        assert_eq!(TransactionPage::new(vec![], req, 11).pages, 2);
    }
}
