//! # Transaction Chain
//!
//! [`TransactionChain`] owns the "current tail" decision for every vendor.
//!
//! ## Append serialization
//!
//! Two appends for the same vendor must never read the same tail. Within a
//! process, each vendor has an async mutex held from tail read to insert.
//! Across processes sharing one store, the store's conditional insert
//! rejects a record whose predecessor is no longer the tail; the chain then
//! re-reads and retries a bounded number of times.
//!
//! Different vendors never share a lock. A vendor's lock is dropped from
//! the table once no append holds or awaits it, so the table stays as large
//! as the number of vendors with appends in flight.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thela_core::{Timestamp, VendorId, GENESIS_HASH};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ChainError;
use crate::record::{EntityType, NewTransaction, TransactionRecord};
use crate::store::{PageRequest, StoreError, TransactionPage, TransactionStore};
use crate::validation::{validate_new_transaction, validate_rating};
use crate::verify::{verify_records, ChainVerification};

/// Attempts made by `append` before giving up on a moving tail.
pub const MAX_APPEND_ATTEMPTS: u32 = 3;

/// Rate one participant of a stored transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub transaction_id: Uuid,
    pub entity_type: EntityType,
    pub entity_name: String,
    /// 1..=5.
    pub rating: u8,
}

/// Per-vendor append-only chains over a [`TransactionStore`].
pub struct TransactionChain {
    store: Arc<dyn TransactionStore>,
    locks: DashMap<VendorId, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for TransactionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionChain")
            .field("vendor_locks", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl TransactionChain {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    fn vendor_lock(&self, vendor_id: VendorId) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(vendor_id).or_default())
    }

    /// Validate `tx`, link it to the vendor's tail, seal it and store it.
    pub async fn append(
        &self,
        vendor_id: VendorId,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, ChainError> {
        validate_new_transaction(&tx)?;

        let lock = self.vendor_lock(vendor_id);
        let result = {
            let _guard = lock.lock().await;
            self.link_and_insert(vendor_id, &tx).await
        };
        drop(lock);
        // Only this table holds the lock now: no append is queued on it.
        self.locks
            .remove_if(&vendor_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Read the tail, seal a successor and insert it, re-reading when the
    /// store reports that the tail moved. Caller holds the vendor lock.
    async fn link_and_insert(
        &self,
        vendor_id: VendorId,
        tx: &NewTransaction,
    ) -> Result<TransactionRecord, ChainError> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let (previous_hash, sequence) = match self.store.find_tail_by_vendor(&vendor_id).await? {
                Some(tail) => (tail.hash, tail.sequence + 1),
                None => (GENESIS_HASH.to_string(), 0),
            };
            let record =
                TransactionRecord::draft(vendor_id, sequence, previous_hash, Timestamp::now(), tx.clone())
                    .seal()?;

            match self.store.insert_if_tail(record).await {
                Ok(stored) => {
                    tracing::info!(
                        vendor_id = %vendor_id,
                        sequence = stored.sequence,
                        hash = %stored.hash,
                        bill_number = %stored.bill_number,
                        "transaction appended"
                    );
                    return Ok(stored);
                }
                Err(StoreError::TailMoved { expected, actual, .. }) => {
                    tracing::warn!(
                        vendor_id = %vendor_id,
                        attempt,
                        expected = %expected,
                        actual = %actual,
                        "vendor tail moved during append, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ChainError::Conflict {
            vendor_id,
            attempts: MAX_APPEND_ATTEMPTS,
        })
    }

    /// Walk the vendor's chain and report per-record integrity.
    pub async fn verify(&self, vendor_id: VendorId) -> Result<ChainVerification, ChainError> {
        let records = self.store.find_all_by_vendor(&vendor_id).await?;
        let verification = verify_records(&records);
        if !verification.chain_valid {
            tracing::warn!(
                vendor_id = %vendor_id,
                total = verification.total_transactions,
                invalid = verification.failures().count(),
                "vendor chain failed verification"
            );
        }
        Ok(verification)
    }

    pub async fn find_by_hash(&self, hash: &str) -> Result<Option<TransactionRecord>, ChainError> {
        Ok(self.store.find_by_hash(hash).await?)
    }

    /// A page of the vendor's records, newest bill first.
    pub async fn list(
        &self,
        vendor_id: VendorId,
        page: PageRequest,
    ) -> Result<TransactionPage, ChainError> {
        let (items, total) = self.store.list_by_vendor(&vendor_id, page).await?;
        Ok(TransactionPage::new(items, page, total))
    }

    /// Set the rating of the first hop matching `entity_type` and
    /// `entity_name`. The record's hash is unchanged.
    pub async fn rate_entity(&self, req: RatingRequest) -> Result<TransactionRecord, ChainError> {
        validate_rating(req.rating)?;

        let record = self
            .store
            .find_by_id(req.transaction_id)
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("transaction {}", req.transaction_id)))?;

        let index = record
            .supply_chain
            .iter()
            .position(|e| e.entity_type == req.entity_type && e.entity_name == req.entity_name)
            .ok_or_else(|| {
                ChainError::NotFound(format!(
                    "{} '{}' in transaction {}",
                    req.entity_type, req.entity_name, req.transaction_id
                ))
            })?;

        let updated = self
            .store
            .update_rating(req.transaction_id, index, req.rating)
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("transaction {}", req.transaction_id)))?;

        tracing::info!(
            transaction_id = %req.transaction_id,
            entity_type = %req.entity_type,
            rating = req.rating,
            "supply-chain entity rated"
        );
        Ok(updated)
    }
}
