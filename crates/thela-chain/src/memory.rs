//! # In-Memory Store
//!
//! Process-local [`TransactionStore`] used when no database is configured
//! and in tests.
//!
//! All operations are synchronous under a `parking_lot::RwLock`; the lock is
//! never held across an `.await`. The conditional insert runs entirely under
//! one write lock, so the tail check and the push cannot interleave with
//! another writer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thela_core::{VendorId, GENESIS_HASH};
use uuid::Uuid;

use crate::record::TransactionRecord;
use crate::store::{PageRequest, StoreError, TransactionStore};

#[derive(Debug, Default)]
struct Inner {
    /// Per-vendor records in ascending `sequence`.
    chains: HashMap<VendorId, Vec<TransactionRecord>>,
    /// hash -> (vendor, index into chain).
    by_hash: HashMap<String, (VendorId, usize)>,
    /// id -> (vendor, index into chain).
    by_id: HashMap<Uuid, (VendorId, usize)>,
}

impl Inner {
    fn locate(&self, at: (VendorId, usize)) -> Option<&TransactionRecord> {
        self.chains.get(&at.0).and_then(|chain| chain.get(at.1))
    }
}

/// Thread-safe, cloneable in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all vendors.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutate a stored record in place, bypassing every chain rule.
    ///
    /// The hash index is not updated, so lookups by the original hash still
    /// resolve. Exists to simulate out-of-band edits to the backing store.
    pub fn mutate_unchecked(&self, id: Uuid, f: impl FnOnce(&mut TransactionRecord)) -> bool {
        let mut guard = self.inner.write();
        let Some(&(vendor, index)) = guard.by_id.get(&id) else {
            return false;
        };
        match guard.chains.get_mut(&vendor).and_then(|c| c.get_mut(index)) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_tail_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .chains
            .get(vendor_id)
            .and_then(|chain| chain.last().cloned()))
    }

    async fn insert_if_tail(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, StoreError> {
        let mut guard = self.inner.write();
        let chain = guard.chains.entry(record.vendor_id).or_default();

        let (tail_hash, len) = match chain.last() {
            Some(tail) => (tail.hash.clone(), chain.len()),
            None => (GENESIS_HASH.to_string(), 0),
        };
        if tail_hash != record.previous_hash || len as u64 != record.sequence {
            return Err(StoreError::TailMoved {
                vendor_id: record.vendor_id,
                expected: record.previous_hash,
                actual: tail_hash,
            });
        }

        let vendor = record.vendor_id;
        let hash = record.hash.clone();
        let id = record.id;
        chain.push(record.clone());
        guard.by_hash.insert(hash, (vendor, len));
        guard.by_id.insert(id, (vendor, len));
        Ok(record)
    }

    async fn find_all_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .chains
            .get(vendor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let guard = self.inner.read();
        Ok(guard
            .by_hash
            .get(hash)
            .and_then(|&at| guard.locate(at))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        let guard = self.inner.read();
        Ok(guard.by_id.get(&id).and_then(|&at| guard.locate(at)).cloned())
    }

    async fn list_by_vendor(
        &self,
        vendor_id: &VendorId,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError> {
        let guard = self.inner.read();
        let Some(chain) = guard.chains.get(vendor_id) else {
            return Ok((Vec::new(), 0));
        };
        let mut ordered: Vec<&TransactionRecord> = chain.iter().collect();
        ordered.sort_by(|a, b| {
            b.bill_date
                .cmp(&a.bill_date)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = ordered
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((items, chain.len() as u64))
    }

    async fn update_rating(
        &self,
        id: Uuid,
        entry_index: usize,
        rating: u8,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let mut guard = self.inner.write();
        let Some(&(vendor, index)) = guard.by_id.get(&id) else {
            return Ok(None);
        };
        let Some(record) = guard.chains.get_mut(&vendor).and_then(|c| c.get_mut(index)) else {
            return Ok(None);
        };
        let Some(entry) = record.supply_chain.get_mut(entry_index) else {
            return Ok(None);
        };
        entry.rating = Some(rating);
        Ok(Some(record.clone()))
    }
}
