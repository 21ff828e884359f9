//! PostgreSQL [`TransactionStore`].
//!
//! Hops, items and metadata are stored as JSONB and decoded back into the
//! chain's types on read. Timestamps are stored as `TIMESTAMPTZ`; they are
//! second-precision on the way in, so a read returns the exact values that
//! were hashed.
//!
//! `insert_if_tail` runs in one transaction: it locks the vendor's current
//! tail row with `FOR UPDATE`, checks it against the record, and inserts.
//! The first record of a vendor has no row to lock; two racing first inserts
//! are separated by the `(vendor_id, sequence)` unique constraint, and the
//! loser is reported as [`StoreError::TailMoved`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thela_chain::{PageRequest, StoreError, TransactionRecord, TransactionStore};
use thela_core::{Timestamp, VendorId, GENESIS_HASH};
use uuid::Uuid;

const COLUMNS: &str = "id, vendor_id, sequence, bill_number, bill_date, supply_chain, items, \
                       total_amount, uploaded_at, previous_hash, hash, metadata";

/// Database row for a supply-chain transaction.
#[derive(Debug, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub sequence: i64,
    pub bill_number: String,
    pub bill_date: DateTime<Utc>,
    pub supply_chain: serde_json::Value,
    pub items: serde_json::Value,
    pub total_amount: i64,
    pub uploaded_at: DateTime<Utc>,
    pub previous_hash: String,
    pub hash: String,
    pub metadata: serde_json::Value,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let decode = |column: &str, e: serde_json::Error| {
            StoreError::Backend(format!("transaction {}: bad {column} column: {e}", row.id))
        };
        Ok(TransactionRecord {
            id: row.id,
            vendor_id: VendorId::from_uuid(row.vendor_id),
            sequence: u64::try_from(row.sequence)
                .map_err(|_| StoreError::Backend(format!("transaction {}: negative sequence", row.id)))?,
            bill_number: row.bill_number.clone(),
            bill_date: Timestamp::from_utc(row.bill_date),
            supply_chain: serde_json::from_value(row.supply_chain.clone())
                .map_err(|e| decode("supply_chain", e))?,
            items: serde_json::from_value(row.items.clone()).map_err(|e| decode("items", e))?,
            total_amount: row.total_amount,
            uploaded_at: Timestamp::from_utc(row.uploaded_at),
            previous_hash: row.previous_hash.clone(),
            hash: row.hash.clone(),
            metadata: serde_json::from_value(row.metadata.clone())
                .map_err(|e| decode("metadata", e))?,
        })
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
}

fn to_i64(n: u64, what: &str) -> Result<i64, StoreError> {
    i64::try_from(n).map_err(|_| StoreError::Backend(format!("{what} {n} out of range")))
}

fn decode_all(rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>, StoreError> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}

/// Transaction chains persisted in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn find_tail_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM supply_chain_transactions
             WHERE vendor_id = $1 ORDER BY sequence DESC LIMIT 1"
        ))
        .bind(vendor_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(TransactionRecord::try_from).transpose()
    }

    async fn insert_if_tail(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let tail: Option<(String, i64)> = sqlx::query_as(
            "SELECT hash, sequence FROM supply_chain_transactions
             WHERE vendor_id = $1 ORDER BY sequence DESC LIMIT 1 FOR UPDATE",
        )
        .bind(record.vendor_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let (tail_hash, next_sequence) = match tail {
            Some((hash, sequence)) => (hash, sequence + 1),
            None => (GENESIS_HASH.to_string(), 0),
        };
        let sequence = to_i64(record.sequence, "sequence")?;
        if tail_hash != record.previous_hash || next_sequence != sequence {
            return Err(StoreError::TailMoved {
                vendor_id: record.vendor_id,
                expected: record.previous_hash,
                actual: tail_hash,
            });
        }

        let inserted = sqlx::query(&format!(
            "INSERT INTO supply_chain_transactions ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(record.id)
        .bind(record.vendor_id.as_uuid())
        .bind(sequence)
        .bind(&record.bill_number)
        .bind(record.bill_date.as_datetime())
        .bind(encode(&record.supply_chain)?)
        .bind(encode(&record.items)?)
        .bind(record.total_amount)
        .bind(record.uploaded_at.as_datetime())
        .bind(&record.previous_hash)
        .bind(&record.hash)
        .bind(encode(&record.metadata)?)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StoreError::TailMoved {
                    vendor_id: record.vendor_id,
                    expected: record.previous_hash,
                    actual: format!("concurrent insert ({})", db.constraint().unwrap_or("unique")),
                });
            }
            Err(e) => return Err(backend(e)),
        }

        tx.commit().await.map_err(backend)?;
        Ok(record)
    }

    async fn find_all_by_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM supply_chain_transactions
             WHERE vendor_id = $1 ORDER BY sequence ASC"
        ))
        .bind(vendor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        decode_all(rows)
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM supply_chain_transactions WHERE hash = $1"
        ))
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(TransactionRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM supply_chain_transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(TransactionRecord::try_from).transpose()
    }

    async fn list_by_vendor(
        &self,
        vendor_id: &VendorId,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRecord>, u64), StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM supply_chain_transactions WHERE vendor_id = $1")
                .bind(vendor_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM supply_chain_transactions
             WHERE vendor_id = $1
             ORDER BY bill_date DESC, sequence DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(vendor_id.as_uuid())
        .bind(i64::from(page.limit))
        .bind(to_i64(page.offset(), "offset")?)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok((decode_all(rows)?, u64::try_from(total).unwrap_or(0)))
    }

    async fn update_rating(
        &self,
        id: Uuid,
        entry_index: usize,
        rating: u8,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let index = i32::try_from(entry_index)
            .map_err(|_| StoreError::Backend(format!("entry index {entry_index} out of range")))?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "UPDATE supply_chain_transactions
             SET supply_chain = jsonb_set(supply_chain, ARRAY[$2::text, 'rating'], to_jsonb($4::int))
             WHERE id = $1 AND jsonb_array_length(supply_chain) > $3
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(index.to_string())
        .bind(index)
        .bind(i32::from(rating))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(TransactionRecord::try_from).transpose()
    }
}
