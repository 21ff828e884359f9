//! # Transaction Records
//!
//! A [`TransactionRecord`] is one supply-chain bill for a vendor: the hops
//! the produce took (farmer → mandi → middleman → vendor), the line items
//! bought, and the bill total. Records are linked into a per-vendor chain
//! through `previous_hash`.
//!
//! ## Hash coverage
//!
//! The record hash is SHA-256 over the JCS canonical form of a dedicated
//! projection ([`HashedContent`]) containing:
//!
//! `vendor_id, sequence, bill_number, bill_date, supply_chain (without
//! rating), items, total_amount, uploaded_at`
//!
//! Not covered: `id`, `previous_hash`, `hash`, `metadata` and each hop's
//! `rating`. Ratings are mutable after creation and must not invalidate
//! the digest.
//!
//! The projection structs are separate from the public model so that adding
//! a field to the model never silently changes the digest of stored records.
//!
//! ## Units
//!
//! Prices and totals are integer minor currency units (paise). Quantities
//! are integer thousandths of `unit`, so 2.5 kg is `quantity: 2500,
//! unit: "kg"`.

use serde::{Deserialize, Serialize};
use thela_core::{sha256_hex, CanonicalBytes, CanonicalizationError, Timestamp, UserId, VendorId};
use uuid::Uuid;

/// Role of a participant in a supply-chain hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Farmer,
    Mandi,
    Middleman,
    Vendor,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Mandi => "mandi",
            Self::Middleman => "middleman",
            Self::Vendor => "vendor",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provenance hop of a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyChainEntry {
    pub entity_type: EntityType,
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Minor currency units.
    pub price: i64,
    /// Thousandths of `unit`.
    pub quantity: i64,
    pub unit: String,
    pub timestamp: Timestamp,
    /// 1..=5. Mutable after creation; not hash-covered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One purchased product on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Thousandths of `unit`.
    pub quantity: i64,
    pub unit: String,
    /// Minor currency units.
    pub purchase_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Timestamp>,
}

/// Upload bookkeeping. Not hash-covered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Upload details a caller may attach to a new bill. `verified` is not
/// among them: stored records always start unverified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

impl From<UploadMetadata> for RecordMetadata {
    fn from(upload: UploadMetadata) -> Self {
        Self {
            uploaded_by: upload.uploaded_by,
            document_url: upload.document_url,
            verified: false,
        }
    }
}

/// Caller-supplied fields for [`crate::TransactionChain::append`].
///
/// Everything except the chain-assigned fields (`id`, `sequence`,
/// `uploaded_at`, `previous_hash`, `hash`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub bill_number: String,
    pub bill_date: Timestamp,
    #[serde(default)]
    pub supply_chain: Vec<SupplyChainEntry>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    #[serde(default)]
    pub metadata: UploadMetadata,
}

/// A stored, chained supply-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub vendor_id: VendorId,
    /// 0-based position in the vendor's chain.
    pub sequence: u64,
    pub bill_number: String,
    pub bill_date: Timestamp,
    pub supply_chain: Vec<SupplyChainEntry>,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub uploaded_at: Timestamp,
    pub previous_hash: String,
    pub hash: String,
    #[serde(default)]
    pub metadata: RecordMetadata,
}

impl TransactionRecord {
    /// Build an unsealed record at a chain position. `hash` is empty until
    /// [`TransactionRecord::seal`] is called.
    pub(crate) fn draft(
        vendor_id: VendorId,
        sequence: u64,
        previous_hash: String,
        uploaded_at: Timestamp,
        tx: NewTransaction,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            sequence,
            bill_number: tx.bill_number,
            bill_date: tx.bill_date,
            supply_chain: tx.supply_chain,
            items: tx.items,
            total_amount: tx.total_amount,
            uploaded_at,
            previous_hash,
            hash: String::new(),
            metadata: tx.metadata.into(),
        }
    }

    /// Compute and store the content hash. Called once, at creation.
    pub(crate) fn seal(mut self) -> Result<Self, CanonicalizationError> {
        self.hash = self.compute_hash()?;
        Ok(self)
    }

    /// Recompute the digest over the hash-covered fields as they are now.
    pub fn compute_hash(&self) -> Result<String, CanonicalizationError> {
        let canonical = CanonicalBytes::new(&HashedContent::from(self))?;
        Ok(sha256_hex(&canonical))
    }

    /// Canonical JSON of the hash-covered fields, as hashed.
    pub fn canonical_content(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&HashedContent::from(self))
    }
}

#[derive(Serialize)]
struct HashedContent<'a> {
    vendor_id: &'a VendorId,
    sequence: u64,
    bill_number: &'a str,
    bill_date: &'a Timestamp,
    supply_chain: Vec<HashedEntry<'a>>,
    items: Vec<HashedItem<'a>>,
    total_amount: i64,
    uploaded_at: &'a Timestamp,
}

#[derive(Serialize)]
struct HashedEntry<'a> {
    entity_type: EntityType,
    entity_name: &'a str,
    entity_id: Option<&'a str>,
    location: Option<&'a str>,
    price: i64,
    quantity: i64,
    unit: &'a str,
    timestamp: &'a Timestamp,
    notes: Option<&'a str>,
}

#[derive(Serialize)]
struct HashedItem<'a> {
    product_name: &'a str,
    category: Option<&'a str>,
    quantity: i64,
    unit: &'a str,
    purchase_price: i64,
    selling_price: Option<i64>,
    expiry_date: Option<&'a Timestamp>,
}

impl<'a> From<&'a TransactionRecord> for HashedContent<'a> {
    fn from(r: &'a TransactionRecord) -> Self {
        Self {
            vendor_id: &r.vendor_id,
            sequence: r.sequence,
            bill_number: &r.bill_number,
            bill_date: &r.bill_date,
            supply_chain: r
                .supply_chain
                .iter()
                .map(|e| HashedEntry {
                    entity_type: e.entity_type,
                    entity_name: &e.entity_name,
                    entity_id: e.entity_id.as_deref(),
                    location: e.location.as_deref(),
                    price: e.price,
                    quantity: e.quantity,
                    unit: &e.unit,
                    timestamp: &e.timestamp,
                    notes: e.notes.as_deref(),
                })
                .collect(),
            items: r
                .items
                .iter()
                .map(|i| HashedItem {
                    product_name: &i.product_name,
                    category: i.category.as_deref(),
                    quantity: i.quantity,
                    unit: &i.unit,
                    purchase_price: i.purchase_price,
                    selling_price: i.selling_price,
                    expiry_date: i.expiry_date.as_ref(),
                })
                .collect(),
            total_amount: r.total_amount,
            uploaded_at: &r.uploaded_at,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use thela_core::{is_sha256_hex, GENESIS_HASH};

    #[test]
    fn seal_produces_hex_digest_that_recomputes() {
        let r = record(VendorId::new(), 0, GENESIS_HASH, new_tx("B-1", 100));
        assert!(is_sha256_hex(&r.hash));
        assert_eq!(r.compute_hash().unwrap(), r.hash);
    }

    #[test]
    fn json_roundtrip_preserves_digest() {
        let r = record(VendorId::new(), 3, GENESIS_HASH, new_tx("B-1", 100));
        let json = serde_json::to_string(&r).unwrap();
        let back: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.compute_hash().unwrap(), r.hash);
    }

    #[test]
    fn rating_is_not_hash_covered() {
        let mut r = record(VendorId::new(), 0, GENESIS_HASH, new_tx("B-1", 100));
        r.supply_chain[0].rating = Some(5);
        assert_eq!(r.compute_hash().unwrap(), r.hash);
    }

    #[test]
    fn metadata_and_links_are_not_hash_covered() {
        let mut r = record(VendorId::new(), 0, GENESIS_HASH, new_tx("B-1", 100));
        r.previous_hash = "f".repeat(64);
        r.metadata.verified = true;
        r.metadata.document_url = Some("/uploads/bills/bill-1.pdf".to_string());
        r.id = Uuid::new_v4();
        assert_eq!(r.compute_hash().unwrap(), r.hash);
    }

    #[test]
    fn caller_cannot_mark_a_new_bill_verified() {
        let mut json = serde_json::to_value(new_tx("B-1", 100)).unwrap();
        json["metadata"] = serde_json::json!({
            "document_url": "/uploads/bills/bill-1.pdf",
            "verified": true
        });
        let tx: NewTransaction = serde_json::from_value(json).unwrap();
        let r = record(VendorId::new(), 0, GENESIS_HASH, tx);
        assert!(!r.metadata.verified);
        assert_eq!(r.metadata.document_url.as_deref(), Some("/uploads/bills/bill-1.pdf"));
    }

    #[test]
    fn every_covered_field_changes_the_digest() {
        let base = record(VendorId::new(), 0, GENESIS_HASH, new_tx("B-1", 100));
        let mutations: Vec<Box<dyn Fn(&mut TransactionRecord)>> = vec![
            Box::new(|r| r.vendor_id = VendorId::new()),
            Box::new(|r| r.sequence = 1),
            Box::new(|r| r.bill_number = "B-2".to_string()),
            Box::new(|r| r.bill_date = ts("2025-03-10T06:30:00Z")),
            Box::new(|r| r.supply_chain[1].price = 2001),
            Box::new(|r| r.supply_chain[0].notes = Some("late".to_string())),
            Box::new(|r| r.supply_chain.swap(0, 1)),
            Box::new(|r| r.items[0].quantity = 9_999),
            Box::new(|r| r.items[0].selling_price = None),
            Box::new(|r| r.total_amount = 999),
            Box::new(|r| r.uploaded_at = ts("2025-03-09T07:00:01Z")),
        ];
        for (i, mutate) in mutations.iter().enumerate() {
            let mut r = base.clone();
            mutate(&mut r);
            assert_ne!(r.compute_hash().unwrap(), base.hash, "mutation {i} not detected");
        }
    }

    #[test]
    fn canonical_content_omits_uncovered_fields() {
        let r = record(VendorId::new(), 0, GENESIS_HASH, new_tx("B-1", 100));
        let text = r.canonical_content().unwrap().as_str().to_string();
        assert!(text.starts_with(r#"{"bill_date":"2025-03-09T06:30:00Z","bill_number":"B-1","#));
        assert!(!text.contains("previous_hash"));
        assert!(!text.contains("rating"));
        assert!(!text.contains("metadata"));
    }

    #[test]
    fn entity_type_wire_names() {
        let json = serde_json::to_string(&EntityType::Middleman).unwrap();
        assert_eq!(json, r#""middleman""#);
        assert!(serde_json::from_str::<EntityType>(r#""trader""#).is_err());
    }
}
