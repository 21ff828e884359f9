//! # Chain Verification
//!
//! A pure walk over one vendor's records in chain order. For each record:
//!
//! 1. If it is not the first, its `previous_hash` must equal the stored
//!    `hash` of the record before it. Otherwise it has a broken link.
//! 2. Its digest is recomputed from its hash-covered fields and must equal
//!    its stored `hash`. Otherwise it has been tampered with.
//!
//! Linkage compares stored hashes only, so tampering with record `i` does
//! not break the link of record `i + 1`. The first record is exempt from
//! the link check whatever its `previous_hash` holds.
//!
//! Invalidity is reported, never raised.

use serde::{Deserialize, Serialize};

use crate::record::TransactionRecord;

/// Why a record passed or failed verification.
///
/// Serialized as the human-readable message. When a record is both
/// tampered and mislinked, `Tampered` is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationReason {
    #[serde(rename = "Valid")]
    Valid,
    #[serde(rename = "Chain broken - previous hash mismatch")]
    BrokenLink,
    #[serde(rename = "Transaction data has been tampered")]
    Tampered,
}

impl VerificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::BrokenLink => "Chain broken - previous hash mismatch",
            Self::Tampered => "Transaction data has been tampered",
        }
    }
}

impl std::fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordVerification {
    /// The stored hash, as found.
    pub hash: String,
    pub bill_number: String,
    pub sequence: u64,
    pub is_valid: bool,
    pub tampered: bool,
    pub broken_link: bool,
    pub reason: VerificationReason,
}

/// Outcome for a whole vendor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Logical AND of every record's `is_valid`. True for an empty chain.
    pub chain_valid: bool,
    pub total_transactions: usize,
    pub verification_results: Vec<RecordVerification>,
}

impl ChainVerification {
    /// Results that failed, in chain order.
    pub fn failures(&self) -> impl Iterator<Item = &RecordVerification> {
        self.verification_results.iter().filter(|r| !r.is_valid)
    }
}

/// Verify records supplied in chain order.
///
/// A record whose content cannot be canonicalized is reported as tampered:
/// it cannot match the digest it was sealed with.
pub fn verify_records(records: &[TransactionRecord]) -> ChainVerification {
    let mut results = Vec::with_capacity(records.len());
    let mut predecessor: Option<&TransactionRecord> = None;

    for record in records {
        let broken_link = predecessor.is_some_and(|prev| record.previous_hash != prev.hash);
        let tampered = match record.compute_hash() {
            Ok(digest) => digest != record.hash,
            Err(err) => {
                tracing::warn!(
                    record_id = %record.id,
                    error = %err,
                    "record content could not be canonicalized during verification"
                );
                true
            }
        };

        let reason = if tampered {
            VerificationReason::Tampered
        } else if broken_link {
            VerificationReason::BrokenLink
        } else {
            VerificationReason::Valid
        };

        results.push(RecordVerification {
            hash: record.hash.clone(),
            bill_number: record.bill_number.clone(),
            sequence: record.sequence,
            is_valid: !tampered && !broken_link,
            tampered,
            broken_link,
            reason,
        });
        predecessor = Some(record);
    }

    ChainVerification {
        chain_valid: results.iter().all(|r| r.is_valid),
        total_transactions: results.len(),
        verification_results: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{new_tx, record};
    use proptest::prelude::*;
    use thela_core::{VendorId, GENESIS_HASH};

    fn chain_of(n: usize) -> Vec<TransactionRecord> {
        let vendor = VendorId::new();
        let mut out: Vec<TransactionRecord> = Vec::with_capacity(n);
        for i in 0..n {
            let prev = out.last().map_or(GENESIS_HASH.to_string(), |r| r.hash.clone());
            out.push(record(vendor, i as u64, &prev, new_tx(&format!("B-{i}"), 100 * i as i64)));
        }
        out
    }

    #[test]
    fn empty_chain_is_valid() {
        let v = verify_records(&[]);
        assert!(v.chain_valid);
        assert_eq!(v.total_transactions, 0);
        assert!(v.verification_results.is_empty());
    }

    #[test]
    fn sealed_chain_is_valid() {
        let v = verify_records(&chain_of(4));
        assert!(v.chain_valid);
        assert_eq!(v.total_transactions, 4);
        assert!(v
            .verification_results
            .iter()
            .all(|r| r.reason == VerificationReason::Valid));
    }

    #[test]
    fn tamper_and_broken_link_together_report_tamper() {
        let mut chain = chain_of(3);
        chain[1].total_amount = 1;
        chain[1].previous_hash = "a".repeat(64);
        let v = verify_records(&chain);
        let r = &v.verification_results[1];
        assert!(r.tampered && r.broken_link);
        assert_eq!(r.reason, VerificationReason::Tampered);
        assert!(v.verification_results[2].is_valid);
    }

    #[test]
    fn reason_serializes_as_message() {
        let json = serde_json::to_string(&VerificationReason::BrokenLink).unwrap();
        assert_eq!(json, r#""Chain broken - previous hash mismatch""#);
        assert_eq!(
            VerificationReason::Tampered.to_string(),
            "Transaction data has been tampered"
        );
    }

    proptest! {
        #[test]
        fn single_record_ignores_previous_hash(prev in "[0-9a-f]{64}|.{0,20}") {
            let r = record(VendorId::new(), 0, &prev, new_tx("B-1", 100));
            let v = verify_records(&[r]);
            prop_assert!(v.chain_valid);
        }

        #[test]
        fn tamper_is_localized(n in 1usize..8, pick in any::<prop::sample::Index>(), amount in 0i64..1_000_000) {
            let mut chain = chain_of(n);
            let i = pick.index(n);
            prop_assume!(chain[i].total_amount != amount);
            chain[i].total_amount = amount;
            let v = verify_records(&chain);
            prop_assert!(!v.chain_valid);
            for (j, r) in v.verification_results.iter().enumerate() {
                prop_assert_eq!(r.is_valid, j != i);
            }
            prop_assert_eq!(v.verification_results[i].reason, VerificationReason::Tampered);
        }

        #[test]
        fn broken_link_is_localized(n in 2usize..8, pick in any::<prop::sample::Index>(), bogus in "[0-9a-f]{64}") {
            let mut chain = chain_of(n);
            let i = 1 + pick.index(n - 1);
            prop_assume!(chain[i].previous_hash != bogus);
            chain[i].previous_hash = bogus;
            let v = verify_records(&chain);
            for (j, r) in v.verification_results.iter().enumerate() {
                prop_assert_eq!(r.is_valid, j != i);
            }
            let r = &v.verification_results[i];
            prop_assert!(r.broken_link && !r.tampered);
            prop_assert_eq!(r.reason, VerificationReason::BrokenLink);
        }
    }
}
