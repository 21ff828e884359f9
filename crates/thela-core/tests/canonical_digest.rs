//! # Canonical Digest Stability
//!
//! A record hashed at append time is re-hashed at verify time after a trip
//! through storage. These tests pin the properties that make the two
//! digests agree: key order, timestamp normalization and integer-only
//! numbers.

use thela_core::{sha256_hex, CanonicalBytes, Timestamp};

fn digest(value: &impl serde::Serialize) -> String {
    sha256_hex(&CanonicalBytes::new(value).expect("canonicalization should succeed"))
}

#[test]
fn bill_shaped_value_has_expected_canonical_text() {
    let bill = serde_json::json!({
        "vendor_id": "6f1c2a52-8a8e-4d7e-9c3b-0c4b6f0b2a11",
        "bill_number": "B-001",
        "total_amount": 10000,
        "items": [{"product_name": "onion", "quantity": 5000, "unit": "kg", "purchase_price": 2000}],
    });
    let cb = CanonicalBytes::new(&bill).unwrap();
    assert_eq!(
        cb.as_str(),
        concat!(
            r#"{"bill_number":"B-001","#,
            r#""items":[{"product_name":"onion","purchase_price":2000,"quantity":5000,"unit":"kg"}],"#,
            r#""total_amount":10000,"vendor_id":"6f1c2a52-8a8e-4d7e-9c3b-0c4b6f0b2a11"}"#
        )
    );
}

#[test]
fn storage_roundtrip_with_reordered_keys_keeps_digest() {
    let original = serde_json::json!({"b": [3, 1, 2], "a": {"y": "x", "x": "y"}});
    let stored = r#"{"a":{"x":"y","y":"x"},"b":[3,1,2]}"#;
    let reloaded: serde_json::Value = serde_json::from_str(stored).unwrap();
    assert_eq!(digest(&original), digest(&reloaded));
}

#[test]
fn array_order_is_part_of_the_content() {
    let a = serde_json::json!({"hops": ["farmer", "mandi"]});
    let b = serde_json::json!({"hops": ["mandi", "farmer"]});
    assert_ne!(digest(&a), digest(&b));
}

#[test]
fn equivalent_instants_in_different_offsets_hash_identically() {
    let ist = Timestamp::parse("2025-03-09T12:00:00.450+05:30").unwrap();
    let utc = Timestamp::parse("2025-03-09T06:30:00Z").unwrap();
    assert_eq!(
        digest(&serde_json::json!({ "bill_date": ist })),
        digest(&serde_json::json!({ "bill_date": utc }))
    );
}

#[test]
fn one_second_difference_changes_digest() {
    let a = Timestamp::parse("2025-03-09T06:30:00Z").unwrap();
    let b = Timestamp::parse("2025-03-09T06:30:01Z").unwrap();
    assert_ne!(
        digest(&serde_json::json!({ "uploaded_at": a })),
        digest(&serde_json::json!({ "uploaded_at": b }))
    );
}
