//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted by the digest functions in
//! [`crate::digest`]. It is produced by a fixed pipeline:
//!
//! 1. Serialize the value to a `serde_json::Value` tree.
//! 2. Walk the tree and reject any non-integer number.
//! 3. Emit RFC 8785 (JCS) text via `serde_jcs`: object keys sorted, no
//!    insignificant whitespace, UTF-8 output.
//!
//! Struct field order in Rust source therefore does not influence the
//! digest, and neither does the order in which a storage backend returns
//! JSON object keys. Array order is preserved: supply-chain hops and line
//! items are ordered sequences and their order is part of the content.
//!
//! Timestamps are not normalized here. They are normalized at construction
//! by [`crate::Timestamp`], which serializes as `YYYY-MM-DDTHH:MM:SSZ`.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by the JCS canonicalization pipeline.
///
/// # Invariants
///
/// - The only constructor is [`CanonicalBytes::new()`].
/// - Object keys are sorted, separators are compact.
/// - No floating-point numbers are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a non-integer number, and [`CanonicalizationError::SerializationFailed`]
    /// if serde cannot represent the value as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let text = serde_jcs::to_string(&value)?;
        Ok(Self(text.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View the canonical bytes as text. Always valid UTF-8.
    pub fn as_str(&self) -> &str {
        // serde_jcs::to_string produced a String, so this cannot fail.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if !n.is_i64() && !n.is_u64() {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted_and_compact() {
        let data = serde_json::json!({"bill_number": "B-1", "amount": 100, "items": []});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"amount":100,"bill_number":"B-1","items":[]}"#);
    }

    #[test]
    fn nested_objects_are_sorted_arrays_keep_order() {
        let data = serde_json::json!({
            "hops": [{"name": "farm", "price": 5}, {"name": "mandi", "price": 7}],
            "a": {"z": 1, "b": 2}
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            cb.as_str(),
            r#"{"a":{"b":2,"z":1},"hops":[{"name":"farm","price":5},{"name":"mandi","price":7}]}"#
        );
    }

    #[test]
    fn struct_field_order_does_not_matter() {
        #[derive(Serialize)]
        struct Ab {
            a: u32,
            b: &'static str,
        }
        #[derive(Serialize)]
        struct Ba {
            b: &'static str,
            a: u32,
        }
        let x = CanonicalBytes::new(&Ab { a: 1, b: "x" }).unwrap();
        let y = CanonicalBytes::new(&Ba { b: "x", a: 1 }).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn float_rejected_anywhere() {
        let data = serde_json::json!({"items": [{"quantity": 2.5}]});
        match CanonicalBytes::new(&data) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 2.5),
            other => panic!("expected FloatRejected, got {other:?}"),
        }
    }

    #[test]
    fn negative_and_large_integers_accepted() {
        let data = serde_json::json!({"lo": -42, "hi": 9_999_999_999i64});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"hi":9999999999,"lo":-42}"#);
    }

    #[test]
    fn unicode_passes_through_unescaped() {
        let data = serde_json::json!({"mandi": "आज़ादपुर"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert!(cb.as_str().contains("आज़ादपुर"));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(), b"[]");
        assert!(!CanonicalBytes::new(&serde_json::json!({})).unwrap().is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonicalization_is_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn reparsing_canonical_output_is_a_fixed_point(value in json_value_no_floats()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(first.as_bytes()).unwrap();
            let second = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn fractional_numbers_always_rejected(f in any::<f64>().prop_filter("fractional", |f| {
            f.is_finite() && f.fract() != 0.0
        })) {
            let value = serde_json::json!({"price": f});
            prop_assert!(CanonicalBytes::new(&value).is_err());
        }
    }
}
