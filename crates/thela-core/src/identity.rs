//! # Identity Newtypes
//!
//! UUID-backed identifiers. Distinct types keep a vendor reference from
//! being passed where an uploader reference is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier of the vendor that owns a transaction chain.
///
/// Opaque to the ledger: vendor profiles live elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(Uuid);

/// Identifier of the user who uploaded a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

macro_rules! uuid_newtype {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse from the hyphenated UUID text form.
            pub fn parse(s: &str) -> Result<Self, ValidationError> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ValidationError::InvalidIdentifier {
                        value: s.to_string(),
                        reason: format!("{} must be a UUID: {e}", $label),
                    })
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_newtype!(VendorId, "vendor id");
uuid_newtype!(UserId, "user id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_id_serializes_as_bare_uuid() {
        let id = VendorId::parse("6f1c2a52-8a8e-4d7e-9c3b-0c4b6f0b2a11").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""6f1c2a52-8a8e-4d7e-9c3b-0c4b6f0b2a11""#);
        assert_eq!(id.to_string(), "6f1c2a52-8a8e-4d7e-9c3b-0c4b6f0b2a11");
    }

    #[test]
    fn parse_rejects_non_uuid() {
        let err = UserId::parse("vendor-42").unwrap_err();
        assert!(err.to_string().contains("user id must be a UUID"));
    }

    #[test]
    fn new_ids_are_distinct() {
        assert_ne!(VendorId::new(), VendorId::new());
    }
}
