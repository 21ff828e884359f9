//! # thela-core: Foundational Types for the Thela Ledger
//!
//! Leaf crate of the workspace. It owns the pieces every other crate needs
//! to agree on byte-for-byte: how a value becomes canonical JSON, how that
//! JSON becomes a digest, and how timestamps are normalized before they are
//! hashed.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every digest is computed from
//!    `CanonicalBytes`, which can only be built through the JCS pipeline.
//!    A record hashed at append time and re-hashed at verify time therefore
//!    goes through the exact same serialization.
//!
//! 2. **No floats in hashed content.** Amounts are integer minor units and
//!    quantities are integer thousandths. The canonicalizer rejects floats.
//!
//! 3. **UTC, second-precision timestamps.** `Timestamp` truncates on
//!    construction so a round-trip through storage cannot change the digest.
//!
//! 4. **Identifier newtypes.** A `VendorId` cannot be passed where a
//!    `UserId` is expected.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `thela-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{
    is_sha256_hex, sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm, GENESIS_HASH,
};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{UserId, VendorId};
pub use temporal::Timestamp;
