//! # API Route Modules
//!
//! - `supply_chain`: transaction append, lookup by hash, vendor listings,
//!   chain verification and entity ratings.

pub mod supply_chain;
