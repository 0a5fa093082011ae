//! Common types and utilities for the market state machine
//!
//! This library contains shared types, utilities, and abstractions used across
//! every crate of the exchange: a unified error type, fixed-point helpers, the
//! domain models persisted by the market module, the versioned key-value store,
//! and the narrow gateways through which the market module reaches the balance
//! ledger and the asset registry.

pub mod error;
pub mod model;
pub mod decimal;
pub mod store;
pub mod gateway;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export store types
pub use store::{CacheStore, CommitInfo, KvStore, MemStore, MultiStore, StoreKey};

// Re-export gateway traits
pub use gateway::{AssetKeeper, BankKeeper};
