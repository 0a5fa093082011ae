//! Market module of the exchange state machine
//!
//! Owns trading-pair registration and delisting, order submission and
//! cancellation, and the invariant checks over the records it persists. Every
//! keeper operation receives the store it works on explicitly; the handler
//! wraps each message in a write-buffer so that a rejected message leaves the
//! store untouched.

pub mod keys;
pub mod config;
pub mod msgs;
pub mod market_keeper;
pub mod order_keeper;
pub mod global_order_keeper;
pub mod delist_keeper;
pub mod keeper;
pub mod handler;
pub mod invariants;
pub mod genesis;
pub mod app;

pub use app::{BlockHeader, DeliverResult, EndBlockResult, MarketApp};
pub use config::{MarketConfig, Params};
pub use delist_keeper::DelistKeeper;
pub use genesis::{export_genesis, init_genesis, upgrade_genesis_state, GenesisState};
pub use global_order_keeper::GlobalOrderKeeper;
pub use handler::handle_msg;
pub use invariants::{check_all_invariants, InvariantReport};
pub use keeper::Keeper;
pub use market_keeper::MarketRegistry;
pub use msgs::{MarketMsg, MsgCancelMarket, MsgCancelOrder, MsgCreateMarketInfo, MsgCreateOrder};
pub use order_keeper::OrderKeeper;

/// Name under which the market store is mounted
pub const STORE_KEY: &str = "market";
