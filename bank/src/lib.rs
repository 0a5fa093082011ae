//! Balance ledger and asset registry consumed by the market module

pub mod service;
pub mod repository;
pub mod asset;
pub mod genesis;

pub use service::BankService;
pub use repository::{BalanceRepository, InMemoryBalanceRepository};
pub use asset::{AssetRegistry, Token};
pub use genesis::{GenesisBalance, LedgerGenesis};
