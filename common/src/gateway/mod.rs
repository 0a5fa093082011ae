//! Capabilities the market module consumes from other modules
//!
//! The balance ledger and the asset registry own their own records; the market
//! module only queries them and asks the ledger to move exact amounts on its
//! success paths. Mutating calls take `&self` so that one implementation can be
//! shared behind an `Arc` by every module of an application.

use crate::error::Result;
use crate::model::coin::{AccAddress, Coin};

/// Balance ledger operations used by the market module
pub trait BankKeeper: Send + Sync {
    /// Whether `address` holds at least `coins` available
    fn has_coins(&self, address: &AccAddress, coins: &[Coin]) -> bool;

    /// Remove `coins` from the available balance of `address`
    fn subtract_coins(&self, address: &AccAddress, coins: &[Coin]) -> Result<()>;

    /// Hold `coin` against an open order
    fn freeze_coins(&self, address: &AccAddress, coin: &Coin) -> Result<()>;

    /// Return a previously held `coin` to the available balance
    fn unfreeze_coins(&self, address: &AccAddress, coin: &Coin) -> Result<()>;
}

/// Asset registry queries used by the market module
pub trait AssetKeeper: Send + Sync {
    /// Whether a token with this symbol is registered
    fn is_token_exists(&self, symbol: &str) -> bool;

    /// Whether `address` issued the token
    fn is_token_issuer(&self, symbol: &str, address: &AccAddress) -> bool;

    /// Whether the issuer froze the token
    fn is_token_frozen(&self, symbol: &str) -> bool;
}
