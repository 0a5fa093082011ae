//! Market models and related types

use serde::{Deserialize, Serialize};

use crate::decimal::{precision, Price};
use crate::error::{Error, Result};
use crate::model::coin::AccAddress;
use crate::model::event::Tag;

/// Separator between stock and money in a trading-pair symbol
pub const SYMBOL_SEPARATOR: &str = "/";

/// Build the trading-pair symbol for a stock and money token
pub fn market_symbol(stock: &str, money: &str) -> String {
    format!("{}{}{}", stock, SYMBOL_SEPARATOR, money)
}

/// Split a trading-pair symbol into `(stock, money)`
pub fn split_symbol(symbol: &str) -> Result<(&str, &str)> {
    match symbol.split_once(SYMBOL_SEPARATOR) {
        Some((stock, money))
            if !stock.is_empty() && !money.is_empty() && !money.contains(SYMBOL_SEPARATOR) =>
        {
            Ok((stock, money))
        }
        _ => Err(Error::InvalidSymbol(format!(
            "expected STOCK{}MONEY, got {:?}",
            SYMBOL_SEPARATOR, symbol
        ))),
    }
}

/// Registered trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Token traded (e.g., "eth")
    pub stock: String,
    /// Token prices are quoted in (e.g., "cet")
    pub money: String,
    /// Account that created the market
    pub creator: AccAddress,
    /// Number of fractional digits of a scaled price
    pub price_precision: u8,
    /// Price of the most recent execution
    pub last_executed_price: Price,
}

impl MarketInfo {
    /// Create a market that has not traded yet
    pub fn new(stock: String, money: String, creator: AccAddress, price_precision: u8) -> Self {
        Self {
            stock,
            money,
            creator,
            price_precision,
            last_executed_price: Price::ZERO,
        }
    }

    /// Trading-pair symbol, e.g. "eth/cet"
    pub fn symbol(&self) -> String {
        market_symbol(&self.stock, &self.money)
    }

    /// Whether the record satisfies its own defining constraints
    pub fn is_consistent(&self) -> bool {
        !self.stock.is_empty()
            && !self.money.is_empty()
            && self.stock != self.money
            && precision::is_valid(self.price_precision)
            && !self.last_executed_price.is_sign_negative()
    }

    /// Tags emitted when the market is created
    pub fn tags(&self) -> Vec<Tag> {
        vec![
            Tag::new("symbol", self.symbol()),
            Tag::new("stock", &self.stock),
            Tag::new("money", &self.money),
            Tag::new("creator", &self.creator),
            Tag::new("price-precision", self.price_precision),
        ]
    }
}

/// Scheduled removal of a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelistRequest {
    /// Height at which the market is removed
    pub effective_height: i64,
    /// Trading pair to remove
    pub symbol: String,
}

impl DelistRequest {
    pub fn new(effective_height: i64, symbol: String) -> Self {
        Self {
            effective_height,
            symbol,
        }
    }
}
