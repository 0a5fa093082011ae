//! Order models and related types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decimal::{obligation, Amount, Price, Quantity};
use crate::error::{Error, Result};
use crate::model::coin::{AccAddress, Coin};
use crate::model::event::Tag;
use crate::model::market::split_symbol;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Order to be executed at the specified price or better
    Limit,
}

/// Order time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled
    GTC,
    /// Immediate or cancel
    IOC,
}

/// Global order identifier, derived from the sender and its sequence
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId {
    pub sender: AccAddress,
    pub sequence: u64,
}

impl OrderId {
    pub fn new(sender: AccAddress, sequence: u64) -> Self {
        Self { sender, sequence }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sender, self.sequence)
    }
}

impl FromStr for OrderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (sender, sequence) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::InvalidOrder(format!("malformed order id {:?}", s)))?;
        if sender.is_empty() {
            return Err(Error::InvalidAddress(format!("order id {:?} has no sender", s)));
        }
        let sequence = sequence
            .parse::<u64>()
            .map_err(|e| Error::InvalidOrder(format!("order id {:?}: {}", s, e)))?;
        Ok(Self::new(AccAddress::new(sender), sequence))
    }
}

/// Order record owned by the market module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Account that placed the order
    pub sender: AccAddress,
    /// Sender nonce the order was placed with
    pub sequence: u64,
    /// Market symbol (e.g., "eth/cet")
    pub symbol: String,
    /// Order type
    pub order_type: OrderType,
    /// Exact limit price
    pub price: Price,
    /// Original quantity of stock
    pub quantity: Quantity,
    /// Order side (buy or sell)
    pub side: Side,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Block height the order was accepted at
    pub height: i64,
    /// Stock still to be executed
    pub left_stock: Quantity,
    /// Amount of the paying token held against the order
    pub freeze: Amount,
    /// Cumulative money exchanged by fills
    pub deal_money: Amount,
    /// Cumulative stock exchanged by fills
    pub deal_stock: Quantity,
    /// Commission held against the order
    #[serde(default)]
    pub frozen_commission: Amount,
    /// Pre-upgrade name of `frozen_commission`; only ever non-zero in old genesis files
    #[serde(default)]
    pub frozen_fee: Amount,
}

impl Order {
    /// Global identifier of the order
    pub fn order_id(&self) -> OrderId {
        OrderId::new(self.sender.clone(), self.sequence)
    }

    /// Token locked by the order: money for a buy, stock for a sell
    pub fn frozen_denom(&self) -> Result<&str> {
        let (stock, money) = split_symbol(&self.symbol)?;
        Ok(match self.side {
            Side::Buy => money,
            Side::Sell => stock,
        })
    }

    /// Amount the order must lock when first placed, in units of `frozen_denom`
    pub fn required_freeze(&self) -> Result<Amount> {
        obligation(self.price, self.quantity)
    }

    /// Coin currently held against the order
    pub fn frozen_coin(&self) -> Result<Coin> {
        Ok(Coin::new(self.frozen_denom()?, self.freeze))
    }

    /// Whether any fill has touched the order
    pub fn is_untouched(&self) -> bool {
        self.deal_stock == 0 && self.deal_money == 0 && self.left_stock == self.quantity
    }

    /// Check the local constraints of a persisted order
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.quantity <= 0 {
            return Err(format!("quantity {} is not positive", self.quantity));
        }
        if self.left_stock < 0 || self.left_stock > self.quantity {
            return Err(format!(
                "left stock {} outside [0, {}]",
                self.left_stock, self.quantity
            ));
        }
        if self.freeze < 0 {
            return Err(format!("freeze {} is negative", self.freeze));
        }
        if self.is_untouched() {
            let required = self.required_freeze().map_err(|e| e.to_string())?;
            if self.freeze != required {
                return Err(format!("freeze {} differs from obligation {}", self.freeze, required));
            }
        }
        Ok(())
    }

    /// Tags emitted when the order is accepted
    pub fn tags_in_order_create(&self) -> Vec<Tag> {
        vec![
            Tag::new("order-id", self.order_id()),
            Tag::new("sender", &self.sender),
            Tag::new("symbol", &self.symbol),
            Tag::new("side", self.side),
            Tag::new("price", self.price),
            Tag::new("quantity", self.quantity),
            Tag::new("freeze", self.freeze),
            Tag::new("height", self.height),
        ]
    }

    /// Tags emitted when the order leaves the book
    pub fn tags_in_order_del(&self, reason: &str) -> Vec<Tag> {
        vec![
            Tag::new("order-id", self.order_id()),
            Tag::new("symbol", &self.symbol),
            Tag::new("left-stock", self.left_stock),
            Tag::new("unfreeze", self.freeze),
            Tag::new("del-reason", reason),
        ]
    }
}
