//! Messages accepted by the market module
//!
//! Each message checks its own fields in `validate_basic` without touching any
//! store. The dispatcher matches exhaustively on [`MarketMsg`].

use common::decimal::{obligation, precision, scaled_price, Quantity};
use common::error::{Error, Result};
use common::model::coin::AccAddress;
use common::model::market::{market_symbol, split_symbol, SYMBOL_SEPARATOR};
use common::model::order::{Order, OrderId, OrderType, Side, TimeInForce};
use serde::{Deserialize, Serialize};

use crate::keys::MAX_ADDRESS_LEN;

/// Route of every market message
pub const ROUTE: &str = "market";

/// Register a new trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateMarketInfo {
    pub creator: AccAddress,
    pub stock: String,
    pub money: String,
    pub price_precision: u8,
}

impl MsgCreateMarketInfo {
    pub fn validate_basic(&self) -> Result<()> {
        validate_address(&self.creator)?;
        validate_token(&self.stock)?;
        validate_token(&self.money)?;
        if self.stock == self.money {
            return Err(Error::InvalidSymbol(format!(
                "stock and money are both {}",
                self.stock
            )));
        }
        validate_precision(self.price_precision)
    }

    pub fn symbol(&self) -> String {
        market_symbol(&self.stock, &self.money)
    }
}

/// Place a limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateOrder {
    pub sender: AccAddress,
    /// Sender nonce; identifies the order together with `sender`
    pub sequence: u64,
    pub symbol: String,
    pub order_type: OrderType,
    /// Number of fractional digits of `price`
    pub price_precision: u8,
    /// Price scaled by `10^price_precision`
    pub price: i64,
    pub quantity: Quantity,
    pub side: Side,
    pub time_in_force: TimeInForce,
}

impl MsgCreateOrder {
    pub fn validate_basic(&self) -> Result<()> {
        validate_address(&self.sender)?;
        split_symbol(&self.symbol)?;
        if self.order_type != OrderType::Limit {
            return Err(Error::InvalidOrder(format!(
                "unsupported order type {:?}",
                self.order_type
            )));
        }
        if self.price <= 0 {
            return Err(Error::InvalidOrder(format!("price {} is not positive", self.price)));
        }
        if self.quantity <= 0 {
            return Err(Error::InvalidOrder(format!(
                "quantity {} is not positive",
                self.quantity
            )));
        }
        validate_precision(self.price_precision)
    }

    pub fn order_id(&self) -> OrderId {
        OrderId::new(self.sender.clone(), self.sequence)
    }

    /// Order record the message creates when accepted at `height`
    pub fn to_order(&self, height: i64) -> Result<Order> {
        let price = scaled_price(self.price, self.price_precision);
        let freeze = obligation(price, self.quantity)?;
        Ok(Order {
            sender: self.sender.clone(),
            sequence: self.sequence,
            symbol: self.symbol.clone(),
            order_type: self.order_type,
            price,
            quantity: self.quantity,
            side: self.side,
            time_in_force: self.time_in_force,
            height,
            left_stock: self.quantity,
            freeze,
            deal_money: 0,
            deal_stock: 0,
            frozen_commission: 0,
            frozen_fee: 0,
        })
    }
}

/// Cancel an open order by its global identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelOrder {
    pub sender: AccAddress,
    pub order_id: OrderId,
}

impl MsgCancelOrder {
    pub fn validate_basic(&self) -> Result<()> {
        validate_address(&self.sender)?;
        validate_address(&self.order_id.sender)
    }
}

/// Schedule the removal of a trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelMarket {
    pub sender: AccAddress,
    pub symbol: String,
    pub effective_height: i64,
}

impl MsgCancelMarket {
    pub fn validate_basic(&self) -> Result<()> {
        validate_address(&self.sender)?;
        split_symbol(&self.symbol)?;
        if self.effective_height <= 0 {
            return Err(Error::InvalidEffectiveHeight(format!(
                "effective height {} is not positive",
                self.effective_height
            )));
        }
        Ok(())
    }
}

/// Every message the market module handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MarketMsg {
    #[serde(rename = "market/MsgCreateMarketInfo")]
    CreateMarketInfo(MsgCreateMarketInfo),
    #[serde(rename = "market/MsgCreateOrder")]
    CreateOrder(MsgCreateOrder),
    #[serde(rename = "market/MsgCancelOrder")]
    CancelOrder(MsgCancelOrder),
    #[serde(rename = "market/MsgCancelMarket")]
    CancelMarket(MsgCancelMarket),
}

impl MarketMsg {
    pub fn route(&self) -> &'static str {
        ROUTE
    }

    /// Short message type used in logs and results
    pub fn msg_type(&self) -> &'static str {
        match self {
            MarketMsg::CreateMarketInfo(_) => "create_market_info",
            MarketMsg::CreateOrder(_) => "create_order",
            MarketMsg::CancelOrder(_) => "cancel_order",
            MarketMsg::CancelMarket(_) => "cancel_market",
        }
    }

    /// Account that signed the message
    pub fn signer(&self) -> &AccAddress {
        match self {
            MarketMsg::CreateMarketInfo(msg) => &msg.creator,
            MarketMsg::CreateOrder(msg) => &msg.sender,
            MarketMsg::CancelOrder(msg) => &msg.sender,
            MarketMsg::CancelMarket(msg) => &msg.sender,
        }
    }

    pub fn validate_basic(&self) -> Result<()> {
        match self {
            MarketMsg::CreateMarketInfo(msg) => msg.validate_basic(),
            MarketMsg::CreateOrder(msg) => msg.validate_basic(),
            MarketMsg::CancelOrder(msg) => msg.validate_basic(),
            MarketMsg::CancelMarket(msg) => msg.validate_basic(),
        }
    }
}

impl From<MsgCreateMarketInfo> for MarketMsg {
    fn from(msg: MsgCreateMarketInfo) -> Self {
        MarketMsg::CreateMarketInfo(msg)
    }
}

impl From<MsgCreateOrder> for MarketMsg {
    fn from(msg: MsgCreateOrder) -> Self {
        MarketMsg::CreateOrder(msg)
    }
}

impl From<MsgCancelOrder> for MarketMsg {
    fn from(msg: MsgCancelOrder) -> Self {
        MarketMsg::CancelOrder(msg)
    }
}

impl From<MsgCancelMarket> for MarketMsg {
    fn from(msg: MsgCancelMarket) -> Self {
        MarketMsg::CancelMarket(msg)
    }
}

/// Addresses must be non-empty and fit the key scheme
pub fn validate_address(address: &AccAddress) -> Result<()> {
    if address.is_empty() {
        return Err(Error::InvalidAddress("address is empty".to_string()));
    }
    if address.as_str().len() > MAX_ADDRESS_LEN {
        return Err(Error::InvalidAddress(format!(
            "address is longer than {} bytes",
            MAX_ADDRESS_LEN
        )));
    }
    Ok(())
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::InvalidSymbol("token symbol is empty".to_string()));
    }
    if token.contains(SYMBOL_SEPARATOR) || token.chars().any(char::is_control) {
        return Err(Error::InvalidSymbol(format!("invalid token symbol {:?}", token)));
    }
    Ok(())
}

fn validate_precision(price_precision: u8) -> Result<()> {
    if !precision::is_valid(price_precision) {
        return Err(Error::InvalidPricePrecision(format!(
            "price precision {} not in [{}, {}]",
            price_precision,
            precision::MIN_PRICE_PRECISION,
            precision::MAX_PRICE_PRECISION
        )));
    }
    Ok(())
}
