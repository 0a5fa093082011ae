//! Byte keys of the market store
//!
//! All records live in one namespace. The first byte selects the record kind;
//! the rest is laid out so that a range scan visits records in a stable order.

use common::error::{Error, Result};
use common::model::market::market_symbol;
use common::model::order::OrderId;

/// Market records: `0x11 || stock || "/" || money`
pub const MARKET_PREFIX: u8 = 0x11;
/// Per-symbol order records: `0x12 || symbol || 0x00 || id`
pub const ORDER_PREFIX: u8 = 0x12;
/// Global order index: `0x13 || id`
pub const GLOBAL_ORDER_PREFIX: u8 = 0x13;
/// Delist schedule: `0x14 || be_u64(height) || symbol`
pub const DELIST_PREFIX: u8 = 0x14;

/// Longest sender that fits the one-byte length prefix of an order id
pub const MAX_ADDRESS_LEN: usize = u8::MAX as usize;

const SYMBOL_TERMINATOR: u8 = 0x00;

pub fn market_key(symbol: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + symbol.len());
    key.push(MARKET_PREFIX);
    key.extend_from_slice(symbol.as_bytes());
    key
}

pub fn market_key_for(stock: &str, money: &str) -> Vec<u8> {
    market_key(&market_symbol(stock, money))
}

/// Symbol encoded in a market key
pub fn symbol_from_market_key(key: &[u8]) -> Result<String> {
    match key.split_first() {
        Some((&MARKET_PREFIX, rest)) => String::from_utf8(rest.to_vec())
            .map_err(|e| Error::Internal(format!("market key is not utf-8: {}", e))),
        _ => Err(Error::Internal(format!("not a market key: {}", hex::encode(key)))),
    }
}

pub fn market_prefix() -> Vec<u8> {
    vec![MARKET_PREFIX]
}

/// `len(sender) || sender || be_u64(sequence)`
fn order_id_bytes(id: &OrderId) -> Result<Vec<u8>> {
    let sender = id.sender.as_bytes();
    let len = u8::try_from(sender.len()).map_err(|_| {
        Error::InvalidAddress(format!(
            "sender of order {} is {} bytes, longer than {}",
            id,
            sender.len(),
            MAX_ADDRESS_LEN
        ))
    })?;
    let mut bytes = Vec::with_capacity(1 + sender.len() + 8);
    bytes.push(len);
    bytes.extend_from_slice(sender);
    bytes.extend_from_slice(&id.sequence.to_be_bytes());
    Ok(bytes)
}

/// Prefix shared by every order of one market
pub fn order_book_prefix(symbol: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + symbol.len());
    key.push(ORDER_PREFIX);
    key.extend_from_slice(symbol.as_bytes());
    key.push(SYMBOL_TERMINATOR);
    key
}

pub fn order_key(symbol: &str, id: &OrderId) -> Result<Vec<u8>> {
    let mut key = order_book_prefix(symbol);
    key.extend_from_slice(&order_id_bytes(id)?);
    Ok(key)
}

pub fn global_order_prefix() -> Vec<u8> {
    vec![GLOBAL_ORDER_PREFIX]
}

pub fn global_order_key(id: &OrderId) -> Result<Vec<u8>> {
    let mut key = global_order_prefix();
    key.extend_from_slice(&order_id_bytes(id)?);
    Ok(key)
}

pub fn delist_prefix() -> Vec<u8> {
    vec![DELIST_PREFIX]
}

/// First key of the schedule at `height`
pub fn delist_height_prefix(height: u64) -> Vec<u8> {
    let mut key = delist_prefix();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn delist_key(height: u64, symbol: &str) -> Vec<u8> {
    let mut key = delist_height_prefix(height);
    key.extend_from_slice(symbol.as_bytes());
    key
}

/// Height and symbol encoded in a delist key
pub fn parse_delist_key(key: &[u8]) -> Result<(u64, String)> {
    if key.len() < 9 || key[0] != DELIST_PREFIX {
        return Err(Error::Internal(format!("not a delist key: {}", hex::encode(key))));
    }
    let mut height = [0u8; 8];
    height.copy_from_slice(&key[1..9]);
    let symbol = String::from_utf8(key[9..].to_vec())
        .map_err(|e| Error::Internal(format!("delist key is not utf-8: {}", e)))?;
    Ok((u64::from_be_bytes(height), symbol))
}
