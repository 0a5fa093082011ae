//! Registry of trading pairs

use common::error::{Error, ErrorExt, Result};
use common::model::event::Event;
use common::model::market::MarketInfo;
use common::store::KvStore;
use tracing::{debug, info};

use crate::keys;

/// Event emitted when a market is created
pub const EVENT_CREATE_MARKET: &str = "create_market";

/// Reads and writes `MarketInfo` records
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketRegistry;

impl MarketRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Store a new market; the trading pair must not exist yet
    pub fn create_market(&self, store: &mut dyn KvStore, info: &MarketInfo) -> Result<Event> {
        let symbol = info.symbol();
        let key = keys::market_key(&symbol);
        if store.has(&key) {
            return Err(Error::DuplicateSymbol(format!("market {} already exists", symbol)));
        }

        store.set(&key, serde_json::to_vec(info)?);
        info!("Created market {} by {}", symbol, info.creator);
        Ok(Event::new(EVENT_CREATE_MARKET, info.tags()))
    }

    /// Overwrite an existing market record, e.g. after an execution moved its last price
    pub fn set_market_info(&self, store: &mut dyn KvStore, info: &MarketInfo) -> Result<()> {
        let symbol = info.symbol();
        let key = keys::market_key(&symbol);
        if !store.has(&key) {
            return Err(Error::SymbolNotFound(symbol));
        }
        store.set(&key, serde_json::to_vec(info)?);
        Ok(())
    }

    pub fn get_market_info(&self, store: &dyn KvStore, symbol: &str) -> Result<MarketInfo> {
        debug!("Loading market {}", symbol);
        let value = store
            .get(&keys::market_key(symbol))
            .ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))?;
        let info = serde_json::from_slice(&value)?;
        Ok(info)
    }

    pub fn has_market(&self, store: &dyn KvStore, symbol: &str) -> bool {
        store.has(&keys::market_key(symbol))
    }

    /// Delete a market record; only delist enactment calls this
    pub fn remove_market(&self, store: &mut dyn KvStore, symbol: &str) -> Result<()> {
        let key = keys::market_key(symbol);
        if !store.has(&key) {
            return Err(Error::SymbolNotFound(symbol.to_string()));
        }
        store.delete(&key);
        info!("Removed market {}", symbol);
        Ok(())
    }

    /// Every market, in key order
    pub fn get_all_markets(&self, store: &dyn KvStore) -> Result<Vec<MarketInfo>> {
        store
            .prefix_scan(&keys::market_prefix())
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value)
                    .map_err(Error::from)
                    .with_context(|| format!("Failed to decode market at {}", hex::encode(&key)))
            })
            .collect()
    }
}
