//! Market keeper: configuration, gateways and delist enactment

use std::sync::Arc;

use common::error::Result;
use common::gateway::{AssetKeeper, BankKeeper};
use common::model::event::{Event, Tag};
use common::model::order::Order;
use common::store::{CacheStore, KvStore, StoreKey};
use tracing::{info, warn};

use crate::config::{MarketConfig, Params};
use crate::delist_keeper::DelistKeeper;
use crate::global_order_keeper::GlobalOrderKeeper;
use crate::market_keeper::MarketRegistry;
use crate::order_keeper::OrderKeeper;
use crate::STORE_KEY;

/// Event emitted when a scheduled delist removes a market
pub const EVENT_DELIST_MARKET: &str = "delist_market";

/// Entry point to the market module's state
///
/// The keeper never holds a store; every operation is handed the store it
/// works on.
pub struct Keeper {
    store_key: StoreKey,
    bank: Arc<dyn BankKeeper>,
    assets: Arc<dyn AssetKeeper>,
    config: MarketConfig,
}

impl Keeper {
    /// Create a keeper mounted at the default store key
    pub fn new(bank: Arc<dyn BankKeeper>, assets: Arc<dyn AssetKeeper>, config: MarketConfig) -> Self {
        Self::with_store_key(StoreKey::new(STORE_KEY), bank, assets, config)
    }

    pub fn with_store_key(
        store_key: StoreKey,
        bank: Arc<dyn BankKeeper>,
        assets: Arc<dyn AssetKeeper>,
        config: MarketConfig,
    ) -> Self {
        Self {
            store_key,
            bank,
            assets,
            config,
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.store_key
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.config.params
    }

    /// Replace the module parameters, recomputing the derived configuration
    pub fn set_params(&mut self, params: Params) -> Result<()> {
        self.config = MarketConfig::from_params(params)?;
        info!(
            "Market params set: fee {}, min effect height {}",
            self.config.create_market_fee,
            self.config.min_effect_height()
        );
        Ok(())
    }

    pub fn bank(&self) -> &dyn BankKeeper {
        self.bank.as_ref()
    }

    pub fn assets(&self) -> &dyn AssetKeeper {
        self.assets.as_ref()
    }

    pub fn markets(&self) -> MarketRegistry {
        MarketRegistry::new()
    }

    pub fn order_keeper(&self, symbol: &str) -> OrderKeeper {
        OrderKeeper::new(symbol)
    }

    pub fn global_orders(&self) -> GlobalOrderKeeper {
        GlobalOrderKeeper::new()
    }

    pub fn delist(&self) -> DelistKeeper {
        DelistKeeper::new()
    }

    /// Enact every delist request due at `height`
    ///
    /// Each request is consumed exactly once. The market's remaining orders
    /// leave the book and their frozen coins are returned before the market
    /// itself is removed. Running this twice at one height enacts nothing the
    /// second time.
    pub fn enact_due(&self, store: &mut dyn KvStore, height: i64) -> Result<Vec<Event>> {
        let delist = self.delist();
        let registry = self.markets();
        let mut events = Vec::new();

        for request in delist.get_due_requests(store, height)? {
            let mut cache = CacheStore::new(&mut *store);
            delist.remove_delist_request(&mut cache, &request)?;

            if !registry.has_market(&cache, &request.symbol) {
                warn!(
                    "Delist request for {} at height {} names no market",
                    request.symbol, request.effective_height
                );
                cache.write();
                continue;
            }

            let ork = self.order_keeper(&request.symbol);
            let orders = ork.get_all_orders(&cache)?;
            for order in &orders {
                ork.remove(&mut cache, &order.order_id())?;
            }
            registry.remove_market(&mut cache, &request.symbol)?;
            cache.write();

            for order in &orders {
                self.release_freeze(order);
            }

            info!(
                "Delisted market {} at height {}, {} orders removed",
                request.symbol,
                height,
                orders.len()
            );
            events.push(Event::new(
                EVENT_DELIST_MARKET,
                vec![
                    Tag::new("symbol", &request.symbol),
                    Tag::new("effective-height", request.effective_height),
                    Tag::new("height", height),
                    Tag::new("removed-orders", orders.len()),
                ],
            ));
        }

        Ok(events)
    }

    /// Return the coins an order holds; the order has already left the store
    fn release_freeze(&self, order: &Order) {
        if order.freeze == 0 {
            return;
        }
        let result = order
            .frozen_coin()
            .and_then(|coin| self.bank.unfreeze_coins(&order.sender, &coin));
        if let Err(e) = result {
            warn!("Failed to unfreeze coins of order {}: {}", order.order_id(), e);
        }
    }
}
