//! Genesis import, export and migration of the market module

use std::collections::BTreeSet;

use common::error::{Error, Result};
use common::model::market::{DelistRequest, MarketInfo};
use common::model::order::Order;
use common::store::KvStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Params;
use crate::keeper::Keeper;
use crate::msgs::validate_address;

/// Everything the market module persists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub markets: Vec<MarketInfo>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub delist_requests: Vec<DelistRequest>,
}

impl GenesisState {
    pub fn new(
        params: Params,
        markets: Vec<MarketInfo>,
        orders: Vec<Order>,
        delist_requests: Vec<DelistRequest>,
    ) -> Self {
        Self {
            params,
            markets,
            orders,
            delist_requests,
        }
    }

    /// Check the document before any of it is loaded
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let mut symbols = BTreeSet::new();
        for market in &self.markets {
            validate_address(&market.creator)?;
            if !market.is_consistent() {
                return Err(Error::InvalidSymbol(format!(
                    "market {} is inconsistent",
                    market.symbol()
                )));
            }
            if !symbols.insert(market.symbol()) {
                return Err(Error::DuplicateSymbol(market.symbol()));
            }
        }

        let mut ids = BTreeSet::new();
        for order in &self.orders {
            validate_address(&order.sender)?;
            if !symbols.contains(&order.symbol) {
                return Err(Error::SymbolNotFound(format!(
                    "order {} names unknown market {}",
                    order.order_id(),
                    order.symbol
                )));
            }
            order
                .check_consistency()
                .map_err(|e| Error::InvalidOrder(format!("order {}: {}", order.order_id(), e)))?;
            if order.left_stock == 0 {
                return Err(Error::InvalidOrder(format!(
                    "order {} is fully executed",
                    order.order_id()
                )));
            }
            if !ids.insert(order.order_id()) {
                return Err(Error::DuplicateOrder(order.order_id().to_string()));
            }
        }

        for request in &self.delist_requests {
            if request.effective_height <= 0 {
                return Err(Error::InvalidEffectiveHeight(format!(
                    "delist of {} at height {}",
                    request.symbol, request.effective_height
                )));
            }
            if !symbols.contains(&request.symbol) {
                return Err(Error::SymbolNotFound(format!(
                    "delist request names unknown market {}",
                    request.symbol
                )));
            }
        }
        Ok(())
    }
}

/// Load a validated genesis document into an empty market store
pub fn init_genesis(keeper: &mut Keeper, store: &mut dyn KvStore, genesis: &GenesisState) -> Result<()> {
    genesis.validate()?;
    keeper.set_params(genesis.params.clone())?;

    let registry = keeper.markets();
    for market in &genesis.markets {
        registry.create_market(store, market)?;
    }
    for order in &genesis.orders {
        keeper.order_keeper(&order.symbol).add(store, order)?;
    }
    let delist = keeper.delist();
    for request in &genesis.delist_requests {
        delist.add_delist_request(store, request.effective_height, &request.symbol)?;
    }

    info!(
        "Loaded market genesis with {} markets, {} orders and {} delist requests",
        genesis.markets.len(),
        genesis.orders.len(),
        genesis.delist_requests.len()
    );
    Ok(())
}

/// Dump the module state in key order
pub fn export_genesis(keeper: &Keeper, store: &dyn KvStore) -> Result<GenesisState> {
    Ok(GenesisState {
        params: keeper.params().clone(),
        markets: keeper.markets().get_all_markets(store)?,
        orders: keeper.global_orders().get_all_orders(store)?,
        delist_requests: keeper.delist().get_all_delist_requests(store)?,
    })
}

/// Bring a genesis document exported by an older release up to date
///
/// Parameters are reset to their defaults and the legacy frozen fee of every
/// order moves into its frozen commission. Applying the upgrade twice gives
/// the same document as applying it once.
pub fn upgrade_genesis_state(mut genesis: GenesisState) -> GenesisState {
    genesis.params = Params::default();
    let mut migrated = 0;
    for order in &mut genesis.orders {
        if order.frozen_fee != 0 {
            order.frozen_commission = order.frozen_fee;
            order.frozen_fee = 0;
            migrated += 1;
        }
    }
    info!("Upgraded market genesis, {} orders migrated", migrated);
    genesis
}
