//! Read-only consistency checks over the market store
//!
//! Each check returns a human readable summary and whether it found a broken
//! record. Nothing here mutates state; deciding whether a broken invariant
//! halts the chain is up to the caller.

use common::model::market::MarketInfo;
use common::model::order::Order;
use common::store::KvStore;
use tracing::warn;

use crate::global_order_keeper::GlobalOrderKeeper;
use crate::keys;
use crate::market_keeper::MarketRegistry;
use crate::order_keeper::OrderKeeper;

/// Outcome of one invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantReport {
    pub name: &'static str,
    pub message: String,
    pub broken: bool,
}

impl InvariantReport {
    fn new(name: &'static str, (message, broken): (String, bool)) -> Self {
        if broken {
            warn!("Invariant {} broken: {}", name, message);
        }
        Self {
            name,
            message,
            broken,
        }
    }
}

/// Every market record decodes, sits under the key of its own symbol and
/// satisfies its defining constraints
pub fn market_info_consistency(store: &dyn KvStore) -> (String, bool) {
    let mut problems = Vec::new();
    let mut count = 0;

    for (key, value) in store.prefix_scan(&keys::market_prefix()) {
        count += 1;
        let symbol = keys::symbol_from_market_key(&key).unwrap_or_else(|_| hex::encode(&key));
        let info: MarketInfo = match serde_json::from_slice(&value) {
            Ok(info) => info,
            Err(e) => {
                problems.push(format!("market {} does not decode: {}", symbol, e));
                continue;
            }
        };
        if info.symbol() != symbol {
            problems.push(format!("market {} stored under key of {}", info.symbol(), symbol));
        }
        if !info.is_consistent() {
            problems.push(format!(
                "market {} has precision {} and last price {}",
                symbol, info.price_precision, info.last_executed_price
            ));
        }
    }

    summarize("market info", count, problems)
}

/// Every order is locally consistent, belongs to an existing market and has
/// an identical twin in the global index
pub fn order_consistency(store: &dyn KvStore) -> (String, bool) {
    let registry = MarketRegistry::new();
    let global = GlobalOrderKeeper::new();
    let mut problems = Vec::new();
    let mut count = 0;

    let markets = match registry.get_all_markets(store) {
        Ok(markets) => markets,
        Err(e) => return (format!("cannot load markets: {}", e), true),
    };

    for market in &markets {
        let symbol = market.symbol();
        let orders = match OrderKeeper::new(symbol.as_str()).get_all_orders(store) {
            Ok(orders) => orders,
            Err(e) => {
                problems.push(format!("orders of {} do not decode: {}", symbol, e));
                continue;
            }
        };
        for order in orders {
            count += 1;
            check_order(&order, &global, store, &mut problems);
        }
    }

    // Orders stored under a symbol with no market
    for (key, _) in store.prefix_scan(&[keys::ORDER_PREFIX]) {
        let owned = markets
            .iter()
            .any(|market| key.starts_with(&keys::order_book_prefix(&market.symbol())));
        if !owned {
            problems.push(format!("order at {} has no market", hex::encode(&key)));
        }
    }

    summarize("order", count, problems)
}

fn check_order(order: &Order, global: &GlobalOrderKeeper, store: &dyn KvStore, problems: &mut Vec<String>) {
    let id = order.order_id();
    if let Err(e) = order.check_consistency() {
        problems.push(format!("order {}: {}", id, e));
    }
    match global.query_order(store, &id) {
        Ok(Some(indexed)) if &indexed == order => {}
        Ok(Some(_)) => problems.push(format!("order {} differs from its global index entry", id)),
        Ok(None) => problems.push(format!("order {} missing from the global index", id)),
        Err(e) => problems.push(format!("global entry of order {} does not decode: {}", id, e)),
    }
}

/// Every global index entry has a per-symbol twin
pub fn global_index_consistency(store: &dyn KvStore) -> (String, bool) {
    let mut problems = Vec::new();
    let orders = match GlobalOrderKeeper::new().get_all_orders(store) {
        Ok(orders) => orders,
        Err(e) => return (format!("cannot load the global index: {}", e), true),
    };

    for order in &orders {
        let id = order.order_id();
        match OrderKeeper::new(order.symbol.as_str()).get_order(store, &id) {
            Ok(Some(_)) => {}
            Ok(None) => problems.push(format!("indexed order {} missing from {}", id, order.symbol)),
            Err(e) => problems.push(format!("order {} does not decode: {}", id, e)),
        }
    }

    summarize("global order index", orders.len(), problems)
}

/// Run every invariant of the module
pub fn check_all_invariants(store: &dyn KvStore) -> Vec<InvariantReport> {
    vec![
        InvariantReport::new("market_info_consistency", market_info_consistency(store)),
        InvariantReport::new("order_consistency", order_consistency(store)),
        InvariantReport::new("global_index_consistency", global_index_consistency(store)),
    ]
}

fn summarize(what: &str, count: usize, problems: Vec<String>) -> (String, bool) {
    if problems.is_empty() {
        (format!("{} {} records consistent", count, what), false)
    } else {
        (
            format!("{} problems across {} {} records: {}", problems.len(), count, what, problems.join("; ")),
            true,
        )
    }
}
