//! Orders of one market
//!
//! Every order is stored twice: under its market's key range, so that a scan
//! of one market only touches that market's orders, and under the global
//! index, so that an order can be found from its identifier alone. Both copies
//! are written and deleted only here, always together.

use common::error::{Error, ErrorExt, Result};
use common::model::order::{Order, OrderId};
use common::store::KvStore;
use tracing::debug;

use crate::keys;
use crate::msgs::validate_address;

/// Keeper scoped to the orders of one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKeeper {
    symbol: String,
}

impl OrderKeeper {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Persist a new order in both indices
    pub fn add(&self, store: &mut dyn KvStore, order: &Order) -> Result<()> {
        self.check_symbol(order)?;
        validate_address(&order.sender)?;

        let id = order.order_id();
        if store.has(&keys::global_order_key(&id)?) {
            return Err(Error::DuplicateOrder(id.to_string()));
        }

        self.write_order(store, order)?;
        debug!("Added order {} to {}", id, self.symbol);
        Ok(())
    }

    /// Delete an order from both indices and return it
    pub fn remove(&self, store: &mut dyn KvStore, id: &OrderId) -> Result<Order> {
        let order = self
            .get_order(store, id)?
            .ok_or_else(|| Error::OrderNotFound(format!("{} in {}", id, self.symbol)))?;

        store.delete(&keys::order_key(&self.symbol, id)?);
        store.delete(&keys::global_order_key(id)?);
        debug!("Removed order {} from {}", id, self.symbol);
        Ok(order)
    }

    /// Persist a filled or otherwise mutated order
    ///
    /// An order with no stock left is fully executed and leaves the book.
    pub fn update(&self, store: &mut dyn KvStore, order: &Order) -> Result<()> {
        self.check_symbol(order)?;
        let id = order.order_id();
        if !store.has(&keys::order_key(&self.symbol, &id)?) {
            return Err(Error::OrderNotFound(format!("{} in {}", id, self.symbol)));
        }
        if order.left_stock == 0 {
            self.remove(store, &id)?;
            return Ok(());
        }
        order
            .check_consistency()
            .map_err(|e| Error::InvalidOrder(format!("order {}: {}", id, e)))?;
        self.write_order(store, order)
    }

    pub fn get_order(&self, store: &dyn KvStore, id: &OrderId) -> Result<Option<Order>> {
        match store.get(&keys::order_key(&self.symbol, id)?) {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Visit the orders of the market in key order until `visitor` returns false
    ///
    /// The traversal works on a snapshot taken when it starts, so it can be
    /// restarted at any time and always terminates.
    pub fn iterate<F>(&self, store: &dyn KvStore, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Order) -> bool,
    {
        for (key, value) in store.prefix_scan(&keys::order_book_prefix(&self.symbol)) {
            let order: Order = serde_json::from_slice(&value)
                .map_err(Error::from)
                .with_context(|| format!("Failed to decode order at {}", hex::encode(&key)))?;
            if !visitor(&order) {
                break;
            }
        }
        Ok(())
    }

    /// Every order of the market, in key order
    pub fn get_all_orders(&self, store: &dyn KvStore) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        self.iterate(store, |order| {
            orders.push(order.clone());
            true
        })?;
        Ok(orders)
    }

    fn check_symbol(&self, order: &Order) -> Result<()> {
        if order.symbol != self.symbol {
            return Err(Error::InvalidOrder(format!(
                "order for {} given to the {} keeper",
                order.symbol, self.symbol
            )));
        }
        Ok(())
    }

    fn write_order(&self, store: &mut dyn KvStore, order: &Order) -> Result<()> {
        let id = order.order_id();
        let value = serde_json::to_vec(order)?;
        store.set(&keys::order_key(&self.symbol, &id)?, value.clone());
        store.set(&keys::global_order_key(&id)?, value);
        Ok(())
    }
}
