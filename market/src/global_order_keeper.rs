//! Lookup of orders by global identifier
//!
//! The index is read-only from here; [`crate::OrderKeeper`] maintains it.

use common::error::{Error, ErrorExt, Result};
use common::model::order::{Order, OrderId};
use common::store::KvStore;
use tracing::debug;

use crate::keys;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOrderKeeper;

impl GlobalOrderKeeper {
    pub fn new() -> Self {
        Self
    }

    /// Find an order without knowing its market
    pub fn query_order(&self, store: &dyn KvStore, id: &OrderId) -> Result<Option<Order>> {
        debug!("Querying order {}", id);
        match store.get(&keys::global_order_key(id)?) {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Every indexed order, in key order
    pub fn get_all_orders(&self, store: &dyn KvStore) -> Result<Vec<Order>> {
        store
            .prefix_scan(&keys::global_order_prefix())
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value)
                    .map_err(Error::from)
                    .with_context(|| format!("Failed to decode order at {}", hex::encode(&key)))
            })
            .collect()
    }
}
