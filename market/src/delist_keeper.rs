//! Schedule of market removals

use common::error::{Error, Result};
use common::model::market::DelistRequest;
use common::store::KvStore;
use tracing::debug;

use crate::keys;

/// Value stored under every delist key; the key carries the request
const DELIST_MARKER: &[u8] = &[0x01];

#[derive(Debug, Clone, Copy, Default)]
pub struct DelistKeeper;

impl DelistKeeper {
    pub fn new() -> Self {
        Self
    }

    /// Schedule `symbol` for removal at `effective_height`
    pub fn add_delist_request(
        &self,
        store: &mut dyn KvStore,
        effective_height: i64,
        symbol: &str,
    ) -> Result<()> {
        let height = u64::try_from(effective_height).map_err(|_| {
            Error::InvalidEffectiveHeight(format!("effective height {} is negative", effective_height))
        })?;
        store.set(&keys::delist_key(height, symbol), DELIST_MARKER.to_vec());
        debug!("Scheduled delist of {} at height {}", symbol, effective_height);
        Ok(())
    }

    pub fn has_delist_request(&self, store: &dyn KvStore, request: &DelistRequest) -> bool {
        match u64::try_from(request.effective_height) {
            Ok(height) => store.has(&keys::delist_key(height, &request.symbol)),
            Err(_) => false,
        }
    }

    /// Requests with `effective_height <= height`, oldest first
    pub fn get_due_requests(&self, store: &dyn KvStore, height: i64) -> Result<Vec<DelistRequest>> {
        let height = match u64::try_from(height) {
            Ok(height) => height,
            Err(_) => return Ok(Vec::new()),
        };
        let start = keys::delist_prefix();
        let end = height.checked_add(1).map(keys::delist_height_prefix);
        store
            .range(&start, end.as_deref())
            .into_iter()
            .map(|(key, _)| decode_request(&key))
            .collect()
    }

    /// Consume a request
    pub fn remove_delist_request(&self, store: &mut dyn KvStore, request: &DelistRequest) -> Result<()> {
        let height = u64::try_from(request.effective_height).map_err(|_| {
            Error::InvalidEffectiveHeight(format!(
                "effective height {} is negative",
                request.effective_height
            ))
        })?;
        store.delete(&keys::delist_key(height, &request.symbol));
        Ok(())
    }

    /// Every scheduled request, oldest first
    pub fn get_all_delist_requests(&self, store: &dyn KvStore) -> Result<Vec<DelistRequest>> {
        store
            .prefix_scan(&keys::delist_prefix())
            .into_iter()
            .map(|(key, _)| decode_request(&key))
            .collect()
    }
}

fn decode_request(key: &[u8]) -> Result<DelistRequest> {
    let (height, symbol) = keys::parse_delist_key(key)?;
    let effective_height = i64::try_from(height)
        .map_err(|_| Error::Internal(format!("delist height {} out of range", height)))?;
    Ok(DelistRequest::new(effective_height, symbol))
}
