//! Named sub-stores committed together

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::memory::{CommitInfo, MemStore};
use crate::error::{Error, Result};

/// Name under which a module's store is mounted
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collection of module stores sharing one commit version
#[derive(Debug, Clone, Default)]
pub struct MultiStore {
    stores: BTreeMap<StoreKey, MemStore>,
    version: u64,
}

impl MultiStore {
    /// Create a new multi-store with no sub-stores mounted
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an empty sub-store under `key`; mounting twice keeps the existing one
    pub fn mount(&mut self, key: StoreKey) {
        self.stores.entry(key).or_default();
    }

    pub fn is_mounted(&self, key: &StoreKey) -> bool {
        self.stores.contains_key(key)
    }

    /// Read handle to a mounted sub-store
    pub fn kv_store(&self, key: &StoreKey) -> Result<&MemStore> {
        self.stores
            .get(key)
            .ok_or_else(|| Error::StorageUnavailable(format!("store {} is not mounted", key)))
    }

    /// Write handle to a mounted sub-store
    pub fn kv_store_mut(&mut self, key: &StoreKey) -> Result<&mut MemStore> {
        self.stores
            .get_mut(key)
            .ok_or_else(|| Error::StorageUnavailable(format!("store {} is not mounted", key)))
    }

    /// Number of commits so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Commit every sub-store and combine their hashes in key order
    pub fn commit(&mut self) -> CommitInfo {
        self.version += 1;
        let mut hasher = Sha256::new();
        for (key, store) in self.stores.iter_mut() {
            let sub = store.commit();
            hasher.update(key.name().as_bytes());
            hasher.update(sub.hash.as_bytes());
        }
        let info = CommitInfo {
            version: self.version,
            hash: hex::encode(hasher.finalize()),
        };
        info!("Committed version {} with app hash {}", info.version, info.hash);
        info
    }
}
