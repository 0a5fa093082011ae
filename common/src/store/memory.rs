//! In-memory ordered store with commit versions

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{KvPair, KvStore};

/// Result of committing a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Number of commits so far
    pub version: u64,
    /// Hex-encoded SHA-256 over the committed contents
    pub hash: String,
}

/// `BTreeMap`-backed store
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
}

impl MemStore {
    /// Create a new empty store at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits so far
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Digest of the current contents, length-prefixing every key and value
    pub fn root_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (key, value) in &self.data {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }

    /// Seal the current contents as a new version
    pub fn commit(&mut self) -> CommitInfo {
        self.version += 1;
        CommitInfo {
            version: self.version,
            hash: hex::encode(self.root_hash()),
        }
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.data.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Vec<KvPair> {
        let upper = match end {
            Some(end) if end <= start => return Vec::new(),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        self.data
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
