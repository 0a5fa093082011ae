//! Versioned key-value storage
//!
//! This module provides the storage abstraction every keeper reads and writes
//! through. It mirrors a replicated ledger's multi-store: named sub-stores
//! (`MultiStore`) each holding an ordered byte map (`MemStore`), with a
//! write-buffer (`CacheStore`) that makes the mutations of one message apply
//! all together or not at all.

mod cache;
mod memory;
mod multi;

pub use cache::CacheStore;
pub use memory::{CommitInfo, MemStore};
pub use multi::{MultiStore, StoreKey};

/// Key/value pair returned by range scans
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered byte-keyed storage
///
/// Scans return entries in ascending key order so that every replica
/// enumerates records identically.
pub trait KvStore {
    /// Read the value stored under `key`
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Check whether `key` is present
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// Remove `key`; removing an absent key is a no-op
    fn delete(&mut self, key: &[u8]);

    /// Entries with `start <= key < end`; `None` means unbounded above
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Vec<KvPair>;

    /// Entries whose key starts with `prefix`
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<KvPair> {
        let end = prefix_end(prefix);
        self.range(prefix, end.as_deref())
    }
}

/// Smallest key greater than every key starting with `prefix`
///
/// Returns `None` when no such key exists (prefix empty or all 0xff).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
