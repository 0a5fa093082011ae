//! Write-buffer over a parent store
//!
//! Reads see the buffered writes layered over the parent. Nothing reaches the
//! parent until `write` is called; dropping the cache discards every buffered
//! mutation.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::debug;

use super::{KvPair, KvStore};

/// Buffered view over a parent store
pub struct CacheStore<'a, S: KvStore + ?Sized> {
    parent: &'a mut S,
    /// `None` marks a buffered delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: KvStore + ?Sized> CacheStore<'a, S> {
    /// Start buffering writes over `parent`
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered mutations
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Flush every buffered mutation to the parent
    pub fn write(self) {
        debug!("Flushing {} cached writes", self.writes.len());
        for (key, value) in self.writes {
            match value {
                Some(value) => self.parent.set(&key, value),
                None => self.parent.delete(&key),
            }
        }
    }

    /// Discard every buffered mutation
    pub fn discard(self) {
        debug!("Discarding {} cached writes", self.writes.len());
    }
}

impl<'a, S: KvStore + ?Sized> KvStore for CacheStore<'a, S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(buffered) => buffered.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.writes.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Vec<KvPair> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.parent.range(start, end).into_iter().collect();

        let upper = match end {
            Some(end) if end <= start => return Vec::new(),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        for (key, value) in self.writes.range::<[u8], _>((Bound::Included(start), upper)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        merged.into_iter().collect()
    }
}
