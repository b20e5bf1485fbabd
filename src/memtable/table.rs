//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::backend::Operation;
use crate::range::PrefixRange;

use super::Record;

/// Fixed per-entry overhead added to the size estimate
const ENTRY_OVERHEAD: usize = 16;

/// In-memory table for recent writes
#[derive(Default)]
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, Record>>,
    /// Approximate size in bytes (keys + values + overhead)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a key (read lock)
    ///
    /// `Some(Record::Tombstone)` means the key was deleted here and older
    /// sources must not be consulted.
    pub fn get(&self, key: &[u8]) -> Option<Record> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert_locked(&mut data, key, Record::Value(value))
    }

    /// Insert a tombstone, returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert_locked(&mut data, key, Record::Tombstone)
    }

    /// Apply a list of operations under one write guard, returning the new size.
    ///
    /// Readers observe either none or all of them.
    pub fn apply(&self, operations: &[Operation]) -> usize {
        let mut data = self.data.write();
        let mut size = self.size();
        for op in operations {
            size = match op {
                Operation::Put { key, value } => {
                    self.insert_locked(&mut data, key.clone(), Record::Value(value.clone()))
                }
                Operation::Delete { key } => {
                    self.insert_locked(&mut data, key.clone(), Record::Tombstone)
                }
            };
        }
        size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> std::vec::IntoIter<(Vec<u8>, Record)> {
        self.data
            .read()
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Snapshot of the entries inside `range`, in ascending key order
    pub fn range(&self, range: &PrefixRange) -> Vec<(Vec<u8>, Record)> {
        let upper = match range.limit() {
            Some(limit) => Bound::Excluded(limit),
            None => Bound::Unbounded,
        };
        self.data
            .read()
            .range::<[u8], _>((Bound::Included(range.start()), upper))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::SeqCst);
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Insert with the write guard held; size is only mutated under that guard
    fn insert_locked(
        &self,
        data: &mut BTreeMap<Vec<u8>, Record>,
        key: Vec<u8>,
        record: Record,
    ) -> usize {
        let key_len = key.len();
        let new_len = record_len(&record);

        // A replaced key keeps its key bytes and overhead; only the record changes
        let (added, removed) = match data.insert(key, record) {
            Some(old) => (new_len, record_len(&old)),
            None => (key_len + new_len + ENTRY_OVERHEAD, 0),
        };

        let next = (self.size.load(Ordering::SeqCst) + added).saturating_sub(removed);
        self.size.store(next, Ordering::SeqCst);
        next
    }
}

fn record_len(record: &Record) -> usize {
    match record {
        Record::Value(v) => v.len(),
        Record::Tombstone => 0,
    }
}
