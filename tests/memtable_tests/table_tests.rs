//! Tests for MemTable
//!
//! These tests verify:
//! - Basic put/get/delete with tombstones
//! - Size accounting for inserts, overwrites and deletes
//! - Atomic application of operation lists
//! - Sorted snapshots and prefix-range snapshots
//! - Concurrent access

use std::sync::Arc;
use std::thread;

use nodekv::backend::Operation;
use nodekv::memtable::{MemTable, Record};
use nodekv::range::PrefixRange;

// =============================================================================
// Helper Functions
// =============================================================================

fn value(v: &[u8]) -> Option<Record> {
    Some(Record::Value(v.to_vec()))
}

fn keys(entries: &[(Vec<u8>, Record)]) -> Vec<Vec<u8>> {
    entries.iter().map(|(k, _)| k.clone()).collect()
}

// =============================================================================
// Basic Operation Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.entry_count(), 0);
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"value".to_vec());

    assert_eq!(memtable.get(b"key"), value(b"value"));
    assert_eq!(memtable.get(b"missing"), None);
}

#[test]
fn test_overwrite() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"v1".to_vec());
    memtable.put(b"key".to_vec(), b"v2".to_vec());

    assert_eq!(memtable.get(b"key"), value(b"v2"));
    assert_eq!(memtable.entry_count(), 1);
}

#[test]
fn test_delete_leaves_tombstone() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"value".to_vec());
    memtable.delete(b"key".to_vec());

    let record = memtable.get(b"key").unwrap();
    assert!(record.is_tombstone());
    assert_eq!(record.value(), None);
    assert_eq!(memtable.entry_count(), 1);
}

#[test]
fn test_delete_missing_key_records_tombstone() {
    let memtable = MemTable::new();
    memtable.delete(b"never".to_vec());

    assert_eq!(memtable.get(b"never"), Some(Record::Tombstone));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_grows_with_inserts() {
    let memtable = MemTable::new();
    let s1 = memtable.put(b"a".to_vec(), b"1".to_vec());
    let s2 = memtable.put(b"b".to_vec(), b"22".to_vec());

    assert!(s1 > 0);
    assert!(s2 > s1);
    assert_eq!(memtable.size(), s2);
}

#[test]
fn test_size_tracks_overwrite_delta() {
    let memtable = MemTable::new();
    let small = memtable.put(b"key".to_vec(), vec![0; 10]);
    let large = memtable.put(b"key".to_vec(), vec![0; 110]);
    assert_eq!(large - small, 100);

    let shrunk = memtable.put(b"key".to_vec(), vec![0; 10]);
    assert_eq!(shrunk, small);
}

#[test]
fn test_delete_shrinks_value_bytes() {
    let memtable = MemTable::new();
    let with_value = memtable.put(b"key".to_vec(), vec![0; 50]);
    let tombstoned = memtable.delete(b"key".to_vec());

    assert_eq!(with_value - tombstoned, 50);
}

#[test]
fn test_should_flush() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), vec![0; 100]);

    assert!(memtable.should_flush(50));
    assert!(!memtable.should_flush(10_000));
}

#[test]
fn test_clear_resets_everything() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.get(b"a"), None);
}

// =============================================================================
// Apply Tests
// =============================================================================

#[test]
fn test_apply_operations_in_order() {
    let memtable = MemTable::new();
    let size = memtable.apply(&[
        Operation::Put { key: b"a".to_vec(), value: b"1".to_vec() },
        Operation::Put { key: b"b".to_vec(), value: b"2".to_vec() },
        Operation::Delete { key: b"a".to_vec() },
        Operation::Put { key: b"b".to_vec(), value: b"3".to_vec() },
    ]);

    assert_eq!(memtable.get(b"a"), Some(Record::Tombstone));
    assert_eq!(memtable.get(b"b"), value(b"3"));
    assert_eq!(size, memtable.size());
}

#[test]
fn test_apply_empty_list() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    let before = memtable.size();

    assert_eq!(memtable.apply(&[]), before);
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_iter_sorted() {
    let memtable = MemTable::new();
    for i in (0..1000).rev() {
        memtable.put(format!("key{:04}", i).into_bytes(), b"v".to_vec());
    }

    let entries: Vec<_> = memtable.iter().collect();
    assert_eq!(entries.len(), 1000);
    for pair in entries.windows(2) {
        assert!(pair[0].0 < pair[1].0);
    }
}

#[test]
fn test_iter_includes_tombstones() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());

    let entries: Vec<_> = memtable.iter().collect();
    assert_eq!(entries[1], (b"b".to_vec(), Record::Tombstone));
}

#[test]
fn test_range_snapshot() {
    let memtable = MemTable::new();
    let all: [&[u8]; 5] = [b"aa", b"ab1", b"ab2", b"ac1", b"b"];
    for key in all {
        memtable.put(key.to_vec(), b"v".to_vec());
    }

    let entries = memtable.range(&PrefixRange::new(b"ab"));
    assert_eq!(keys(&entries), vec![b"ab1".to_vec(), b"ab2".to_vec()]);
}

#[test]
fn test_range_unbounded_prefix() {
    let memtable = MemTable::new();
    memtable.put(vec![0xFE], b"v".to_vec());
    memtable.put(vec![0xFF], b"v".to_vec());
    memtable.put(vec![0xFF, 0x00], b"v".to_vec());

    let entries = memtable.range(&PrefixRange::new(&[0xFF]));
    assert_eq!(keys(&entries), vec![vec![0xFF], vec![0xFF, 0x00]]);

    assert_eq!(memtable.range(&PrefixRange::new(b"")).len(), 3);
}

#[test]
fn test_range_is_a_copy() {
    let memtable = MemTable::new();
    memtable.put(b"k1".to_vec(), b"v".to_vec());

    let entries = memtable.range(&PrefixRange::new(b"k"));
    memtable.put(b"k2".to_vec(), b"v".to_vec());

    assert_eq!(entries.len(), 1);
}

// =============================================================================
// Concurrent Access Tests (Basic)
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let memtable = Arc::new(MemTable::new());
    memtable.put(b"key".to_vec(), b"value".to_vec());

    let mut handles = vec![];
    for _ in 0..10 {
        let mt = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(mt.get(b"key"), Some(Record::Value(b"value".to_vec())));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    let memtable = Arc::new(MemTable::new());

    let mut handles = vec![];
    for i in 0..10 {
        let mt = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for j in 0..10 {
                let key = format!("key{}_{}", i, j).into_bytes();
                let value = format!("value{}_{}", i, j).into_bytes();
                mt.put(key, value);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 100);
}
