//! Tests for the redb backend
//!
//! These tests verify:
//! - Database file placement and cache configuration
//! - Atomic multi-operation writes
//! - Range cursors in both directions
//! - Persistence and directory locking

use std::path::PathBuf;

use nodekv::backend::{Backend, Operation, RedbBackend, LOCK_FILENAME, REDB_FILENAME};
use nodekv::{Direction, PrefixRange, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("store.db");
    (temp_dir, dir)
}

fn put(key: &str, value: &str) -> Operation {
    Operation::Put {
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
    }
}

fn scan_keys(backend: &RedbBackend, prefix: &[u8], direction: Direction) -> Vec<String> {
    let mut cursor = backend.cursor(&PrefixRange::new(prefix), direction).unwrap();
    let mut out = Vec::new();
    while cursor.is_valid() {
        out.push(String::from_utf8(cursor.key().to_vec()).unwrap());
        cursor.next().unwrap();
    }
    out
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_files() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();

    assert_eq!(backend.path(), dir.join(REDB_FILENAME).as_path());
    assert!(dir.join(REDB_FILENAME).exists());
    assert!(dir.join(LOCK_FILENAME).exists());
    assert_eq!(backend.name(), "redb");
}

#[test]
fn test_open_with_cache_size() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, Some(1024 * 1024)).unwrap();

    backend.write(&[put("k", "v")]).unwrap();
    assert_eq!(backend.get(b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_second_open_is_locked() {
    let (_temp, dir) = setup();
    let _backend = RedbBackend::open(&dir, None).unwrap();

    assert!(matches!(RedbBackend::open(&dir, None), Err(StoreError::Locked(_))));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_multi_operation_write() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();
    backend.write(&[put("gone", "x")]).unwrap();

    backend
        .write(&[put("a", "1"), Operation::Delete { key: b"gone".to_vec() }, put("a", "2")])
        .unwrap();

    assert_eq!(backend.get(b"a").unwrap(), Some(b"2".to_vec()));
    assert_eq!(backend.get(b"gone").unwrap(), None);
}

#[test]
fn test_delete_missing_key() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();

    backend.write(&[Operation::Delete { key: b"never".to_vec() }]).unwrap();
    assert_eq!(backend.get(b"never").unwrap(), None);
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[test]
fn test_cursor_both_directions() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();
    backend
        .write(&[put("ab1", "x"), put("ab2", "x"), put("ac1", "x"), put("aa", "x")])
        .unwrap();

    assert_eq!(scan_keys(&backend, b"ab", Direction::Forward), vec!["ab1", "ab2"]);
    assert_eq!(scan_keys(&backend, b"ab", Direction::Reverse), vec!["ab2", "ab1"]);
    assert_eq!(scan_keys(&backend, b"", Direction::Forward).len(), 4);
}

#[test]
fn test_cursor_is_snapshot() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();
    backend.write(&[put("k1", "x")]).unwrap();

    let mut cursor = backend.cursor(&PrefixRange::new(b"k"), Direction::Forward).unwrap();
    backend.write(&[put("k0", "x"), put("k2", "x")]).unwrap();

    let mut keys = Vec::new();
    while cursor.is_valid() {
        keys.push(cursor.key().to_vec());
        cursor.next().unwrap();
    }
    assert_eq!(keys, vec![b"k1".to_vec()]);
}

#[test]
fn test_cursor_streams_whole_database() {
    let (_temp, dir) = setup();
    let backend = RedbBackend::open(&dir, None).unwrap();
    let ops: Vec<Operation> = (0..1000).map(|i| put(&format!("key{:04}", i), "v")).collect();
    backend.write(&ops).unwrap();

    let forward = scan_keys(&backend, b"", Direction::Forward);
    assert_eq!(forward.len(), 1000);
    assert_eq!(forward.first().unwrap(), "key0000");
    assert_eq!(forward.last().unwrap(), "key0999");

    let reverse = scan_keys(&backend, b"", Direction::Reverse);
    assert_eq!(reverse.first().unwrap(), "key0999");
    assert_eq!(reverse.last().unwrap(), "key0000");
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_keeps_data() {
    let (_temp, dir) = setup();
    {
        let backend = RedbBackend::open(&dir, None).unwrap();
        backend.write(&[put("k", "v")]).unwrap();
    }

    let backend = RedbBackend::open(&dir, None).unwrap();
    assert_eq!(backend.get(b"k").unwrap(), Some(b"v".to_vec()));
}
