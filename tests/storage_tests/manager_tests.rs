//! Tests for StorageManager
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Flushing MemTable to SSTable
//! - Querying across multiple SSTables
//! - Tombstone handling across SSTables
//! - Range cursors over every SSTable
//! - Persistence (restart and rediscover SSTables)

use std::fs;
use std::path::PathBuf;

use nodekv::memtable::MemTable;
use nodekv::range::PrefixRange;
use nodekv::storage::StorageManager;
use nodekv::{Direction, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn create_memtable_with_entries(entries: &[(&str, &str)]) -> MemTable {
    let memtable = MemTable::new();
    for (key, value) in entries {
        memtable.put(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }
    memtable
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new_storage");

    assert!(!path.exists());

    let manager = StorageManager::open(&path).unwrap();

    assert!(path.is_dir());
    assert_eq!(manager.data_dir(), path.as_path());
}

#[test]
fn test_open_empty_directory() {
    let (_temp, path) = setup_temp_storage();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.sstable_count(), 0);
    assert_eq!(manager.next_sstable_id(), 1);
}

#[test]
fn test_open_ignores_unrelated_files() {
    let (_temp, path) = setup_temp_storage();
    fs::write(path.join("notes.txt"), b"hello").unwrap();
    fs::write(path.join("sstable_abc.sst"), b"junk").unwrap();

    let manager = StorageManager::open(&path).unwrap();
    assert_eq!(manager.sstable_count(), 0);
}

#[test]
fn test_open_rejects_corrupt_sstable() {
    let (_temp, path) = setup_temp_storage();
    fs::write(path.join("sstable_000001.sst"), b"garbage").unwrap();

    assert!(matches!(StorageManager::open(&path), Err(StoreError::Corruption(_))));
}

#[test]
fn test_open_removes_unfinished_sstable() {
    let (_temp, path) = setup_temp_storage();
    {
        let manager = StorageManager::open(&path).unwrap();
        manager.flush(&create_memtable_with_entries(&[("a", "1")])).unwrap();
    }
    // Header plus part of an entry, as left by a flush cut short
    let partial = path.join("sstable_000002.sst.tmp");
    fs::write(&partial, b"NKSS\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x01\x00\x00\x00").unwrap();

    let manager = StorageManager::open(&path).unwrap();

    assert!(!partial.exists());
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.next_sstable_id(), 2);
    assert_eq!(manager.get(b"a").unwrap(), Some(b"1".to_vec()));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_creates_sstable() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();
    let memtable = create_memtable_with_entries(&[("a", "1"), ("b", "2")]);

    let sstable = manager.flush(&memtable).unwrap().unwrap();

    assert_eq!(sstable.entry_count(), 2);
    assert!(sstable.path.ends_with("sstable_000001.sst"));
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.next_sstable_id(), 2);
}

#[test]
fn test_flush_leaves_only_finished_file() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.flush(&create_memtable_with_entries(&[("a", "1")])).unwrap();

    let mut names: Vec<String> = fs::read_dir(&path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["sstable_000001.sst"]);
}

#[test]
fn test_flush_empty_memtable_is_skipped() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    assert!(manager.flush(&MemTable::new()).unwrap().is_none());
    assert_eq!(manager.sstable_count(), 0);
}

#[test]
fn test_flush_persists_tombstones() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();
    let memtable = MemTable::new();
    memtable.delete(b"gone".to_vec());

    let sstable = manager.flush(&memtable).unwrap().unwrap();
    assert_eq!(sstable.entry_count(), 1);
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_get_across_sstables() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.flush(&create_memtable_with_entries(&[("a", "1"), ("b", "2")])).unwrap();
    manager.flush(&create_memtable_with_entries(&[("c", "3")])).unwrap();

    assert_eq!(manager.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(manager.get(b"c").unwrap(), Some(b"3".to_vec()));
    assert_eq!(manager.get(b"z").unwrap(), None);
}

#[test]
fn test_newer_sstable_wins() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.flush(&create_memtable_with_entries(&[("key", "old")])).unwrap();
    manager.flush(&create_memtable_with_entries(&[("key", "new")])).unwrap();

    assert_eq!(manager.get(b"key").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn test_tombstone_hides_older_value() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.flush(&create_memtable_with_entries(&[("key", "value")])).unwrap();
    let deletes = MemTable::new();
    deletes.delete(b"key".to_vec());
    manager.flush(&deletes).unwrap();

    assert_eq!(manager.get(b"key").unwrap(), None);
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[test]
fn test_cursors_newest_first() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.flush(&create_memtable_with_entries(&[("p1", "old")])).unwrap();
    manager.flush(&create_memtable_with_entries(&[("p1", "new"), ("q", "x")])).unwrap();

    let cursors = manager.cursors(&PrefixRange::new(b"p"), Direction::Forward).unwrap();
    assert_eq!(cursors.len(), 2);

    let (_, newest) = cursors[0].current().unwrap();
    assert_eq!(newest.value(), Some(&b"new"[..]));
    let (_, oldest) = cursors[1].current().unwrap();
    assert_eq!(oldest.value(), Some(&b"old"[..]));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_discovers_sstables() {
    let (_temp, path) = setup_temp_storage();
    {
        let manager = StorageManager::open(&path).unwrap();
        manager.flush(&create_memtable_with_entries(&[("a", "1")])).unwrap();
        manager.flush(&create_memtable_with_entries(&[("a", "2")])).unwrap();
    }

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.sstable_count(), 2);
    assert_eq!(manager.next_sstable_id(), 3);
    assert_eq!(manager.get(b"a").unwrap(), Some(b"2".to_vec()));
}
