//! Tests for StoreConfig
//!
//! These tests verify:
//! - Defaults and the builder
//! - Store directory resolution
//! - Validation
//! - Deserialization from host-provided JSON

use std::path::{Path, PathBuf};

use nodekv::config::{resolve_root, STORE_DIR_SUFFIX};
use nodekv::{BackendKind, StoreConfig, StoreError, WalSyncStrategy};

// =============================================================================
// Default / Builder Tests
// =============================================================================

#[test]
fn test_defaults() {
    let config = StoreConfig::default();

    assert_eq!(config.backend, BackendKind::Lsm);
    assert_eq!(config.wal_sync_strategy, WalSyncStrategy::EveryWrite);
    assert_eq!(config.memtable_size_limit, 4 * 1024 * 1024);
    assert_eq!(config.redb_cache_size, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_builder_sets_every_field() {
    let config = StoreConfig::builder()
        .root_dir("/home/node")
        .db_path("state")
        .name("chain")
        .backend(BackendKind::Redb)
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 8 })
        .memtable_size_limit(1024)
        .redb_cache_size(64 * 1024 * 1024)
        .build();

    assert_eq!(config.root_dir, PathBuf::from("/home/node"));
    assert_eq!(config.db_path, PathBuf::from("state"));
    assert_eq!(config.name, "chain");
    assert_eq!(config.backend, BackendKind::Redb);
    assert_eq!(config.wal_sync_strategy, WalSyncStrategy::EveryNEntries { count: 8 });
    assert_eq!(config.memtable_size_limit, 1024);
    assert_eq!(config.redb_cache_size, Some(64 * 1024 * 1024));
}

// =============================================================================
// Path Resolution Tests
// =============================================================================

#[test]
fn test_store_dir_relative_db_path() {
    let config = StoreConfig::builder()
        .root_dir("/home/node")
        .db_path("data")
        .name("blocks")
        .build();

    assert_eq!(config.store_dir(), PathBuf::from("/home/node/data/blocks.db"));
    assert!(config.store_dir().to_string_lossy().ends_with(STORE_DIR_SUFFIX));
}

#[test]
fn test_store_dir_absolute_db_path() {
    let config = StoreConfig::builder()
        .root_dir("/home/node")
        .db_path("/var/lib/node")
        .name("blocks")
        .build();

    assert_eq!(config.store_dir(), PathBuf::from("/var/lib/node/blocks.db"));
}

#[test]
fn test_resolve_root() {
    assert_eq!(resolve_root(Path::new("/r"), Path::new("d")), PathBuf::from("/r/d"));
    assert_eq!(resolve_root(Path::new("/r"), Path::new("/abs")), PathBuf::from("/abs"));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_name_rejected() {
    let config = StoreConfig::builder().name("").build();
    assert!(matches!(config.validate(), Err(StoreError::Config(_))));
}

#[test]
fn test_name_with_separator_rejected() {
    for name in ["a/b", "..\\up"] {
        let config = StoreConfig::builder().name(name).build();
        assert!(matches!(config.validate(), Err(StoreError::Config(_))), "{}", name);
    }
}

#[test]
fn test_zero_memtable_limit_rejected() {
    let config = StoreConfig::builder().memtable_size_limit(0).build();
    assert!(matches!(config.validate(), Err(StoreError::Config(_))));
}

#[test]
fn test_zero_sync_count_rejected() {
    let config = StoreConfig::builder()
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
        .build();
    assert!(matches!(config.validate(), Err(StoreError::Config(_))));
}

// =============================================================================
// Serde Tests
// =============================================================================

#[test]
fn test_deserialize_partial_json_uses_defaults() {
    let config: StoreConfig = serde_json::from_str(
        r#"{ "root_dir": "/srv", "name": "state", "backend": "redb" }"#,
    )
    .unwrap();

    assert_eq!(config.root_dir, PathBuf::from("/srv"));
    assert_eq!(config.db_path, PathBuf::from("data"));
    assert_eq!(config.backend, BackendKind::Redb);
    assert_eq!(config.store_dir(), PathBuf::from("/srv/data/state.db"));
}

#[test]
fn test_deserialize_sync_strategy() {
    let config: StoreConfig = serde_json::from_str(
        r#"{ "wal_sync_strategy": { "every_n_entries": { "count": 16 } } }"#,
    )
    .unwrap();

    assert_eq!(config.wal_sync_strategy, WalSyncStrategy::EveryNEntries { count: 16 });
}

#[test]
fn test_unknown_backend_rejected() {
    let result: Result<StoreConfig, _> = serde_json::from_str(r#"{ "backend": "rocksdb" }"#);
    assert!(result.is_err());
}
