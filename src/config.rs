//! Configuration for nodekv
//!
//! Construction parameters handed over by the host process. Engine tuning
//! fields are passed through to the selected backend untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Name of the per-store directory suffix: `<name>.db`
pub const STORE_DIR_SUFFIX: &str = ".db";

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Location
    // -------------------------------------------------------------------------
    /// Root directory of the host process (its "home")
    pub root_dir: PathBuf,

    /// Store-specific subpath; used as-is when absolute, else joined onto `root_dir`
    pub db_path: PathBuf,

    /// Store name; the store lives in `<db_path>/<name>.db`
    pub name: String,

    // -------------------------------------------------------------------------
    // Engine Selection
    // -------------------------------------------------------------------------
    /// Which underlying ordered engine backs the store
    pub backend: BackendKind,

    // -------------------------------------------------------------------------
    // LSM Tuning
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // redb Tuning
    // -------------------------------------------------------------------------
    /// Page cache size in bytes, `None` keeps redb's default
    pub redb_cache_size: Option<usize>,
}

/// Underlying engine variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded log-structured engine (WAL + memtable + sorted segments)
    Lsm,

    /// Embedded B-tree engine (redb)
    Redb,

    /// Ordered in-memory map, nothing touches disk
    Memory,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            db_path: PathBuf::from("data"),
            name: "kvstore".to_string(),
            backend: BackendKind::Lsm,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            redb_cache_size: None,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Directory that holds this store's files
    pub fn store_dir(&self) -> PathBuf {
        resolve_root(&self.root_dir, &self.db_path)
            .join(format!("{}{}", self.name, STORE_DIR_SUFFIX))
    }

    /// Reject configurations no backend can open
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(StoreError::Config("store name is empty".to_string()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(StoreError::Config(format!(
                "store name must not contain path separators: {:?}",
                self.name
            )));
        }
        if self.memtable_size_limit == 0 {
            return Err(StoreError::Config(
                "memtable_size_limit must be greater than zero".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(StoreError::Config(
                "wal_sync_strategy count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `db_path` unchanged when absolute, otherwise joined onto `root_dir`
pub fn resolve_root(root_dir: &Path, db_path: &Path) -> PathBuf {
    if db_path.is_absolute() {
        db_path.to_path_buf()
    } else {
        root_dir.join(db_path)
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the root directory
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the store subpath (relative to root, or absolute)
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the store name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Select the underlying engine
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the redb page cache size (in bytes)
    pub fn redb_cache_size(mut self, size: usize) -> Self {
        self.config.redb_cache_size = Some(size);
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
