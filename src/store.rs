//! Store Module
//!
//! The key-value façade the host process talks to.
//!
//! ## Responsibilities
//! - Validate keys and values before any backend call
//! - Map backend absence to `NotFound`
//! - Hand out batches and prefix iterators
//! - Own the backend (and with it the directory lock) for the store's lifetime

use std::path::{Path, PathBuf};

use crate::backend::{Backend, LsmBackend, MemoryBackend, Operation, RedbBackend};
use crate::batch::Batch;
use crate::config::{BackendKind, StoreConfig};
use crate::error::{Result, StoreError};
use crate::iterator::{Direction, KvIterator};
use crate::range::PrefixRange;

/// Minimal key-value interface over an ordered keyspace.
///
/// Implementations must be safe to share between threads.
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, or `NotFound`
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Fresh batch bound to this store
    fn new_batch(&self) -> Batch<'_>;

    /// Ascending iterator over every key starting with `prefix`
    fn prefix_iterator(&self, prefix: &[u8]) -> KvIterator;

    /// Descending iterator over every key starting with `prefix`
    fn reverse_prefix_iterator(&self, prefix: &[u8]) -> KvIterator;

    /// Whether `key` is present. Faults other than absence still propagate.
    fn has(&self, key: &[u8]) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A store bound to one backend instance
pub struct Store {
    backend: Box<dyn Backend>,
    /// On-disk location, `None` for in-memory stores
    dir: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the store described by `config`.
    ///
    /// Fails with `Locked` if another handle already holds the directory.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let dir = config.store_dir();
        let backend: Box<dyn Backend> = match config.backend {
            BackendKind::Lsm => Box::new(LsmBackend::open(&dir, config)?),
            BackendKind::Redb => Box::new(RedbBackend::open(&dir, config.redb_cache_size)?),
            BackendKind::Memory => return Ok(Self::in_memory()),
        };

        tracing::info!(path = %dir.display(), backend = backend.name(), "store opened");

        Ok(Self {
            backend,
            dir: Some(dir),
        })
    }

    /// Store that lives entirely in memory
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Store over a caller-supplied backend
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend, dir: None }
    }

    /// Directory holding the store's files, if it has one
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Name of the underlying engine
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Flush buffered state and release the directory lock
    pub fn close(self) -> Result<()> {
        self.backend.close()?;
        tracing::info!(backend = self.backend.name(), "store closed");
        Ok(())
    }

    fn iterator(&self, prefix: &[u8], direction: Direction) -> KvIterator {
        let range = PrefixRange::new(prefix);
        let cursor = self.backend.cursor(&range, direction);
        KvIterator::new(cursor, range, direction)
    }
}

impl KvStore for Store {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        validate_key(key)?;
        tracing::trace!(key_len = key.len(), "get");
        self.backend.get(key)?.ok_or(StoreError::NotFound)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        validate_key(key)?;
        validate_value(value)?;
        tracing::trace!(key_len = key.len(), value_len = value.len(), "set");
        self.backend.write(&[Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }])
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        validate_key(key)?;
        tracing::trace!(key_len = key.len(), "delete");
        self.backend.write(&[Operation::Delete { key: key.to_vec() }])
    }

    fn new_batch(&self) -> Batch<'_> {
        Batch::new(self.backend.as_ref())
    }

    fn prefix_iterator(&self, prefix: &[u8]) -> KvIterator {
        self.iterator(prefix, Direction::Forward)
    }

    fn reverse_prefix_iterator(&self, prefix: &[u8]) -> KvIterator {
        self.iterator(prefix, Direction::Reverse)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.name())
            .field("dir", &self.dir)
            .finish()
    }
}

pub(crate) fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::KeyEmpty);
    }
    Ok(())
}

pub(crate) fn validate_value(value: &[u8]) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::ValueEmpty);
    }
    Ok(())
}
