//! LSM Backend
//!
//! The embedded log-structured engine: WAL, memtable and SSTables.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup

use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::iterator::Direction;
use crate::memtable::{MemTable, Record};
use crate::range::PrefixRange;
use crate::storage::{MergeCursor, MergeSource, RecordSnapshot, StorageManager};
use crate::wal::{WalRecovery, WalWriter};

use super::{Backend, Cursor, DirLock, Operation};

/// Log-structured backend
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (write/flush): Serialized by `write_lock`
///   - Must acquire: write_lock → WAL → memtable → storage (write)
///
/// - **Reads** (get): Lock-free at this level
///   - MemTable uses internal RwLock (many concurrent readers)
///   - StorageManager takes a read lock on its SSTable list
///
/// - **Cursors**: built under `write_lock` so the memtable snapshot and the
///   SSTable list describe the same instant
pub struct LsmBackend {
    /// Write-ahead log for durability
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write operations and cursor creation
    write_lock: Mutex<()>,

    memtable_size_limit: usize,

    /// Declared last: released after everything above is dropped
    lock: DirLock,
}

impl LsmBackend {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    pub const WAL_FILENAME: &'static str = "wal.log";
    pub const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create the engine in `dir`
    ///
    /// On startup:
    /// 1. Lock the directory
    /// 2. Load existing SSTables
    /// 3. Recover from WAL if it exists, flushing what was replayed
    /// 4. Ready to serve requests
    pub fn open(dir: &Path, config: &StoreConfig) -> Result<Self> {
        // Step 1: Exclusive ownership of the directory
        let lock = DirLock::acquire(dir)?;

        // Step 2: Storage (loads existing SSTables)
        let storage_dir = dir.join(Self::SSTABLE_DIR);
        fs::create_dir_all(&storage_dir)?;
        let storage = StorageManager::open(&storage_dir)?;

        let memtable = MemTable::new();
        let wal_path = dir.join(Self::WAL_FILENAME);

        // Step 3: Replay the WAL, then make the replayed data durable in an SSTable
        let recovered = if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    recovered = result.entries_recovered,
                    corrupted = result.entries_corrupted,
                    last_lsn = result.last_lsn,
                    truncated = result.was_truncated,
                    "WAL recovery"
                );
            }

            for entry in &entries {
                memtable.apply(&entry.operations);
            }

            if !memtable.is_empty() {
                tracing::debug!(entries = memtable.entry_count(), "flushing recovered entries");
                storage.flush(&memtable)?;
                memtable.clear();
            }
            true
        } else {
            false
        };

        // Step 4: Open the WAL for appends; replayed entries now live in an SSTable
        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        if recovered {
            wal.truncate()?;
        }

        Ok(Self {
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
            memtable_size_limit: config.memtable_size_limit,
            lock,
        })
    }

    /// Flush memtable to disk regardless of its size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        let Some(sstable) = self.storage.flush(&self.memtable)? else {
            return Ok(());
        };

        self.memtable.clear();

        // Entries are now durable in the SSTable
        self.wal.lock().truncate()?;

        tracing::debug!(path = %sstable.path.display(), entries = sstable.entry_count, "flush complete");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Directory this engine owns
    pub fn dir(&self) -> &Path {
        self.lock.dir()
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// LSN of the last entry written to the WAL
    pub fn current_lsn(&self) -> u64 {
        self.wal.lock().current_lsn()
    }
}

impl Backend for LsmBackend {
    fn name(&self) -> &'static str {
        "lsm"
    }

    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(record) = self.memtable.get(key) {
            return match record {
                Record::Value(value) => Ok(Some(value)),
                Record::Tombstone => Ok(None),
            };
        }

        self.storage.get(key)
    }

    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write one WAL entry holding every operation
    /// 3. Apply to MemTable
    /// 4. Flush if the MemTable is full
    fn write(&self, operations: &[Operation]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let lsn = self.wal.lock().append_batch(operations.to_vec())?;
        let new_size = self.memtable.apply(operations);

        tracing::trace!(lsn, operations = operations.len(), memtable_size = new_size, "write applied");

        if new_size >= self.memtable_size_limit {
            // Already durable in the WAL; the flush is retried on the next write
            if let Err(e) = self.flush_internal() {
                tracing::warn!(error = %e, "memtable flush failed");
            }
        }

        Ok(())
    }

    fn cursor(&self, range: &PrefixRange, direction: Direction) -> Result<Box<dyn Cursor>> {
        let _write_guard = self.write_lock.lock();

        let mut sources: Vec<Box<dyn MergeSource>> =
            vec![Box::new(RecordSnapshot::new(self.memtable.range(range), direction))];
        for cursor in self.storage.cursors(range, direction)? {
            sources.push(Box::new(cursor));
        }

        Ok(Box::new(MergeCursor::new(sources, direction)?))
    }

    /// Flushes any pending data and syncs to disk
    fn close(&self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;
        tracing::debug!(dir = %self.dir().display(), "lsm backend closed");
        Ok(())
    }
}
