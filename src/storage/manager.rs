//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//!
//! A flush builds the file under `sstable_NNNNNN.sst.tmp`, syncs it, then
//! renames it into place and syncs the directory. Only complete tables ever
//! carry the `.sst` name; leftover `.tmp` files from an interrupted flush are
//! deleted on open (their entries are still in the WAL).
//! - Hand out range cursors over every SSTable

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::iterator::Direction;
use crate::memtable::{MemTable, Record};
use crate::range::PrefixRange;

use super::{SSTable, SSTableBuilder, SSTableCursor, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - Readers are shared (`Arc`) so open cursors keep their files alive
/// - `next_sstable_id`: Atomic counter (lock-free)
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<Arc<SSTableReader>>>,

    /// Next ID for creating new SSTables
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove unfinished flush output, discover existing SSTable files
    /// 3. Open readers for each (validates and loads indexes into RAM)
    /// 4. Order by ID descending (newest first)
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if Self::is_partial_sstable(&file_path) {
                tracing::warn!(path = %file_path.display(), "removing unfinished sstable");
                fs::remove_file(&file_path)?;
            } else if let Some(id) = Self::parse_sstable_id(&file_path) {
                sstable_ids.push(id);
            }
        }

        // Newest first (highest ID first)
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            let reader = SSTableReader::open(&Self::sstable_path_with_dir(path, *id))?;
            sstables.push(Arc::new(reader));
        }

        let next_id = sstable_ids.first().map_or(1, |&id| id + 1);

        tracing::debug!(
            dir = %path.display(),
            sstables = sstables.len(),
            next_id,
            "storage opened"
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            match reader.get(key)? {
                Some(Record::Value(value)) => return Ok(Some(value)),
                Some(Record::Tombstone) => return Ok(None),
                None => continue,
            }
        }

        Ok(None)
    }

    /// Flush a MemTable to a new SSTable
    ///
    /// Writes the MemTable's sorted records (tombstones included), opens a
    /// reader for the new file and puts it at the front of the list.
    /// Returns `None` for an empty MemTable. On error no `.sst` file is left
    /// behind.
    pub fn flush(&self, memtable: &MemTable) -> Result<Option<SSTable>> {
        if memtable.is_empty() {
            return Ok(None);
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);
        let tmp_path = Self::partial_path(&path);

        let mut metadata = match Self::build(&tmp_path, memtable) {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&tmp_path) {
                    tracing::warn!(
                        path = %tmp_path.display(),
                        error = %cleanup,
                        "failed to remove unfinished sstable"
                    );
                }
                return Err(e);
            }
        };

        fs::rename(&tmp_path, &path)?;
        File::open(&self.data_dir)?.sync_all()?;
        metadata.path = path.clone();

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, Arc::new(reader));

        tracing::debug!(
            sstable_id = id,
            entries = metadata.entry_count,
            bytes = metadata.file_size,
            "memtable flushed"
        );

        Ok(Some(metadata))
    }

    /// One cursor per SSTable over `range`, newest first
    pub fn cursors(&self, range: &PrefixRange, direction: Direction) -> Result<Vec<SSTableCursor>> {
        let readers: Vec<Arc<SSTableReader>> = self.sstables.read().clone();
        readers
            .into_iter()
            .map(|reader| SSTableCursor::new(reader, range, direction))
            .collect()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write every memtable record to `path` and sync it
    fn build(path: &Path, memtable: &MemTable) -> Result<SSTable> {
        let mut builder = SSTableBuilder::new(path)?;
        for (key, record) in memtable.iter() {
            builder.add_record(&key, &record)?;
        }
        builder.finish()
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// "sstable_000042.sst.tmp" → true
    fn is_partial_sstable(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "tmp")
            && path
                .file_stem()
                .map(Path::new)
                .and_then(Self::parse_sstable_id)
                .is_some()
    }

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("sstable_")?;
        id_str.parse().ok()
    }
}
