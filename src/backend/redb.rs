//! redb backend
//!
//! Stores entries in a single redb table inside the store directory. redb
//! commits are atomic and fsync'd (`Durability::Immediate` is its default),
//! and read transactions are MVCC snapshots.
//!
//! Cursors stream rows out of a read transaction they own instead of copying
//! the range up front. While a cursor is alive redb cannot reclaim the pages
//! of its snapshot, and the database file stays open even if the store has
//! been closed.

use std::ops::Bound;
use std::path::{Path, PathBuf};

use ::redb::{Database, Range, TableDefinition};

use crate::error::{Result, StoreError};
use crate::iterator::Direction;
use crate::range::PrefixRange;

use super::{Backend, Cursor, DirLock, Operation};

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");

/// Database file name inside the store directory
pub const REDB_FILENAME: &str = "data.redb";

fn redb_err(e: impl Into<::redb::Error>) -> StoreError {
    StoreError::Redb(e.into())
}

/// Backend over an embedded redb database
pub struct RedbBackend {
    db: Database,
    path: PathBuf,
    // Dropped after `db`
    _lock: DirLock,
}

impl RedbBackend {
    /// Open or create the database in `dir`, locking the directory first
    pub fn open(dir: &Path, cache_size: Option<usize>) -> Result<Self> {
        let lock = DirLock::acquire(dir)?;
        let path = dir.join(REDB_FILENAME);

        let mut builder = Database::builder();
        if let Some(bytes) = cache_size {
            builder.set_cache_size(bytes);
        }
        let db = builder.create(&path).map_err(redb_err)?;

        // Ensure the table exists so read transactions can always open it
        let write_txn = db.begin_write().map_err(redb_err)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(redb_err)?;
        }
        write_txn.commit().map_err(redb_err)?;

        Ok(Self {
            db,
            path,
            _lock: lock,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for RedbBackend {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(redb_err)?;
        let table = read_txn.open_table(TABLE).map_err(redb_err)?;

        let value = table.get(key).map_err(redb_err)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, operations: &[Operation]) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(redb_err)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(redb_err)?;
            for op in operations {
                match op {
                    Operation::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(redb_err)?;
                    }
                    Operation::Delete { key } => {
                        table.remove(key.as_slice()).map_err(redb_err)?;
                    }
                }
            }
        }
        // Dropping an uncommitted transaction aborts it, so an error above
        // leaves the table untouched
        write_txn.commit().map_err(redb_err)?;
        Ok(())
    }

    fn cursor(&self, range: &PrefixRange, direction: Direction) -> Result<Box<dyn Cursor>> {
        let read_txn = self.db.begin_read().map_err(redb_err)?;
        let table = read_txn.open_table(TABLE).map_err(redb_err)?;

        let upper = match range.limit() {
            Some(limit) => Bound::Excluded(limit),
            None => Bound::Unbounded,
        };
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (Bound::Included(range.start()), upper);

        // The returned range keeps the read transaction alive on its own
        let rows = table.range::<&[u8]>(bounds).map_err(redb_err)?;

        let mut cursor = RedbCursor {
            rows,
            direction,
            current: None,
        };
        cursor.step()?;
        Ok(Box::new(cursor))
    }
}

/// Streaming cursor over one redb read snapshot
struct RedbCursor {
    rows: Range<'static, &'static [u8], &'static [u8]>,
    direction: Direction,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl RedbCursor {
    fn step(&mut self) -> Result<()> {
        self.current = None;
        let row = match self.direction {
            Direction::Forward => self.rows.next(),
            Direction::Reverse => self.rows.next_back(),
        };
        if let Some(row) = row {
            let (key, value) = row.map_err(redb_err)?;
            self.current = Some((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(())
    }
}

impl Cursor for RedbCursor {
    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        match &self.current {
            Some((key, _)) => key,
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match &self.current {
            Some((_, value)) => value,
            None => &[],
        }
    }

    fn next(&mut self) -> Result<()> {
        self.step()
    }
}
