//! Backend Module
//!
//! The seam between the store façade and the ordered engine underneath it.
//!
//! ## Responsibilities
//! - Point lookups returning raw presence (`Option`)
//! - Atomic, durable application of a list of operations
//! - Point-in-time cursors positioned on a key range
//!
//! Validation, `NotFound` mapping and range enforcement live in the façade;
//! backends only move bytes.
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │        Store (façade)        │
//!            └──────────────┬───────────────┘
//!                           │ dyn Backend
//!        ┌──────────────────┼──────────────────┐
//!        ▼                  ▼                  ▼
//!  ┌───────────┐     ┌─────────────┐    ┌──────────────┐
//!  │ LsmBackend│     │ RedbBackend │    │MemoryBackend │
//!  └───────────┘     └─────────────┘    └──────────────┘
//! ```

mod lock;
mod lsm;
mod memory;
mod redb;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::iterator::Direction;
use crate::range::PrefixRange;

pub use self::lsm::LsmBackend;
pub use self::memory::MemoryBackend;
pub use self::redb::{RedbBackend, REDB_FILENAME};
pub use lock::{DirLock, LOCK_FILENAME};

/// A single write, shared by batches, backends and WAL records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key } => key,
        }
    }
}

/// An ordered engine the store can sit on.
///
/// Implementations must be safe to call from many threads at once.
pub trait Backend: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Raw point lookup; `Ok(None)` when the key is absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Apply every operation or none of them, durably
    fn write(&self, operations: &[Operation]) -> Result<()>;

    /// Point-in-time cursor over `range`.
    ///
    /// Forward cursors start at the first key `>= start`; reverse cursors at the
    /// last key `< limit` (or the last key overall when `limit` is unbounded).
    /// Cursors may run past the range; the caller enforces bounds.
    fn cursor(&self, range: &PrefixRange, direction: Direction) -> Result<Box<dyn Cursor>>;

    /// Flush and sync anything still buffered
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Positioned, single-direction cursor produced by a backend
pub trait Cursor: Send {
    /// True while positioned on an entry
    fn is_valid(&self) -> bool;

    /// Current key. Only meaningful while `is_valid()`.
    fn key(&self) -> &[u8];

    /// Current value. Only meaningful while `is_valid()`.
    fn value(&self) -> &[u8];

    /// Step in the cursor's direction
    fn next(&mut self) -> Result<()>;
}

/// Cursor over entries copied out of an engine at creation time.
///
/// Entries are stored in visiting order, so reverse cursors hold them
/// descending.
pub struct SnapshotCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    position: usize,
}

impl SnapshotCursor {
    /// Build from entries in ascending key order
    pub fn new(mut entries: Vec<(Vec<u8>, Vec<u8>)>, direction: Direction) -> Self {
        if direction == Direction::Reverse {
            entries.reverse();
        }
        Self {
            entries,
            position: 0,
        }
    }
}

impl Cursor for SnapshotCursor {
    fn is_valid(&self) -> bool {
        self.position < self.entries.len()
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.position].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.position].1
    }

    fn next(&mut self) -> Result<()> {
        if self.position < self.entries.len() {
            self.position += 1;
        }
        Ok(())
    }
}
