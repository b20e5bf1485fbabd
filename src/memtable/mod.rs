//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered snapshots for SSTable creation and range cursors
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys (required for SSTable generation and prefix scans)
//! - A whole batch is applied under one write guard

mod table;

pub use table::MemTable;

/// Versioned record stored in the MemTable and in SSTables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl Record {
    /// Live value, `None` for a tombstone
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Record::Value(v) => Some(v),
            Record::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Record::Tombstone)
    }
}
