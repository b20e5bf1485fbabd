//! Storage Module
//!
//! Persistent storage layer of the embedded LSM engine.
//!
//! ## Responsibilities
//! - Persist flushed memtables to disk in sorted, immutable SSTables
//! - Point lookups newest → oldest
//! - Range cursors merged across the memtable and every SSTable
//!
//! Compaction is out of scope: SSTables accumulate until the store is removed.

mod manager;
mod merge;
mod sstable;

pub use manager::StorageManager;
pub use merge::{MergeCursor, MergeSource, RecordSnapshot};
pub use sstable::{SSTable, SSTableBuilder, SSTableCursor, SSTableReader};
