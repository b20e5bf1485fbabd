//! # nodekv
//!
//! Key-value storage layer for a node process:
//! - A small façade (`get`/`set`/`delete`/batches/prefix iteration)
//! - Pluggable ordered engines behind one backend trait
//! - Atomic, all-or-nothing batches
//! - Exclusive ownership of the store directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Store (KvStore)                          │
//! │        validation · NotFound · batches · iterators           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ dyn Backend
//!      ┌────────────────┼─────────────────────┐
//!      ▼                ▼                     ▼
//! ┌──────────┐   ┌─────────────┐      ┌──────────────┐
//! │   LSM    │   │    redb     │      │    Memory    │
//! └────┬─────┘   └─────────────┘      └──────────────┘
//!      │
//!      ├──────────────┬───────────────┐
//!      ▼              ▼               ▼
//! ┌─────────┐   ┌───────────┐   ┌───────────┐
//! │   WAL   │   │ MemTable  │   │ SSTables  │
//! └─────────┘   └───────────┘   └───────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use nodekv::{KvStore, Store};
//!
//! let store = Store::in_memory();
//! store.set(b"ab1", b"x").unwrap();
//! store.set(b"ac1", b"y").unwrap();
//!
//! let mut iter = store.prefix_iterator(b"ab");
//! assert!(iter.valid());
//! assert_eq!(iter.key(), b"ab1".to_vec());
//! iter.next();
//! assert!(!iter.valid());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod range;

pub mod backend;
pub mod batch;
pub mod iterator;
pub mod store;

pub mod wal;
pub mod memtable;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use batch::Batch;
pub use config::{BackendKind, StoreConfig, WalSyncStrategy};
pub use error::{Result, StoreError};
pub use iterator::{Direction, KvIterator};
pub use range::PrefixRange;
pub use store::{KvStore, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nodekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
