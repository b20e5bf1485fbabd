//! Error types for nodekv
//!
//! A single closed error enum shared by the store façade, batches, iterators
//! and every backend. Callers match on variants by value.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for nodekv operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Validation Errors (caller can always recover by fixing its input)
    // -------------------------------------------------------------------------
    #[error("key is empty")]
    KeyEmpty,

    #[error("value is empty")]
    ValueEmpty,

    #[error("batch is closed")]
    BatchClosed,

    // -------------------------------------------------------------------------
    // Lookup Outcome
    // -------------------------------------------------------------------------
    #[error("key not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Open Errors
    // -------------------------------------------------------------------------
    #[error("store directory is locked by another handle: {}", .0.display())]
    Locked(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL writer failed after an incomplete append; reopen the store")]
    WalFailed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    // -------------------------------------------------------------------------
    // Segment / Engine Errors
    // -------------------------------------------------------------------------
    #[error("Storage corruption detected: {0}")]
    Corruption(String),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),
}

impl StoreError {
    /// True for the `NotFound` lookup outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// True for errors caused by the caller's arguments or batch state
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            StoreError::KeyEmpty | StoreError::ValueEmpty | StoreError::BatchClosed
        )
    }
}
