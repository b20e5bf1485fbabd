//! Write batches
//!
//! Accumulate puts and deletes, then hand them to the backend as one atomic
//! write. Lifecycle: `open → committed | discarded`, both terminal.

use crate::backend::{Backend, Operation};
use crate::error::{Result, StoreError};
use crate::store::{validate_key, validate_value};

/// Pending operations bound to one store.
///
/// Not visible to readers until `commit()` succeeds. Dropping an open batch
/// discards it.
pub struct Batch<'a> {
    backend: &'a dyn Backend,
    /// `None` once committed or discarded
    operations: Option<Vec<Operation>>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            operations: Some(Vec::new()),
        }
    }

    /// Queue a put. Closed state is checked before the arguments.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let operations = self.operations.as_mut().ok_or(StoreError::BatchClosed)?;
        validate_key(key)?;
        validate_value(value)?;

        operations.push(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    /// Queue a delete. Closed state is checked before the key.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let operations = self.operations.as_mut().ok_or(StoreError::BatchClosed)?;
        validate_key(key)?;

        operations.push(Operation::Delete { key: key.to_vec() });
        Ok(())
    }

    /// Apply every queued operation in one atomic, durable write.
    ///
    /// On success the batch closes. On failure it stays open with its
    /// operations intact, so the caller can retry or discard.
    pub fn commit(&mut self) -> Result<()> {
        let operations = self.operations.as_ref().ok_or(StoreError::BatchClosed)?;

        if !operations.is_empty() {
            self.backend.write(operations)?;
            tracing::debug!(
                backend = self.backend.name(),
                operations = operations.len(),
                "batch committed"
            );
        }

        self.operations = None;
        Ok(())
    }

    /// Drop queued operations and close. Safe to call repeatedly.
    pub fn discard(&mut self) {
        self.operations = None;
    }

    /// True once committed or discarded
    pub fn is_closed(&self) -> bool {
        self.operations.is_none()
    }

    /// Number of queued operations (0 once closed)
    pub fn len(&self) -> usize {
        self.operations.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("backend", &self.backend.name())
            .field("pending", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
