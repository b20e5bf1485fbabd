//! In-memory backend
//!
//! Ordered map behind a reader/writer lock. Nothing touches disk, so there is
//! no directory and no lock file.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::Result;
use crate::iterator::Direction;
use crate::range::PrefixRange;

use super::{Backend, Cursor, Operation, SnapshotCursor};

/// Backend keeping every entry in a `BTreeMap`
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, operations: &[Operation]) -> Result<()> {
        // One write guard for the whole list keeps readers from seeing half of it
        let mut data = self.data.write();
        for op in operations {
            match op {
                Operation::Put { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                Operation::Delete { key } => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    /// Copies the matching entries out under the read guard, so a scan costs
    /// as much memory as the range it covers. Data here is already RAM-bound.
    fn cursor(&self, range: &PrefixRange, direction: Direction) -> Result<Box<dyn Cursor>> {
        let upper = match range.limit() {
            Some(limit) => Bound::Excluded(limit),
            None => Bound::Unbounded,
        };

        let data = self.data.read();
        let entries = data
            .range::<[u8], _>((Bound::Included(range.start()), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Box::new(SnapshotCursor::new(entries, direction)))
    }
}
