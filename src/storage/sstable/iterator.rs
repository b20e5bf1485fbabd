//! SSTable Cursor
//!
//! Positioned walk over one SSTable's entries, bounded by a prefix range.

use std::sync::Arc;

use crate::error::Result;
use crate::iterator::Direction;
use crate::memtable::Record;
use crate::range::PrefixRange;

use super::SSTableReader;

/// Cursor over the entries of one SSTable inside a range.
///
/// Tombstones are surfaced; shadowing is resolved by the merge cursor.
pub struct SSTableCursor {
    reader: Arc<SSTableReader>,
    direction: Direction,
    /// Index positions still to visit: `[first, end)`
    first: usize,
    end: usize,
    /// Index position of `current`
    position: Option<usize>,
    current: Option<(Vec<u8>, Record)>,
}

impl SSTableCursor {
    /// Position on the first entry of `range` in `direction`
    pub fn new(reader: Arc<SSTableReader>, range: &PrefixRange, direction: Direction) -> Result<Self> {
        let first = reader.lower_bound(range.start());
        let end = match range.limit() {
            Some(limit) => reader.lower_bound(limit),
            None => reader.len(),
        };

        let position = if first >= end {
            None
        } else {
            match direction {
                Direction::Forward => Some(first),
                Direction::Reverse => Some(end - 1),
            }
        };

        let mut cursor = Self {
            reader,
            direction,
            first,
            end,
            position,
            current: None,
        };
        cursor.load()?;
        Ok(cursor)
    }

    /// Current key and record, `None` once exhausted
    pub fn current(&self) -> Option<(&[u8], &Record)> {
        self.current.as_ref().map(|(k, r)| (k.as_slice(), r))
    }

    /// Step in the cursor's direction
    pub fn advance(&mut self) -> Result<()> {
        self.position = match (self.position, self.direction) {
            (Some(pos), Direction::Forward) if pos + 1 < self.end => Some(pos + 1),
            (Some(pos), Direction::Reverse) if pos > self.first => Some(pos - 1),
            _ => None,
        };
        self.load()
    }

    fn load(&mut self) -> Result<()> {
        self.current = match self.position {
            Some(pos) => Some(self.reader.entry(pos)?),
            None => None,
        };
        Ok(())
    }
}
