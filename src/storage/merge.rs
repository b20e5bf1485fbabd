//! Merge Cursor
//!
//! K-way merge of the memtable snapshot and every SSTable cursor into one
//! ordered stream of live entries.
//!
//! - Sources are ordered by priority: index 0 = newest (memtable), higher
//!   indices = older SSTables.
//! - Equal keys: only the newest source's record is considered.
//! - Tombstones hide older values and are never yielded.

use crate::backend::Cursor;
use crate::error::Result;
use crate::iterator::Direction;
use crate::memtable::Record;

use super::SSTableCursor;

/// A sorted input to the merge
pub trait MergeSource: Send {
    /// Current key and record, `None` once exhausted
    fn current(&self) -> Option<(&[u8], &Record)>;

    /// Step in the source's direction
    fn advance(&mut self) -> Result<()>;
}

impl MergeSource for SSTableCursor {
    fn current(&self) -> Option<(&[u8], &Record)> {
        SSTableCursor::current(self)
    }

    fn advance(&mut self) -> Result<()> {
        SSTableCursor::advance(self)
    }
}

/// Records copied out of a memtable, already in visiting order
pub struct RecordSnapshot {
    records: Vec<(Vec<u8>, Record)>,
    position: usize,
}

impl RecordSnapshot {
    /// Build from records in ascending key order
    pub fn new(mut records: Vec<(Vec<u8>, Record)>, direction: Direction) -> Self {
        if direction == Direction::Reverse {
            records.reverse();
        }
        Self {
            records,
            position: 0,
        }
    }
}

impl MergeSource for RecordSnapshot {
    fn current(&self) -> Option<(&[u8], &Record)> {
        self.records
            .get(self.position)
            .map(|(k, r)| (k.as_slice(), r))
    }

    fn advance(&mut self) -> Result<()> {
        if self.position < self.records.len() {
            self.position += 1;
        }
        Ok(())
    }
}

/// Merged view over several sources
pub struct MergeCursor {
    sources: Vec<Box<dyn MergeSource>>,
    direction: Direction,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MergeCursor {
    /// Merge `sources` (newest first) and position on the first live entry
    pub fn new(sources: Vec<Box<dyn MergeSource>>, direction: Direction) -> Result<Self> {
        let mut cursor = Self {
            sources,
            direction,
            current: None,
        };
        cursor.settle()?;
        Ok(cursor)
    }

    /// Number of sources still positioned on an entry
    pub fn active_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.current().is_some()).count()
    }

    /// Index of the source holding the next key; the newest source wins ties
    fn pick(&self) -> Option<usize> {
        let mut best: Option<(usize, &[u8])> = None;
        for (i, source) in self.sources.iter().enumerate() {
            let Some((key, _)) = source.current() else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_key)) => match self.direction {
                    Direction::Forward => key < best_key,
                    Direction::Reverse => key > best_key,
                },
            };
            if better {
                best = Some((i, key));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Move to the next live entry, consuming shadowed versions and tombstones
    fn settle(&mut self) -> Result<()> {
        loop {
            let Some(winner) = self.pick() else {
                self.current = None;
                return Ok(());
            };
            let Some((key, record)) = self.sources[winner].current() else {
                self.current = None;
                return Ok(());
            };
            let key = key.to_vec();
            let value = record.value().map(<[u8]>::to_vec);

            for source in self.sources.iter_mut() {
                if matches!(source.current(), Some((k, _)) if k == key.as_slice()) {
                    source.advance()?;
                }
            }

            if let Some(value) = value {
                self.current = Some((key, value));
                return Ok(());
            }
        }
    }
}

impl Cursor for MergeCursor {
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
        self.settle()
    }
}
