//! Prefix iterator
//!
//! Wraps a backend cursor with range enforcement and sticky invalidity.
//!
//! ## State Machine
//! ```text
//!   create ──► Active ──next()──► Active ──► ... ──► Invalid
//!                │                                     ▲
//!                └──── error / exhausted / out of range / discard
//! ```
//! `Invalid` is absorbing: nothing moves an iterator out of it, whatever
//! happens to the store afterwards.

use crate::backend::Cursor;
use crate::error::{Result, StoreError};
use crate::range::PrefixRange;

/// Traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending key order
    Forward,
    /// Descending key order
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Invalid,
}

/// Why the iterator stopped, as decided by [`KvIterator::settle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Continue,
    Stop,
}

/// Cursor over the entries of one prefix range.
///
/// Positioned on the first entry (or invalid) as soon as it is created.
/// Accessing `key`, `value` or `next` on an invalid iterator panics.
pub struct KvIterator {
    cursor: Option<Box<dyn Cursor>>,
    range: PrefixRange,
    direction: Direction,
    state: State,
    error: Option<StoreError>,
}

impl KvIterator {
    /// Wrap the outcome of a backend `cursor()` call.
    ///
    /// A failed cursor yields an iterator that is invalid from the start and
    /// reports the failure through `error()`.
    pub(crate) fn new(
        cursor: Result<Box<dyn Cursor>>,
        range: PrefixRange,
        direction: Direction,
    ) -> Self {
        let (cursor, error) = match cursor {
            Ok(c) => (Some(c), None),
            Err(e) => (None, Some(e)),
        };

        let mut iter = Self {
            cursor,
            range,
            direction,
            state: State::Active,
            error,
        };
        iter.settle();
        iter
    }

    /// True while positioned on an entry inside the range
    pub fn valid(&self) -> bool {
        self.state == State::Active
    }

    /// Advance in the configured direction.
    ///
    /// # Panics
    /// If the iterator is invalid.
    pub fn next(&mut self) {
        self.assert_valid();
        if let Some(cursor) = self.cursor.as_mut() {
            if let Err(e) = cursor.next() {
                self.error = Some(e);
            }
        }
        self.settle();
    }

    /// Copy of the current key
    ///
    /// # Panics
    /// If the iterator is invalid.
    pub fn key(&self) -> Vec<u8> {
        self.current().key().to_vec()
    }

    /// Copy of the current value
    ///
    /// # Panics
    /// If the iterator is invalid.
    pub fn value(&self) -> Vec<u8> {
        self.current().value().to_vec()
    }

    /// The engine fault that ended iteration, if any
    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }

    /// Release the underlying cursor. The iterator stays invalid afterwards.
    pub fn discard(&mut self) {
        self.cursor = None;
        self.state = State::Invalid;
    }

    /// Range this iterator is bound to
    pub fn range(&self) -> &PrefixRange {
        &self.range
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Drain the remaining entries in iteration order.
    ///
    /// Returns the engine fault instead if the scan ended on one.
    pub fn into_entries(mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut entries = Vec::new();
        while self.valid() {
            entries.push((self.key(), self.value()));
            self.next();
        }
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(entries),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// The single transition point: decides whether the current position is
    /// still inside the range and drops the cursor when it is not.
    fn settle(&mut self) {
        if self.state == State::Invalid {
            return;
        }

        let verdict = match (&self.error, &self.cursor) {
            (Some(_), _) | (None, None) => Verdict::Stop,
            (None, Some(cursor)) => self.judge(cursor.as_ref()),
        };

        if verdict == Verdict::Stop {
            self.discard();
        }
    }

    fn judge(&self, cursor: &dyn Cursor) -> Verdict {
        if !cursor.is_valid() {
            return Verdict::Stop;
        }
        let key = cursor.key();
        let out_of_range = match self.direction {
            Direction::Forward => self.range.is_at_or_past_limit(key),
            Direction::Reverse => self.range.is_before_start(key),
        };
        if out_of_range {
            Verdict::Stop
        } else {
            Verdict::Continue
        }
    }

    fn current(&self) -> &dyn Cursor {
        self.assert_valid();
        match self.cursor.as_deref() {
            Some(cursor) => cursor,
            None => panic!("iterator is invalid"),
        }
    }

    fn assert_valid(&self) {
        if !self.valid() {
            panic!("iterator is invalid");
        }
    }
}

impl std::fmt::Debug for KvIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvIterator")
            .field("range", &self.range)
            .field("direction", &self.direction)
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}
