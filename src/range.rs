//! Prefix range calculation
//!
//! Turns a key prefix into the half-open interval `[start, limit)` that holds
//! every key beginning with it.

/// Half-open key interval covering all keys that share a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRange {
    start: Vec<u8>,
    limit: Option<Vec<u8>>,
}

impl PrefixRange {
    /// Compute the range for `prefix`.
    ///
    /// `limit` is the prefix with trailing `0xFF` bytes stripped and its last
    /// byte incremented. An empty or all-`0xFF` prefix has no upper bound.
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            start: prefix.to_vec(),
            limit: prefix_limit(prefix),
        }
    }

    /// Inclusive lower bound (the prefix itself)
    pub fn start(&self) -> &[u8] {
        &self.start
    }

    /// Exclusive upper bound, `None` when the scan runs to the end of the keyspace
    pub fn limit(&self) -> Option<&[u8]> {
        self.limit.as_deref()
    }

    /// True if `key` sorts before `start`
    pub fn is_before_start(&self, key: &[u8]) -> bool {
        key < self.start.as_slice()
    }

    /// True if `key` is at or beyond `limit`
    pub fn is_at_or_past_limit(&self, key: &[u8]) -> bool {
        match &self.limit {
            Some(limit) => key >= limit.as_slice(),
            None => false,
        }
    }

    /// True if `start <= key < limit`
    pub fn contains(&self, key: &[u8]) -> bool {
        !self.is_before_start(key) && !self.is_at_or_past_limit(key)
    }
}

/// Smallest byte string greater than every string that starts with `prefix`.
///
/// ```
/// use nodekv::range::prefix_limit;
///
/// assert_eq!(prefix_limit(b"ab"), Some(b"ac".to_vec()));
/// assert_eq!(prefix_limit(b"a\xff\xff"), Some(b"b".to_vec()));
/// assert_eq!(prefix_limit(b"\xff"), None);
/// assert_eq!(prefix_limit(b""), None);
/// ```
pub fn prefix_limit(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut limit = prefix.to_vec();
    while let Some(last) = limit.pop() {
        if last < 0xFF {
            limit.push(last + 1);
            return Some(limit);
        }
    }
    None
}
