//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via an in-memory
//! index. The file handle sits behind a mutex so lookups take `&self` and
//! readers can be shared between threads and cursors.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Buf;
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::memtable::Record;

use super::{ENTRY_HEADER_SIZE, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
pub struct SSTableReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// Sorted index: key → file offset
    index: Vec<(Vec<u8>, u64)>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Validates header, footer and data CRC, then loads the index into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(corruption(path, format!("file too small ({} bytes)", file_size)));
        }

        // Header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        let mut buf = &header[..];
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if &magic != MAGIC {
            return Err(corruption(path, format!("invalid magic {:?}", magic)));
        }
        let version = buf.get_u16_le();
        if version != VERSION {
            return Err(corruption(path, format!("unsupported version {}", version)));
        }
        let entry_count = buf.get_u64_le();

        // Footer
        file.seek(SeekFrom::Start(file_size - FOOTER_SIZE))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;
        let mut buf = &footer[..];
        let index_offset = buf.get_u64_le();
        let data_crc = buf.get_u32_le();

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(corruption(path, format!("index offset {} out of bounds", index_offset)));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut hasher = crc32fast::Hasher::new();
        let mut remaining = index_offset - HEADER_SIZE;
        let mut chunk = vec![0u8; 64 * 1024];
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            file.read_exact(&mut chunk[..n])?;
            hasher.update(&chunk[..n]);
            remaining -= n as u64;
        }
        let computed = hasher.finalize();
        if computed != data_crc {
            return Err(corruption(
                path,
                format!("data CRC mismatch: stored {:#010x}, computed {:#010x}", data_crc, computed),
            ));
        }

        // Index block: [key_len(4)][offset(8)][key]
        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.read_exact(&mut index_data)?;
        let index = parse_index(path, &index_data)?;

        if index.len() as u64 != entry_count {
            return Err(corruption(
                path,
                format!("header says {} entries, index has {}", entry_count, index.len()),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
        })
    }

    /// Look up a key: O(log n) via the in-memory index
    ///
    /// Returns:
    /// - `Ok(Some(Record::Value(v)))`: key found with value
    /// - `Ok(Some(Record::Tombstone))`: key deleted in this SSTable
    /// - `Ok(None)`: key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<Record>> {
        match self.index.binary_search_by(|(k, _)| k.as_slice().cmp(key)) {
            Ok(pos) => {
                let (_, record) = self.read_at(self.index[pos].1)?;
                Ok(Some(record))
            }
            Err(_) => Ok(None),
        }
    }

    /// Read the entry at index position `pos`
    pub fn entry(&self, pos: usize) -> Result<(Vec<u8>, Record)> {
        match self.index.get(pos) {
            Some((_, offset)) => self.read_at(*offset),
            None => Err(corruption(&self.path, format!("index position {} out of range", pos))),
        }
    }

    /// First index position whose key is `>= key`
    pub fn lower_bound(&self, key: &[u8]) -> usize {
        self.index.partition_point(|(k, _)| k.as_slice() < key)
    }

    /// Key at index position `pos`
    pub fn key_at(&self, pos: usize) -> Option<&[u8]> {
        self.index.get(pos).map(|(k, _)| k.as_slice())
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Get the minimum key in this SSTable (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.key_at(0)
    }

    /// Get the maximum key in this SSTable (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.last().map(|(k, _)| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false, // Empty SSTable
        }
    }

    /// Path of the SSTable file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the data-block entry starting at `offset`
    fn read_at(&self, offset: u64) -> Result<(Vec<u8>, Record)> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; ENTRY_HEADER_SIZE];
        file.read_exact(&mut header)?;
        let mut buf = &header[..];
        let key_len = buf.get_u32_le() as usize;
        let val_len = buf.get_u32_le();

        let mut key = vec![0u8; key_len];
        file.read_exact(&mut key)?;

        let record = if val_len == TOMBSTONE_MARKER {
            Record::Tombstone
        } else {
            let mut value = vec![0u8; val_len as usize];
            file.read_exact(&mut value)?;
            Record::Value(value)
        };

        Ok((key, record))
    }
}

fn parse_index(path: &Path, mut data: &[u8]) -> Result<Vec<(Vec<u8>, u64)>> {
    let mut index: Vec<(Vec<u8>, u64)> = Vec::new();
    while data.has_remaining() {
        if data.remaining() < 12 {
            return Err(corruption(path, "truncated index entry".to_string()));
        }
        let key_len = data.get_u32_le() as usize;
        let offset = data.get_u64_le();
        if data.remaining() < key_len {
            return Err(corruption(path, "index key exceeds block".to_string()));
        }
        let key = data[..key_len].to_vec();
        data.advance(key_len);

        if let Some((prev, _)) = index.last() {
            if prev.as_slice() >= key.as_slice() {
                return Err(corruption(path, "index keys out of order".to_string()));
            }
        }
        index.push((key, offset));
    }
    Ok(index)
}

fn corruption(path: &Path, reason: String) -> StoreError {
    StoreError::Corruption(format!("{}: {}", path.display(), reason))
}
