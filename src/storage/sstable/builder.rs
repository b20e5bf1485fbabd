//! SSTable Builder
//!
//! Writes sorted records to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::BufMut;

use crate::error::Result;
use crate::memtable::Record;

use super::{SSTable, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Builder for creating new SSTables from sorted records
pub struct SSTableBuilder {
    path: PathBuf,
    writer: BufWriter<File>,
    entry_count: u64,
    /// Offset the next entry will be written at
    offset: u64,
    /// Index: key → file offset of entry, in insertion (sorted) order
    index: Vec<(Vec<u8>, u64)>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
    /// Scratch buffer for one encoded entry
    scratch: Vec<u8>,
}

impl SSTableBuilder {
    /// Create a new SSTable builder
    ///
    /// Writes the header immediately; call `add()`/`add_tombstone()` in sorted
    /// order, then `finish()` to write index and footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        let mut header = Vec::with_capacity(HEADER_SIZE as usize);
        header.put_slice(MAGIC);
        header.put_u16_le(VERSION);
        header.put_u64_le(0); // entry count, patched in finish()
        writer.write_all(&header)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            offset: HEADER_SIZE,
            index: Vec::new(),
            data_hasher: crc32fast::Hasher::new(),
            scratch: Vec::new(),
        })
    }

    /// Add a key-value pair (must be called in sorted key order)
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_entry(key, Some(value))
    }

    /// Add a tombstone (must be called in sorted key order)
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.write_entry(key, None)
    }

    /// Add a memtable record (must be called in sorted key order)
    pub fn add_record(&mut self, key: &[u8], record: &Record) -> Result<()> {
        self.write_entry(key, record.value())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Encode `[key_len][val_len][key][value]`; `None` value is a tombstone
    fn write_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let val_len = value.map_or(TOMBSTONE_MARKER, |v| v.len() as u32);

        self.scratch.clear();
        self.scratch.put_u32_le(key.len() as u32);
        self.scratch.put_u32_le(val_len);
        self.scratch.put_slice(key);
        if let Some(v) = value {
            self.scratch.put_slice(v);
        }

        self.writer.write_all(&self.scratch)?;
        self.data_hasher.update(&self.scratch);

        self.index.push((key.to_vec(), self.offset));
        self.offset += self.scratch.len() as u64;
        self.entry_count += 1;

        Ok(())
    }

    /// Finish building: write index block, footer, and return metadata
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.offset;

        // Index block: [key_len(4)][offset(8)][key] for each entry
        let mut index_block = Vec::new();
        for (key, offset) in &self.index {
            index_block.put_u32_le(key.len() as u32);
            index_block.put_u64_le(*offset);
            index_block.put_slice(key);
        }
        self.writer.write_all(&index_block)?;

        // Footer: index_offset (8) + data_crc (4) + padding (4)
        let data_crc = self.data_hasher.clone().finalize();
        let mut footer = Vec::with_capacity(16);
        footer.put_u64_le(index_offset);
        footer.put_u32_le(data_crc);
        footer.put_u32_le(0);
        self.writer.write_all(&footer)?;
        self.writer.flush()?;

        // Patch the entry count in the header, then make it all durable
        let mut file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(MAGIC.len() as u64 + 2))?;
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        let min_key = self.index.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let max_key = self.index.last().map(|(k, _)| k.clone()).unwrap_or_default();

        Ok(SSTable {
            path: self.path,
            entry_count: self.entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}
