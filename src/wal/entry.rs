//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::backend::Operation;
use crate::error::{Result, StoreError};

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single payload, guards against garbage length fields
pub const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// A single entry in the WAL: every operation of one committed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Operations applied together
    pub operations: Vec<Operation>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    /// Decode a header from exactly `HEADER_SIZE` bytes
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(StoreError::WalCorruption(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }
        let lsn = buf.get_u64_le();
        let crc = buf.get_u32_le();
        let len = buf.get_u32_le();
        if len > MAX_PAYLOAD_SIZE {
            return Err(StoreError::WalCorruption(format!(
                "payload length {} exceeds limit",
                len
            )));
        }
        Ok(Self { lsn, crc, len })
    }
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            lsn,
            operations,
            timestamp,
        }
    }

    /// Encode as `[LSN][CRC][Len][payload]`, CRC computed over the payload
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_u64_le(self.lsn);
        buf.put_u32_le(crc32fast::hash(&payload));
        buf.put_u32_le(payload.len() as u32);
        buf.put_slice(&payload);

        Ok(buf.to_vec())
    }

    /// Decode one framed entry, verifying length, CRC and LSN
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::decode(bytes)?;
        let end = HEADER_SIZE + header.len as usize;
        if bytes.len() < end {
            return Err(StoreError::WalCorruption(format!(
                "entry truncated: need {} bytes, got {}",
                end,
                bytes.len()
            )));
        }
        Self::decode_payload(&header, &bytes[HEADER_SIZE..end])
    }

    /// Decode the payload that follows an already-parsed header
    pub fn decode_payload(header: &FrameHeader, payload: &[u8]) -> Result<Self> {
        let computed = crc32fast::hash(payload);
        if computed != header.crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:#010x}, computed {:#010x}",
                header.lsn, header.crc, computed
            )));
        }

        let entry: WalEntry = bincode::deserialize(payload)?;
        if entry.lsn != header.lsn {
            return Err(StoreError::WalCorruption(format!(
                "LSN mismatch: header {}, payload {}",
                header.lsn, entry.lsn
            )));
        }
        Ok(entry)
    }

    /// Size of this entry on disk
    pub fn encoded_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + bincode::serialized_size(self)? as usize)
    }
}
