//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! Each entry goes to the file in one `write_all`, with no user-space buffer
//! in between, so a failed append can be cut back off the file:
//!   file.write_all()  → OS page cache
//!   file.sync_all()   → physical disk (per sync strategy)
//!
//! If an append fails partway, the file is truncated back to the end of the
//! last complete entry and the writer refuses further appends until it is
//! reopened. A batch reported as failed is never replayed by recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backend::Operation;
use crate::config::WalSyncStrategy;
use crate::error::{Result, StoreError};

use super::{WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// File length up to the end of the last complete entry
    len: u64,
    /// LSN of the last appended entry (0 = none yet)
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
    /// Set after a failed append; cleared only by reopening
    failed: bool,
}

impl WalWriter {
    /// Open or create a WAL file for appending.
    ///
    /// LSNs continue after the last valid entry already in the file.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let current_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            current_lsn,
            sync_strategy,
            unsynced: 0,
            failed: false,
        })
    }

    /// Append one entry holding `operations`, returning its LSN.
    ///
    /// The entry reaches the OS before this returns; whether it reaches the
    /// disk depends on the sync strategy. On error nothing of the entry is
    /// left in the file and the writer is failed.
    pub fn append_batch(&mut self, operations: Vec<Operation>) -> Result<u64> {
        if self.failed {
            return Err(StoreError::WalFailed);
        }

        let lsn = self.current_lsn + 1;
        let bytes = WalEntry::new(lsn, operations).serialize()?;

        if let Err(e) = self.write_frame(&bytes) {
            self.abandon_append();
            return Err(e);
        }

        self.len += bytes.len() as u64;
        self.current_lsn = lsn;
        Ok(lsn)
    }

    /// Append a single operation
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        self.append_batch(vec![operation])
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (their data is durable elsewhere). LSNs keep counting.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.len = 0;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// True once an append has failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Path of the WAL file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Cut a partially written entry back off the file and fail the writer
    fn abandon_append(&mut self) {
        self.failed = true;
        self.unsynced = 0;

        let rollback = self.file.set_len(self.len).and_then(|()| self.file.sync_all());
        match rollback {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                len = self.len,
                "WAL append failed, partial entry removed"
            ),
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "WAL append failed and the partial entry could not be removed"
            ),
        }
    }
}
