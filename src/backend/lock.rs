//! Directory Lock
//!
//! Single-writer guard for a store directory: an exclusive OS file lock on
//! `<dir>/LOCK`, held for the lifetime of the backend.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Lock file name inside every disk-backed store directory
pub const LOCK_FILENAME: &str = "LOCK";

/// Exclusive lock on a store directory, released on drop
#[derive(Debug)]
pub struct DirLock {
    file: File,
    dir: PathBuf,
}

impl DirLock {
    /// Create `dir` if needed and take the lock without blocking.
    ///
    /// Fails with `Locked` when any other handle, in this process or another,
    /// already holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(dir.join(LOCK_FILENAME))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(StoreError::Locked(dir.to_path_buf())),
            Err(TryLockError::Error(e)) => return Err(StoreError::Io(e)),
        }

        Ok(Self {
            file,
            dir: dir.to_path_buf(),
        })
    }

    /// The locked directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to release store lock");
        }
    }
}
