//! RAII lock guard implementation.

use crate::error::{RepokitError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// RAII guard for a lock file; the file is deleted when the guard drops.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now and report a failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| {
            RepokitError::LockError(format!(
                "failed to release lock '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            warn!(lock = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}
