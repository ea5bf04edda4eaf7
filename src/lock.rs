//! Process-wide advisory lock.
//!
//! Serialises backend processes that talk to monitors or write the detect
//! cache. The lock is released when the guard is dropped or the process
//! exits.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BackendError, Result};

/// Held exclusive lock on a lock file.
#[derive(Debug)]
pub struct ProcessLock {
    path: PathBuf,
    _file: File,
}

impl ProcessLock {
    /// Block until the exclusive lock on `path` is acquired.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_error = |e: std::io::Error| BackendError::Lock {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(lock_error)?;

        debug!(path = %path.display(), "Waiting for process lock");
        file.lock().map_err(lock_error)?;
        info!(path = %path.display(), "Acquired process lock");

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Released process lock");
    }
}
