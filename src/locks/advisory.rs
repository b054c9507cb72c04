//! OS advisory file lock.
//!
//! Uses fs2 (`flock` on Unix, `LockFileEx` on Windows) on a file opened for
//! writing. The lock belongs to the open file handle, so it is released when
//! the handle is closed, including when the process dies.

use super::Lock;
use super::types::LockMode;
use crate::config::AdvisoryConfig;
use crate::error::{LockError, Result};
use crate::fs;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// A lock held through the operating system's advisory locking.
#[derive(Debug)]
pub struct AdvisoryLock {
    path: PathBuf,
    config: AdvisoryConfig,
    /// Open handle carrying the OS lock.
    file: Option<File>,
    mode: Option<LockMode>,
}

impl AdvisoryLock {
    /// Create a handle that keeps the backing file on release.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, AdvisoryConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: AdvisoryConfig) -> Self {
        Self {
            path: path.into(),
            config,
            file: None,
            mode: None,
        }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Mode of the currently held lock.
    pub fn mode(&self) -> Option<LockMode> {
        self.mode
    }

    fn ensure_inactive(&self) -> Result<()> {
        if self.is_active() {
            return Err(LockError::operation(format!(
                "advisory lock is already active: {}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn open(&self) -> Result<File> {
        fs::check_lock_location(&self.path)?;

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                LockError::io(
                    format!("failed to open lock file: {}", self.path.display()),
                    e,
                )
            })
    }

    fn hold(&mut self, file: File, mode: LockMode) {
        tracing::debug!(path = %self.path.display(), mode = mode.as_str(), "acquired advisory lock");
        self.file = Some(file);
        self.mode = Some(mode);
    }
}

/// Whether a non-blocking lock call failed only because someone else holds it.
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || (err.raw_os_error().is_some()
            && err.raw_os_error() == fs2::lock_contended_error().raw_os_error())
}

impl Lock for AdvisoryLock {
    fn acquire(&mut self, mode: LockMode) -> Result<()> {
        self.ensure_inactive()?;
        let file = self.open()?;

        // Method syntax would pick up std's inherent `File` locking methods.
        let locked = match mode {
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
            LockMode::Shared => FileExt::lock_shared(&file),
        };
        locked.map_err(|e| {
            LockError::io(
                format!("failed to acquire advisory lock: {}", self.path.display()),
                e,
            )
        })?;

        self.hold(file, mode);
        Ok(())
    }

    fn acquire_nb(&mut self, mode: LockMode) -> Result<bool> {
        self.ensure_inactive()?;
        let file = self.open()?;

        let locked = match mode {
            LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            LockMode::Shared => FileExt::try_lock_shared(&file),
        };
        match locked {
            Ok(()) => {
                self.hold(file, mode);
                Ok(true)
            }
            Err(e) if is_contended(&e) => Ok(false),
            Err(e) => Err(LockError::io(
                format!("failed to acquire advisory lock: {}", self.path.display()),
                e,
            )),
        }
    }

    fn is_active(&self) -> bool {
        self.file.is_some()
    }

    fn release(&mut self) -> Result<bool> {
        let Some(file) = self.file.take() else {
            return Ok(false);
        };
        self.mode = None;

        // Closing the handle releases the lock; unlocking first just makes it explicit.
        if let Err(e) = FileExt::unlock(&file) {
            tracing::debug!(path = %self.path.display(), error = %e, "explicit unlock failed");
        }
        drop(file);
        tracing::debug!(path = %self.path.display(), "released advisory lock");

        if self.config.remove_lock_file
            && let Err(e) = fs::remove_if_exists(&self.path)
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove advisory lock file"
            );
        }

        Ok(true)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AdvisoryLock {
    fn drop(&mut self) {
        if self.is_active()
            && let Err(e) = self.release()
        {
            tracing::debug!(path = %self.path.display(), error = %e, "implicit release failed");
        }
    }
}
