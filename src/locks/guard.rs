//! RAII lock guard implementation.

use super::Lock;
use super::types::LockMode;
use crate::error::Result;
use std::path::Path;

/// Scoped acquisition of any [`Lock`].
///
/// The lock is held for as long as the guard lives. When dropped, the lock is
/// released; if that fails, a warning is logged but no panic occurs. Use
/// [`LockGuard::release`] to observe release failures.
pub struct LockGuard<'a, L: Lock + ?Sized> {
    lock: &'a mut L,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a, L: Lock + ?Sized> LockGuard<'a, L> {
    /// Block until `lock` is acquired.
    pub fn acquire(lock: &'a mut L, mode: LockMode) -> Result<Self> {
        lock.acquire(mode)?;
        Ok(Self {
            lock,
            released: false,
        })
    }

    /// Single non-blocking attempt; `Ok(None)` if the lock is held elsewhere.
    pub fn try_acquire(lock: &'a mut L, mode: LockMode) -> Result<Option<Self>> {
        if !lock.acquire_nb(mode)? {
            return Ok(None);
        }
        Ok(Some(Self {
            lock,
            released: false,
        }))
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        self.lock.path()
    }

    /// Manually release the lock.
    ///
    /// This is useful when you want to release the lock before the guard
    /// goes out of scope, and want to handle errors explicitly.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.lock.release()
    }
}

impl<L: Lock + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        if !self.released
            && self.lock.is_active()
            && let Err(e) = self.lock.release()
        {
            tracing::warn!(
                path = %self.lock.path().display(),
                error = %e,
                "failed to release lock"
            );
        }
    }
}
