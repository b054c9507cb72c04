//! Exclusive-create lock with a freshness token.
//!
//! Acquiring publishes the lock file together with a [`LockToken`]: the token
//! is staged in a temporary file and linked into place only if no lock file
//! exists yet. The token serves two purposes:
//!
//! - **Orphan detection**: a lock file whose token is older than the
//!   configured threshold (or unverifiable) was most likely left behind by a
//!   crashed holder and may be deleted by a waiting process.
//! - **Ownership verification**: release only deletes the file if it still
//!   holds the exact token this handle wrote. A slow holder whose lock was
//!   reclaimed therefore gets an error instead of deleting the lock of the
//!   process that reclaimed it.
//!
//! # Known limitation
//!
//! Release reads the token and then deletes the file. Another process can
//! reclaim the file between these two steps. Closing this window would need
//! a delete-if-content-matches primitive the filesystem does not offer.

use super::Lock;
use super::observer::{OrphanEvent, OrphanObserver, TracingObserver};
use super::token::LockToken;
use super::types::LockMode;
use crate::config::TokenLockConfig;
use crate::error::{LockError, Result};
use crate::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// A lock held by the existence of a file carrying this handle's token.
pub struct TokenLock {
    path: PathBuf,
    config: TokenLockConfig,
    observer: Arc<dyn OrphanObserver>,
    /// Token written by this handle while it holds the lock.
    token: Option<LockToken>,
}

impl std::fmt::Debug for TokenLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLock")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl TokenLock {
    /// Create a handle with the default policy.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, TokenLockConfig::default())
    }

    /// Create a handle with the given policy.
    pub fn with_config(path: impl Into<PathBuf>, config: TokenLockConfig) -> Self {
        Self {
            path: path.into(),
            config,
            observer: Arc::new(TracingObserver),
            token: None,
        }
    }

    /// Replace the observer notified about orphan reclaims.
    pub fn with_observer(mut self, observer: Arc<dyn OrphanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &TokenLockConfig {
        &self.config
    }

    /// The token this handle wrote, while it holds the lock.
    pub fn token(&self) -> Option<&LockToken> {
        self.token.as_ref()
    }

    /// Check the existing lock file and delete it if it is orphaned.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The file was orphaned and is gone now
    /// * `Ok(false)` - The file holds a fresh token, could not be read, or
    ///   was replaced by a new lock while being reclaimed
    /// * `Err(LockError::OperationFailed)` - The orphan could not be deleted
    pub fn check_for_orphan(&self) -> Result<bool> {
        let content = match fs::read_contents(&self.path) {
            Ok(Some(content)) => content,
            // Released in the meantime; the next create attempt will tell.
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read lock file for orphan check"
                );
                return Ok(false);
            }
        };

        let token = LockToken::parse(&content);
        if let Some(token) = &token
            && !token.is_stale(self.config.orphan_timeout_secs)
        {
            return Ok(false);
        }

        if self.config.orphan_warning {
            self.observer.orphan_detected(&OrphanEvent {
                path: self.path.clone(),
                content: content.trim().to_string(),
                age_secs: token.as_ref().map(|t| t.age().num_seconds()),
                timeout_secs: self.config.orphan_timeout_secs,
            });
        }

        // Only delete the exact file that was judged: another waiter may
        // have reclaimed it and taken the lock since it was read.
        fs::remove_if_unchanged(&self.path, &content).map_err(|e| {
            LockError::io(
                format!(
                    "could not delete orphan lock file: {}",
                    self.path.display()
                ),
                e,
            )
        })
    }

    /// Validate everything that must hold before the first attempt.
    fn precheck(&self, mode: LockMode) -> Result<()> {
        if mode == LockMode::Shared {
            return Err(LockError::Configuration(format!(
                "shared mode is not supported by token locks: {}",
                self.path.display()
            )));
        }

        self.config.validate()?;

        if self.is_active() {
            return Err(LockError::operation(format!(
                "lock is already held by this handle: {}",
                self.path.display()
            )));
        }

        Ok(())
    }

    /// Single exclusive-create attempt.
    ///
    /// The lock file appears on disk with its token already in it, so a
    /// waiter can never mistake a lock in the middle of being taken for an
    /// unverifiable orphan.
    fn try_create(&mut self) -> Result<bool> {
        fs::check_lock_location(&self.path)?;

        let token = LockToken::now();
        let created = fs::publish_exclusive(&self.path, token.as_str().as_bytes()).map_err(|e| {
            LockError::io(
                format!("could not write time to lock file: {}", self.path.display()),
                e,
            )
        })?;
        if !created {
            return Ok(false);
        }

        tracing::debug!(path = %self.path.display(), token = %token, "acquired token lock");
        self.token = Some(token);
        Ok(true)
    }

    /// Attempt number `attempt` (1-based): create, with an orphan check and
    /// one immediate retry if this is the configured check attempt.
    fn attempt(&mut self, attempt: u32) -> Result<bool> {
        if self.try_create()? {
            return Ok(true);
        }

        if self.config.orphan_check_attempt == Some(attempt) && self.check_for_orphan()? {
            return self.try_create();
        }

        Ok(false)
    }

    /// Release after the token has been verified.
    fn delete_verified(&mut self) -> Result<bool> {
        match fs::remove_if_exists(&self.path) {
            Ok(true) => {
                tracing::debug!(path = %self.path.display(), "released token lock");
                self.token = None;
                Ok(true)
            }
            Ok(false) => {
                self.token = None;
                Err(LockError::operation(format!(
                    "could not release lock. Lock file: {} disappeared after verification",
                    self.path.display()
                )))
            }
            Err(e) => Err(LockError::io(
                format!("could not release lock. Lock file: {}", self.path.display()),
                e,
            )),
        }
    }
}

impl Lock for TokenLock {
    /// Shared mode is rejected with a configuration error.
    fn acquire(&mut self, mode: LockMode) -> Result<()> {
        self.precheck(mode)?;

        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            if self.attempt(attempt)? {
                return Ok(());
            }
            if attempt < max_attempts {
                thread::sleep(self.config.delay());
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            attempts = max_attempts,
            "token lock acquire timed out"
        );
        Err(LockError::Timeout {
            attempts: max_attempts,
            delay_us: self.config.delay_us,
        })
    }

    fn acquire_nb(&mut self, mode: LockMode) -> Result<bool> {
        self.precheck(mode)?;
        self.attempt(1)
    }

    fn is_active(&self) -> bool {
        self.token.is_some()
    }

    fn release(&mut self) -> Result<bool> {
        let Some(token) = self.token.as_ref() else {
            return Ok(false);
        };

        match fs::read_contents(&self.path) {
            Ok(None) => {
                self.token = None;
                Err(LockError::operation(format!(
                    "could not release lock. Lock file did not exist: {}",
                    self.path.display()
                )))
            }
            Ok(Some(content)) if content.trim() != token.as_str() => {
                self.token = None;
                Err(LockError::operation(format!(
                    "could not release lock. Lock was overwritten by other lock: {}",
                    self.path.display()
                )))
            }
            Ok(Some(_)) => self.delete_verified(),
            Err(e) => Err(LockError::io(
                format!(
                    "could not release lock. Failed to read lock file: {}",
                    self.path.display()
                ),
                e,
            )),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TokenLock {
    fn drop(&mut self) {
        if self.is_active()
            && let Err(e) = self.release()
        {
            tracing::debug!(path = %self.path.display(), error = %e, "implicit release failed");
        }
    }
}
