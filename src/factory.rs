//! Construction of configured lock handles.
//!
//! A [`LockFactory`] is rooted in one lock directory and hands out handles for
//! named locks in it, all sharing one [`Config`] and one orphan observer.
//!
//! ```no_run
//! use fsmutex::factory::LockFactory;
//! use fsmutex::locks::{Lock, LockMode};
//!
//! let factory = LockFactory::from_dir("/var/lock/myapp")?;
//! let mut lock = factory.token_lock("cache-rebuild")?;
//! lock.acquire(LockMode::Exclusive)?;
//! // ... protected work ...
//! lock.release()?;
//! # Ok::<(), fsmutex::error::LockError>(())
//! ```

use crate::config::Config;
use crate::error::{LockError, Result};
use crate::locks::{AdvisoryLock, Lock, OrphanObserver, TokenLock, TracingObserver};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Extension appended to lock names that have none.
pub const LOCK_EXTENSION: &str = "lock";

/// Which lock implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Exclusive-create lock with a freshness token.
    #[default]
    Token,
    /// OS advisory lock.
    Advisory,
}

/// Builds lock handles for named locks in one directory.
#[derive(Clone)]
pub struct LockFactory {
    lock_dir: PathBuf,
    config: Config,
    observer: Arc<dyn OrphanObserver>,
}

impl std::fmt::Debug for LockFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockFactory")
            .field("lock_dir", &self.lock_dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LockFactory {
    pub fn new(lock_dir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            lock_dir: lock_dir.into(),
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Create a factory using `fsmutex.yaml` from the lock directory, if any.
    pub fn from_dir(lock_dir: impl Into<PathBuf>) -> Result<Self> {
        let lock_dir = lock_dir.into();
        let config = Config::discover(&lock_dir)?;
        Ok(Self::new(lock_dir, config))
    }

    /// Observer handed to every token lock built by this factory.
    pub fn with_observer(mut self, observer: Arc<dyn OrphanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the lock file for `name`.
    ///
    /// Names are single path components; `.lock` is appended when the name
    /// has no extension.
    pub fn lock_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        let valid = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !valid {
            return Err(LockError::Configuration(format!(
                "invalid lock name '{}': must be a plain file name",
                name
            )));
        }

        let mut path = self.lock_dir.join(name);
        if path.extension().is_none() {
            path.set_extension(LOCK_EXTENSION);
        }
        Ok(path)
    }

    pub fn token_lock(&self, name: &str) -> Result<TokenLock> {
        let path = self.lock_path(name)?;
        Ok(TokenLock::with_config(path, self.config.token_lock)
            .with_observer(Arc::clone(&self.observer)))
    }

    pub fn advisory_lock(&self, name: &str) -> Result<AdvisoryLock> {
        let path = self.lock_path(name)?;
        Ok(AdvisoryLock::with_config(path, self.config.advisory))
    }

    /// Build a lock of the given kind behind the [`Lock`] contract.
    pub fn create(&self, name: &str, kind: LockKind) -> Result<Box<dyn Lock>> {
        Ok(match kind {
            LockKind::Token => Box::new(self.token_lock(name)?),
            LockKind::Advisory => Box::new(self.advisory_lock(name)?),
        })
    }
}
