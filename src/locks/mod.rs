//! Locking subsystem for fsmutex.
//!
//! Two independent implementations of the [`Lock`] contract:
//!
//! - [`TokenLock`]: the lock file is created with **create_new** semantics
//!   (exclusive create), so only one process can hold it at a time. The file
//!   contains the acquisition time as a token, which lets waiters reclaim
//!   files left behind by crashed holders and lets the holder verify on
//!   release that the file is still its own.
//! - [`AdvisoryLock`]: an OS advisory lock (`flock`-style) on the file,
//!   supporting both exclusive and shared mode.
//!
//! # RAII
//!
//! Both handles release on drop, swallowing errors. [`LockGuard`] scopes an
//! acquisition to a block; call [`Lock::release`] or [`LockGuard::release`]
//! to observe release failures.

mod advisory;
mod guard;
pub mod inspect;
mod observer;
mod token;
mod token_lock;
mod types;


use crate::error::Result;
use std::path::Path;

// Re-export public API
pub use advisory::AdvisoryLock;
pub use guard::LockGuard;
pub use observer::{OrphanEvent, OrphanObserver, TracingObserver};
pub use token::LockToken;
pub use token_lock::TokenLock;
pub use types::{LockInfo, LockMode, TokenState};

/// Inter-process mutual exclusion on a filesystem path.
///
/// Contention is never an error: [`Lock::acquire_nb`] reports it as
/// `Ok(false)`. Any other failure is returned as a [`LockError`](crate::error::LockError).
pub trait Lock: Send {
    /// Block until the lock is obtained.
    ///
    /// Fails with [`LockError::Timeout`](crate::error::LockError::Timeout) if
    /// the implementation gives up waiting, and with an operation error for
    /// anything else, including acquiring a lock this handle already holds.
    fn acquire(&mut self, mode: LockMode) -> Result<()>;

    /// Single non-blocking attempt.
    fn acquire_nb(&mut self, mode: LockMode) -> Result<bool>;

    /// Whether this handle believes it holds the lock.
    fn is_active(&self) -> bool;

    /// Release a held lock.
    ///
    /// Returns `Ok(false)` if this handle does not hold the lock.
    fn release(&mut self) -> Result<bool>;

    /// The lock file path.
    fn path(&self) -> &Path;
}
