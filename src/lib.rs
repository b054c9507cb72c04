//! fsmutex: inter-process mutual exclusion on filesystem paths.
//!
//! Processes that agree on a lock file path can serialize access to a shared
//! resource through either of two lock implementations:
//!
//! - [`locks::TokenLock`] creates the lock file exclusively and writes a
//!   timestamp token into it. Waiters can reclaim lock files left behind by
//!   crashed holders once the token is older than a configured threshold.
//! - [`locks::AdvisoryLock`] takes an OS advisory lock on the file and
//!   supports shared as well as exclusive mode.
//!
//! Both implement the [`locks::Lock`] trait. [`factory::LockFactory`] builds
//! configured handles for named locks in one directory.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod factory;
pub mod fs;
pub mod locks;

#[cfg(test)]
pub(crate) mod test_support;
