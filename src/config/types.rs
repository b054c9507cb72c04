//! Lock policy value objects and their defaults.
//!
//! Both structs are plain values: a lock handle copies the policy it was
//! built with and never changes it afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of acquire attempts (15s at the default delay).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;

/// Default sleep between failed attempts, in microseconds.
pub const DEFAULT_DELAY_US: u64 = 25_000;

/// Default attempt number at which the orphan check runs.
pub const DEFAULT_ORPHAN_CHECK_ATTEMPT: u32 = 1;

/// Default token age, in seconds, after which a lock file counts as abandoned.
pub const DEFAULT_ORPHAN_TIMEOUT_SECS: u64 = 120;

/// Acquisition policy for a [`TokenLock`](crate::locks::TokenLock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLockConfig {
    /// Total tries before a blocking acquire times out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Sleep between failed attempts (microseconds).
    #[serde(default = "default_delay_us")]
    pub delay_us: u64,

    /// Attempt number at which the existing token is checked for staleness.
    /// `None` disables orphan detection entirely.
    #[serde(default = "default_orphan_check_attempt")]
    pub orphan_check_attempt: Option<u32>,

    /// Token age (seconds) beyond which a lock file is considered abandoned.
    #[serde(default = "default_orphan_timeout_secs")]
    pub orphan_timeout_secs: u64,

    /// Whether reclaiming an orphan is reported to the observer.
    #[serde(default = "default_true")]
    pub orphan_warning: bool,
}

impl Default for TokenLockConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_us: default_delay_us(),
            orphan_check_attempt: default_orphan_check_attempt(),
            orphan_timeout_secs: default_orphan_timeout_secs(),
            orphan_warning: default_true(),
        }
    }
}

impl TokenLockConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay_us(mut self, delay_us: u64) -> Self {
        self.delay_us = delay_us;
        self
    }

    pub fn with_orphan_check_attempt(mut self, attempt: Option<u32>) -> Self {
        self.orphan_check_attempt = attempt;
        self
    }

    pub fn with_orphan_timeout_secs(mut self, secs: u64) -> Self {
        self.orphan_timeout_secs = secs;
        self
    }

    pub fn with_orphan_warning(mut self, enabled: bool) -> Self {
        self.orphan_warning = enabled;
        self
    }

    /// Sleep between failed attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_micros(self.delay_us)
    }
}

/// Policy for an [`AdvisoryLock`](crate::locks::AdvisoryLock).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Delete the backing file after releasing the OS lock.
    ///
    /// Off by default: deleting while another process opens the same path
    /// can make that process fail with a spurious permission error.
    pub remove_lock_file: bool,
}

impl AdvisoryConfig {
    pub fn with_remove_lock_file(mut self, remove: bool) -> Self {
        self.remove_lock_file = remove;
        self
    }
}

// Default value functions for serde
pub(crate) fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
pub(crate) fn default_delay_us() -> u64 {
    DEFAULT_DELAY_US
}
pub(crate) fn default_orphan_check_attempt() -> Option<u32> {
    Some(DEFAULT_ORPHAN_CHECK_ATTEMPT)
}
pub(crate) fn default_orphan_timeout_secs() -> u64 {
    DEFAULT_ORPHAN_TIMEOUT_SECS
}
pub(crate) fn default_true() -> bool {
    true
}
