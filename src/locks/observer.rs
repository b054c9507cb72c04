//! Orphan reclaim notifications.
//!
//! A [`TokenLock`](super::TokenLock) that deletes an abandoned lock file
//! reports it through an [`OrphanObserver`] handed to it at construction.
//! The default observer logs a warning via `tracing`.

use serde::Serialize;
use std::path::PathBuf;

/// An abandoned lock file that is about to be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanEvent {
    /// The lock file path.
    pub path: PathBuf,

    /// Trimmed file content at the time of the check.
    pub content: String,

    /// Seconds since the token was written, if the content is a token.
    pub age_secs: Option<i64>,

    /// The staleness threshold that was exceeded.
    pub timeout_secs: u64,
}

impl std::fmt::Display for OrphanEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "detected an orphan lock file and will remove it: {}; ",
            self.path.display()
        )?;
        match self.age_secs {
            Some(age) => write!(f, "seconds since creation: {}", age)?,
            None => write!(f, "unverifiable content: '{}'", self.content)?,
        }
        write!(f, "; timeout seconds: {}", self.timeout_secs)
    }
}

/// Receives orphan reclaim notifications.
pub trait OrphanObserver: Send + Sync {
    fn orphan_detected(&self, event: &OrphanEvent);
}

impl<F> OrphanObserver for F
where
    F: Fn(&OrphanEvent) + Send + Sync,
{
    fn orphan_detected(&self, event: &OrphanEvent) {
        self(event)
    }
}

/// Logs orphan reclaims as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl OrphanObserver for TracingObserver {
    fn orphan_detected(&self, event: &OrphanEvent) {
        tracing::warn!(
            path = %event.path.display(),
            age_secs = ?event.age_secs,
            timeout_secs = event.timeout_secs,
            "{}",
            event
        );
    }
}
