//! Lock mode, token state and lock information structures.

use super::token::LockToken;
use serde::Serialize;
use std::path::PathBuf;

/// Requested access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// One holder at a time.
    #[default]
    Exclusive,
    /// Any number of shared holders, no exclusive holder.
    /// Only honored by [`AdvisoryLock`](super::AdvisoryLock).
    Shared,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Exclusive => "exclusive",
            LockMode::Shared => "shared",
        }
    }
}

/// What the content of a lock file says about its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// A timestamp younger than the staleness threshold.
    Fresh,
    /// A timestamp older than the staleness threshold.
    Stale,
    /// Empty or non-numeric content.
    Unverifiable,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenState::Fresh => "fresh",
            TokenState::Stale => "stale",
            TokenState::Unverifiable => "unverifiable",
        }
    }

    /// Whether an orphan check would reclaim a file in this state.
    pub fn is_orphan(&self) -> bool {
        !matches!(self, TokenState::Fresh)
    }
}

/// Information about an existing lock file.
#[derive(Debug, Clone, Serialize)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// The lock name (file name of the lock file).
    pub name: String,

    /// Raw file content, trimmed.
    pub content: String,

    /// The parsed token, if the content is a timestamp.
    pub token: Option<LockToken>,

    /// Classification of the token.
    pub state: TokenState,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "{} (age: {}, {})",
                self.name,
                token.age_string(),
                self.state.as_str()
            ),
            None => write!(f, "{} ({})", self.name, self.state.as_str()),
        }
    }
}
