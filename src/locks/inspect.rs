//! Lock file inspection, listing, and clearing operations.
//!
//! These operate on lock files directly, without holding them, and are meant
//! for operators diagnosing stuck locks.

use super::token::LockToken;
use super::types::{LockInfo, TokenState};
use crate::error::{LockError, Result};
use crate::fs;
use globset::Glob;
use std::path::Path;

/// Default pattern for [`list_locks`].
pub const DEFAULT_LOCK_PATTERN: &str = "*.lock";

/// Classify file content against a staleness threshold.
pub fn classify(content: &str, orphan_timeout_secs: u64) -> (Option<LockToken>, TokenState) {
    match LockToken::parse(content) {
        Some(token) if token.is_stale(orphan_timeout_secs) => (Some(token), TokenState::Stale),
        Some(token) => (Some(token), TokenState::Fresh),
        None => (None, TokenState::Unverifiable),
    }
}

/// Inspect a single lock file.
///
/// # Returns
///
/// * `Ok(Some(LockInfo))` - The lock file exists
/// * `Ok(None)` - There is no lock file at `path`
/// * `Err(LockError::OperationFailed)` - The file exists but could not be read
pub fn inspect_lock(path: &Path, orphan_timeout_secs: u64) -> Result<Option<LockInfo>> {
    let content = fs::read_contents(path).map_err(|e| {
        LockError::io(format!("failed to read lock file '{}'", path.display()), e)
    })?;

    Ok(content.map(|content| {
        let content = content.trim().to_string();
        let (token, state) = classify(&content, orphan_timeout_secs);
        LockInfo {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content,
            token,
            state,
        }
    }))
}

/// List all lock files in `dir` whose file name matches `pattern`.
///
/// A missing directory yields an empty list.
pub fn list_locks(dir: &Path, pattern: &str, orphan_timeout_secs: u64) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !dir.exists() {
        return Ok(locks);
    }

    let matcher = Glob::new(pattern)
        .map_err(|e| LockError::UserError(format!("invalid lock pattern '{}': {}", pattern, e)))?
        .compile_matcher();

    let entries = std::fs::read_dir(dir).map_err(|e| {
        LockError::io(format!("failed to read lock directory '{}'", dir.display()), e)
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| LockError::io("failed to read lock directory entry", e))?;
        let path = entry.path();

        if !path.is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }

        // Released between read_dir and read: nothing to report.
        if let Some(info) = inspect_lock(&path, orphan_timeout_secs)? {
            locks.push(info);
        }
    }

    // Sort by name for consistent output
    locks.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(locks)
}

/// Delete a lock file on operator request.
///
/// With `stale_only`, a lock file whose token is still fresh is left alone.
/// The caller is responsible for confirming that clearing is appropriate.
///
/// # Returns
///
/// * `Ok(LockInfo)` - Information about the cleared lock (for audit purposes)
/// * `Err(LockError::UserError)` - No lock file, or refused because it is fresh
pub fn clear_lock(path: &Path, orphan_timeout_secs: u64, stale_only: bool) -> Result<LockInfo> {
    let info = inspect_lock(path, orphan_timeout_secs)?.ok_or_else(|| {
        LockError::UserError(format!("lock does not exist at: {}", path.display()))
    })?;

    if stale_only && !info.state.is_orphan() {
        return Err(LockError::UserError(format!(
            "refusing to clear fresh lock '{}' (age: {})",
            path.display(),
            info.token
                .as_ref()
                .map(LockToken::age_string)
                .unwrap_or_default()
        )));
    }

    fs::remove_if_exists(path).map_err(|e| {
        LockError::io(format!("failed to clear lock '{}'", path.display()), e)
    })?;

    tracing::info!(path = %path.display(), state = info.state.as_str(), "cleared lock file");
    Ok(info)
}
