//! Filesystem primitives used by the lock implementations.
//!
//! Everything here is a thin wrapper over `std::fs` that maps the one
//! interesting error kind of each call (`AlreadyExists` on create,
//! `NotFound` on read/delete) to a plain value, so callers can tell
//! contention and races apart from real I/O failures.
//!
//! Lock files are never visible half-written: content is staged in a
//! temporary file in the same directory and only then linked into place.

use crate::error::{LockError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name prefix of staging files next to lock files.
const STAGING_PREFIX: &str = ".fsmutex-";

/// Parent directory of a lock path, with `.` standing in for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check that a lock file can live at `path`.
///
/// # Returns
///
/// * `Ok(())` - The path is not a directory and its parent is a writable directory
/// * `Err(LockError::Configuration)` - The location is unusable
pub fn check_lock_location(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(LockError::Configuration(format!(
            "lock file location is a directory: {}",
            path.display()
        )));
    }

    let parent = parent_dir(path);
    if !parent.is_dir() {
        return Err(LockError::Configuration(format!(
            "parent directory for lock file does not exist: {}",
            parent.display()
        )));
    }

    let metadata = fs::metadata(&parent).map_err(|e| {
        LockError::Configuration(format!(
            "failed to inspect lock directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if metadata.permissions().readonly() {
        return Err(LockError::Configuration(format!(
            "lock file location is not writable: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create `path` exclusively with `content`.
///
/// The content is written and synced to a staging file first, then the
/// staging file is persisted without replacing an existing file. The lock
/// file therefore never exists without its full content.
///
/// Returns `Ok(false)` if the file already exists.
pub fn publish_exclusive(path: &Path, content: &[u8]) -> io::Result<bool> {
    let mut staged = staging_file(path)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;

    // Dropping the returned error also removes the staging file.
    match staged.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}

/// Delete `path` only if it still holds exactly `expected`.
///
/// The file is moved to a staging name before it is compared, so the
/// comparison and the delete see the same file. A file with other content
/// is linked back into place.
///
/// # Returns
///
/// * `Ok(true)` - The file is gone (deleted here, or already missing)
/// * `Ok(false)` - The file held other content and was left in place
pub fn remove_if_unchanged(path: &Path, expected: &str) -> io::Result<bool> {
    let aside = staging_file(path)?.into_temp_path();

    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    }

    let unchanged = match fs::read(&aside) {
        Ok(content) => content == expected.as_bytes(),
        Err(e) => {
            let _ = fs::hard_link(&aside, path);
            return Err(e);
        }
    };

    if unchanged {
        aside.close()?;
        return Ok(true);
    }

    match fs::hard_link(&aside, path) {
        Ok(()) => {}
        // A new lock was created while the file was moved aside.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::warn!(
                path = %path.display(),
                "lock file changed during orphan reclaim and could not be put back"
            );
        }
        Err(e) => return Err(e),
    }
    Ok(false)
}

fn staging_file(path: &Path) -> io::Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".tmp")
        .tempfile_in(parent_dir(path))?;

    // Staging files are private; lock files must be readable by other users.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    Ok(file)
}

/// Read a file to a string.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_contents(path: &Path) -> io::Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete a file.
///
/// Returns `Ok(false)` if there was nothing to delete.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
