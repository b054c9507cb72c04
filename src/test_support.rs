use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A temporary lock directory, optionally seeded with an `fsmutex.yaml`.
pub(crate) fn create_lock_dir(config_yaml: Option<&str>) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    if let Some(yaml) = config_yaml {
        std::fs::write(temp_dir.path().join(crate::config::CONFIG_FILE_NAME), yaml).unwrap();
    }
    temp_dir
}

/// Write a lock file holding a token `age_secs` seconds old.
pub(crate) fn write_token_file(path: &Path, age_secs: i64) {
    let created_at = chrono::Utc::now() - chrono::Duration::seconds(age_secs);
    let token = crate::locks::LockToken::from_datetime(created_at);
    std::fs::write(path, token.as_str()).unwrap();
}
