//! Tests for command dispatch and command behavior.

use super::*;
use crate::config::TokenLockConfig;
use crate::error::LockError;
use crate::exit_codes;
use crate::locks::inspect::inspect_lock;
use crate::locks::{Lock, LockMode, TokenLock, TokenState};
use crate::test_support::{DirGuard, create_lock_dir, write_token_file};
use clap::Parser;
use serial_test::serial;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn run(args: &[&str]) -> Result<i32> {
    let mut argv = vec!["fsmutex"];
    argv.extend_from_slice(args);
    dispatch(Cli::try_parse_from(argv).unwrap())
}

fn path_arg(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Config resolution
// ============================================================================

#[test]
fn test_resolve_config_discovers_file_in_dir() {
    let temp_dir = create_lock_dir(Some("token_lock:\n  max_attempts: 7\n"));

    let config = resolve_config(None, temp_dir.path()).unwrap();
    assert_eq!(config.token_lock.max_attempts, 7);
}

#[test]
fn test_resolve_config_prefers_explicit_file() {
    let temp_dir = create_lock_dir(Some("token_lock:\n  max_attempts: 7\n"));
    let explicit = temp_dir.path().join("other.yaml");
    std::fs::write(&explicit, "token_lock:\n  max_attempts: 3\n").unwrap();

    let config = resolve_config(Some(&explicit), temp_dir.path()).unwrap();
    assert_eq!(config.token_lock.max_attempts, 3);
}

#[test]
fn test_resolve_config_missing_explicit_file_is_config_error() {
    let temp_dir = create_lock_dir(None);
    let missing = temp_dir.path().join("missing.yaml");

    let err = resolve_config(Some(&missing), temp_dir.path()).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
}

#[test]
fn test_invalid_discovered_config_fails_command() {
    let temp_dir = create_lock_dir(Some("token_lock:\n  max_attempts: 0\n"));
    let lock_path = temp_dir.path().join("job.lock");

    let err = run(&["try", &path_arg(&lock_path)]).unwrap_err();
    assert!(matches!(err, LockError::Configuration(_)));
}

#[test]
#[serial]
fn test_relative_lock_uses_config_from_cwd() {
    let temp_dir = create_lock_dir(Some("token_lock:\n  orphan_check_attempt: null\n"));
    let _guard = DirGuard::new(temp_dir.path());
    write_token_file(&temp_dir.path().join("job.lock"), 10_000);

    // Without orphan checks the stale file is not reclaimed.
    let code = run(&["try", "job.lock"]).unwrap();
    assert_eq!(code, exit_codes::LOCK_CONTENDED);
    assert!(temp_dir.path().join("job.lock").exists());
}

// ============================================================================
// try
// ============================================================================

#[test]
fn test_try_free_lock_succeeds_and_leaves_no_file() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let code = run(&["try", &path_arg(&lock_path)]).unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(!lock_path.exists());
}

#[test]
fn test_try_held_lock_reports_contended() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    let mut holder = TokenLock::new(&lock_path);
    assert!(holder.acquire_nb(LockMode::Exclusive).unwrap());

    let code = run(&["try", &path_arg(&lock_path)]).unwrap();

    assert_eq!(code, exit_codes::LOCK_CONTENDED);
    assert!(holder.is_active());
    assert!(holder.release().unwrap());
}

#[test]
fn test_try_reclaims_stale_lock() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    write_token_file(&lock_path, 10_000);

    let code = run(&["try", &path_arg(&lock_path)]).unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(!lock_path.exists());
}

#[test]
fn test_try_missing_parent_is_config_error() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("missing").join("job.lock");

    let err = run(&["try", &path_arg(&lock_path)]).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
}

// ============================================================================
// exec
// ============================================================================

#[cfg(unix)]
#[test]
fn test_exec_forwards_child_exit_code() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let code = run(&[
        "exec",
        &path_arg(&lock_path),
        "--command",
        "sh -c 'exit 7'",
    ])
    .unwrap();

    assert_eq!(code, 7);
    assert!(!lock_path.exists());
}

#[cfg(unix)]
#[test]
fn test_exec_holds_lock_while_child_runs() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    let marker = temp_dir.path().join("marker");

    // The child copies the lock file, proving it existed during the run.
    let script = format!(
        "cp '{}' '{}'",
        lock_path.display(),
        marker.display()
    );
    let code = run(&["exec", &path_arg(&lock_path), "--", "sh", "-c", &script]).unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    let copied = std::fs::read_to_string(&marker).unwrap();
    assert!(crate::locks::LockToken::parse(&copied).is_some());
    assert!(!lock_path.exists());
}

#[cfg(unix)]
#[test]
fn test_exec_nonblock_on_held_lock_does_not_run_child() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    let marker = temp_dir.path().join("marker");
    let mut holder = TokenLock::new(&lock_path);
    assert!(holder.acquire_nb(LockMode::Exclusive).unwrap());

    let touch = format!("touch '{}'", marker.display());
    let code = run(&[
        "exec",
        &path_arg(&lock_path),
        "--nonblock",
        "--",
        "sh",
        "-c",
        &touch,
    ])
    .unwrap();

    assert_eq!(code, exit_codes::LOCK_CONTENDED);
    assert!(!marker.exists());
    assert!(holder.release().unwrap());
}

#[cfg(unix)]
#[test]
fn test_exec_advisory_shared_keeps_lock_file() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let code = run(&[
        "exec",
        &path_arg(&lock_path),
        "--advisory",
        "--shared",
        "--",
        "true",
    ])
    .unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(lock_path.exists());
}

#[test]
fn test_exec_without_command_is_user_error() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let err = run(&["exec", &path_arg(&lock_path)]).unwrap_err();

    assert!(matches!(err, LockError::UserError(_)));
    assert!(!lock_path.exists());
}

#[test]
fn test_exec_unbalanced_quotes_is_user_error() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let err = run(&["exec", &path_arg(&lock_path), "--command", "echo 'oops"]).unwrap_err();
    assert!(err.to_string().contains("invalid command string"));
}

#[test]
fn test_exec_missing_program_releases_lock() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let err = run(&[
        "exec",
        &path_arg(&lock_path),
        "--",
        "fsmutex-test-no-such-program",
    ])
    .unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
    assert!(!lock_path.exists());
}

#[test]
fn test_command_line_splits_shell_words() {
    let args = crate::cli::ExecArgs {
        lock: PathBuf::from("job.lock"),
        advisory: false,
        shared: false,
        nonblock: false,
        command: Some("echo \"hello world\" 'a b'".to_string()),
        args: Vec::new(),
    };

    let argv = exec::command_line(&args).unwrap();
    assert_eq!(argv, vec!["echo", "hello world", "a b"]);
}

#[cfg(unix)]
#[test]
fn test_run_child_flags_command_outliving_orphan_timeout() {
    let temp_dir = create_lock_dir(None);
    let argv = vec!["sleep".to_string(), "2".to_string()];

    let outcome = exec::run_child(
        &argv,
        &temp_dir.path().join("job.lock"),
        Some(Duration::from_secs(1)),
    )
    .unwrap();

    assert_eq!(outcome.code, exit_codes::SUCCESS);
    assert!(outcome.outlived_lock);
}

#[cfg(unix)]
#[test]
fn test_run_child_short_command_stays_within_orphan_timeout() {
    let temp_dir = create_lock_dir(None);
    let argv = vec!["true".to_string()];
    let started = Instant::now();

    let outcome = exec::run_child(
        &argv,
        &temp_dir.path().join("job.lock"),
        Some(Duration::from_secs(60)),
    )
    .unwrap();

    assert!(!outcome.outlived_lock);
    // The watcher must not hold up the command until the timeout.
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[cfg(unix)]
#[test]
fn test_exec_past_orphan_timeout_reports_lost_lock() {
    let temp_dir = create_lock_dir(Some("token_lock:\n  orphan_timeout_secs: 1\n"));
    let lock_path = temp_dir.path().join("job.lock");

    let waiter = {
        let lock_path = lock_path.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(2500));
            let config = TokenLockConfig::default()
                .with_orphan_timeout_secs(1)
                .with_orphan_warning(false);
            let mut lock = TokenLock::with_config(&lock_path, config);
            let reclaimed = lock.acquire_nb(LockMode::Exclusive).unwrap();
            if reclaimed {
                lock.release().unwrap();
            }
            reclaimed
        })
    };

    let err = run(&["exec", &path_arg(&lock_path), "--", "sleep", "4"]).unwrap_err();

    assert!(waiter.join().unwrap());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
    assert!(err.to_string().contains("outlived the orphan timeout of 1s"));
}

// ============================================================================
// status / list / clear
// ============================================================================

#[test]
fn test_status_succeeds_for_missing_and_present_locks() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    assert_eq!(
        run(&["status", &path_arg(&lock_path)]).unwrap(),
        exit_codes::SUCCESS
    );

    write_token_file(&lock_path, 5);
    assert_eq!(
        run(&["status", &path_arg(&lock_path), "--json"]).unwrap(),
        exit_codes::SUCCESS
    );
}

#[test]
fn test_render_status() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let missing = inspect::render_status(&lock_path, None, 120);
    assert!(missing.starts_with("No lock file at:"));

    write_token_file(&lock_path, 10_000);
    let info = inspect_lock(&lock_path, 120).unwrap().unwrap();
    let text = inspect::render_status(&lock_path, Some(&info), 120);

    assert!(text.starts_with("Lock: job.lock\n"));
    assert!(text.contains("Token:"));
    assert!(text.contains("STALE (exceeds 120s threshold)"));
}

#[test]
fn test_render_list_notes_orphans() {
    let temp_dir = create_lock_dir(None);
    write_token_file(&temp_dir.path().join("a.lock"), 5);
    std::fs::write(temp_dir.path().join("b.lock"), "garbage").unwrap();

    let locks = crate::locks::inspect::list_locks(temp_dir.path(), "*.lock", 120).unwrap();
    let text = inspect::render_list(&locks, 120);

    assert!(text.starts_with("Lock files (2):"));
    assert!(text.contains("Content:    garbage"));
    assert!(text.contains("UNVERIFIABLE"));
    assert!(text.contains("Note: 1 lock file(s) are stale or unverifiable."));

    assert_eq!(inspect::render_list(&[], 120), "No lock files.\n");
}

#[test]
fn test_list_invalid_pattern_is_user_error() {
    let temp_dir = create_lock_dir(None);

    let err = run(&["list", &path_arg(temp_dir.path()), "--pattern", "[unclosed"]).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn test_clear_requires_force() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    write_token_file(&lock_path, 5);

    let err = run(&["clear", &path_arg(&lock_path)]).unwrap_err();

    assert!(matches!(err, LockError::UserError(_)));
    assert!(err.to_string().contains("--force"));
    assert!(lock_path.exists());
}

#[test]
fn test_clear_stale_only_refuses_fresh_lock() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    write_token_file(&lock_path, 5);

    let err = run(&["clear", &path_arg(&lock_path), "--force", "--stale-only"]).unwrap_err();

    assert!(err.to_string().contains("refusing to clear fresh lock"));
    assert!(lock_path.exists());
}

#[test]
fn test_clear_force_removes_lock() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");
    write_token_file(&lock_path, 10_000);

    let info = inspect_lock(&lock_path, 120).unwrap().unwrap();
    assert_eq!(info.state, TokenState::Stale);

    let code = run(&["clear", &path_arg(&lock_path), "--force", "--stale-only"]).unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(!lock_path.exists());
}

#[test]
fn test_clear_missing_lock_is_user_error() {
    let temp_dir = create_lock_dir(None);
    let lock_path = temp_dir.path().join("job.lock");

    let err = run(&["clear", &path_arg(&lock_path), "--force"]).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}
