//! Implementation of the `fsmutex exec` command.
//!
//! Holds a lock for the lifetime of a child process.

use crate::cli::ExecArgs;
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::exit_codes;
use crate::locks::{AdvisoryLock, Lock, LockGuard, LockMode, TokenLock};
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Execute the `fsmutex exec` command.
///
/// The command line is validated before the lock is taken. The lock is
/// released after the child exits, and a failed release fails the command
/// even if the child succeeded.
///
/// A token lock is never refreshed while the child runs. Once the child
/// outlives `orphan_timeout_secs`, other waiters may reclaim the lock, so a
/// warning is logged at that point.
pub fn cmd_exec(args: ExecArgs, config: &Config) -> Result<i32> {
    let argv = command_line(&args)?;
    let mode = if args.shared {
        LockMode::Shared
    } else {
        LockMode::Exclusive
    };

    let mut lock: Box<dyn Lock> = if args.advisory {
        Box::new(AdvisoryLock::with_config(&args.lock, config.advisory))
    } else {
        Box::new(TokenLock::with_config(&args.lock, config.token_lock))
    };
    let stale_after = (!args.advisory)
        .then(|| Duration::from_secs(config.token_lock.orphan_timeout_secs));

    let guard = if args.nonblock {
        match LockGuard::try_acquire(&mut *lock, mode)? {
            Some(guard) => guard,
            None => {
                eprintln!("Lock is held by another process: {}", args.lock.display());
                return Ok(exit_codes::LOCK_CONTENDED);
            }
        }
    } else {
        LockGuard::acquire(&mut *lock, mode)?
    };

    tracing::info!(lock = %args.lock.display(), program = %argv[0], "running command under lock");
    let outcome = run_child(&argv, &args.lock, stale_after);
    let released = guard.release();

    let outcome = outcome?;
    released.map_err(|e| {
        if outcome.outlived_lock {
            LockError::operation(format!(
                "{} (the command outlived the orphan timeout of {}s, so another process could reclaim the lock)",
                e, config.token_lock.orphan_timeout_secs
            ))
        } else {
            e
        }
    })?;
    Ok(outcome.code)
}

/// The program and arguments to run.
pub(crate) fn command_line(args: &ExecArgs) -> Result<Vec<String>> {
    let argv = match &args.command {
        Some(command) => shell_words::split(command).map_err(|e| {
            LockError::UserError(format!("invalid command string '{}': {}", command, e))
        })?,
        None => args.args.clone(),
    };

    if argv.is_empty() {
        return Err(LockError::UserError(
            "no command given.\n\n\
             Pass the command after `--` or with --command, e.g.:\n  \
             fsmutex exec job.lock -- make all"
                .to_string(),
        ));
    }

    Ok(argv)
}

/// How a child run under a lock ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChildOutcome {
    pub code: i32,
    /// The child was still running when the lock became reclaimable.
    pub outlived_lock: bool,
}

/// Run the child to completion.
///
/// With `stale_after`, a watcher thread logs a warning as soon as the child
/// has run that long.
pub(crate) fn run_child(
    argv: &[String],
    lock_path: &Path,
    stale_after: Option<Duration>,
) -> Result<ChildOutcome> {
    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .spawn()
        .map_err(|e| LockError::io(format!("failed to run '{}'", argv[0]), e))?;

    let (done_tx, done_rx) = mpsc::channel::<()>();
    let watcher = stale_after.map(|limit| {
        let lock_path = lock_path.to_path_buf();
        thread::spawn(move || {
            if done_rx.recv_timeout(limit) != Err(RecvTimeoutError::Timeout) {
                return false;
            }
            tracing::warn!(
                lock = %lock_path.display(),
                orphan_timeout_secs = limit.as_secs(),
                "command is still running past the orphan timeout; other waiters may now \
                 reclaim the token lock. Use --advisory for long-running commands"
            );
            true
        })
    });

    let status = child.wait();
    drop(done_tx);
    let outlived_lock = watcher
        .map(|handle| handle.join().unwrap_or(false))
        .unwrap_or(false);

    let status = status
        .map_err(|e| LockError::io(format!("failed to wait for '{}'", argv[0]), e))?;

    Ok(ChildOutcome {
        code: exit_code_of(status),
        outlived_lock,
    })
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    // Shell convention for children killed by a signal.
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(exit_codes::OPERATION_FAILURE)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(exit_codes::OPERATION_FAILURE)
}
