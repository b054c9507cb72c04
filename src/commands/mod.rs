//! Command implementations for fsmutex.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command returns the process exit code on success so
//! that `exec` can forward its child's status and `try` can report contention.

mod exec;
mod inspect;
mod try_lock;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::Result;
use crate::fs;
use std::path::Path;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Configuration comes
/// from `--config` when given, otherwise from `fsmutex.yaml` in the
/// directory the command operates on.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let explicit = cli.config.as_deref();

    match cli.command {
        Command::Exec(args) => {
            let config = resolve_config(explicit, &fs::parent_dir(&args.lock))?;
            exec::cmd_exec(args, &config)
        }
        Command::Try(args) => {
            let config = resolve_config(explicit, &fs::parent_dir(&args.lock))?;
            try_lock::cmd_try(args, &config)
        }
        Command::Status(args) => {
            let config = resolve_config(explicit, &fs::parent_dir(&args.lock))?;
            inspect::cmd_status(args, &config)
        }
        Command::List(args) => {
            let config = resolve_config(explicit, &args.dir)?;
            inspect::cmd_list(args, &config)
        }
        Command::Clear(args) => {
            let config = resolve_config(explicit, &fs::parent_dir(&args.lock))?;
            inspect::cmd_clear(args, &config)
        }
    }
}

/// Load the explicit config file, or discover one in `dir`.
pub(crate) fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::discover(dir),
    }
}
