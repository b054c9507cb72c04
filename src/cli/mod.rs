//! CLI argument parsing for fsmutex.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::locks::inspect::DEFAULT_LOCK_PATTERN;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// fsmutex: serialize processes on a lock file.
///
/// Lock files are either created exclusively and stamped with a timestamp
/// token (the default), or held with an OS advisory lock (--advisory).
#[derive(Parser, Debug)]
#[command(name = "fsmutex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to use instead of fsmutex.yaml next to the lock.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for fsmutex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a lock.
    ///
    /// Acquires the lock, runs the command, releases the lock and exits
    /// with the command's exit code.
    ///
    /// Token locks are not refreshed while the command runs: after
    /// `orphan_timeout_secs` (120s by default) other waiters treat the lock
    /// as abandoned and may take it over. Use --advisory for commands that
    /// can run longer.
    Exec(ExecArgs),

    /// Try a lock once without waiting.
    ///
    /// Acquires and immediately releases the lock. Exits 0 if the lock was
    /// free and with the contended exit code if it is held.
    Try(TryArgs),

    /// Show the state of a lock file.
    Status(StatusArgs),

    /// List lock files in a directory.
    List(ListArgs),

    /// Delete a lock file.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(ClearArgs),
}

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Path of the lock file.
    pub lock: PathBuf,

    /// Use an OS advisory lock instead of a token lock.
    #[arg(long)]
    pub advisory: bool,

    /// Take the lock in shared mode (advisory locks only).
    #[arg(long, requires = "advisory")]
    pub shared: bool,

    /// Fail immediately instead of waiting if the lock is held.
    #[arg(long)]
    pub nonblock: bool,

    /// Command line to run, split with shell quoting rules.
    #[arg(short, long, conflicts_with = "args")]
    pub command: Option<String>,

    /// Program and arguments to run.
    #[arg(last = true, value_name = "CMD")]
    pub args: Vec<String>,
}

/// Arguments for the `try` command.
#[derive(Args, Debug)]
pub struct TryArgs {
    /// Path of the lock file.
    pub lock: PathBuf,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path of the lock file.
    pub lock: PathBuf,

    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory to scan.
    pub dir: PathBuf,

    /// Glob matched against lock file names.
    #[arg(long, default_value = DEFAULT_LOCK_PATTERN)]
    pub pattern: String,

    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `clear` command.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Path of the lock file.
    pub lock: PathBuf,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,

    /// Only clear the lock if its token is stale or unverifiable.
    #[arg(long)]
    pub stale_only: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
