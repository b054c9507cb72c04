//! Implementation of the `status`, `list` and `clear` commands.
//!
//! These read lock files without taking them.

use crate::cli::{ClearArgs, ListArgs, StatusArgs};
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::exit_codes;
use crate::locks::inspect::{clear_lock, inspect_lock, list_locks};
use crate::locks::{LockInfo, TokenState};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

/// Execute the `fsmutex status` command.
pub fn cmd_status(args: StatusArgs, config: &Config) -> Result<i32> {
    let timeout = config.token_lock.orphan_timeout_secs;
    let info = inspect_lock(&args.lock, timeout)?;

    if args.json {
        let report = json!({
            "path": args.lock,
            "exists": info.is_some(),
            "lock": info,
        });
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", render_status(&args.lock, info.as_ref(), timeout));
    }

    Ok(exit_codes::SUCCESS)
}

/// Execute the `fsmutex list` command.
pub fn cmd_list(args: ListArgs, config: &Config) -> Result<i32> {
    let timeout = config.token_lock.orphan_timeout_secs;
    let locks = list_locks(&args.dir, &args.pattern, timeout)?;

    if args.json {
        println!("{}", to_json(&locks)?);
    } else {
        print!("{}", render_list(&locks, timeout));
    }

    Ok(exit_codes::SUCCESS)
}

/// Execute the `fsmutex clear` command.
pub fn cmd_clear(args: ClearArgs, config: &Config) -> Result<i32> {
    // Require --force flag
    if !args.force {
        return Err(LockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing locks can cause data corruption if the lock holder is still active.\n\
             Only clear locks if you are certain the lock holder has crashed.\n\n\
             To clear the lock, run:\n  fsmutex clear {} --force",
            args.lock.display()
        )));
    }

    let timeout = config.token_lock.orphan_timeout_secs;
    let cleared = clear_lock(&args.lock, timeout, args.stale_only)?;

    println!("Cleared lock: {}", cleared.name);
    println!();
    println!("Lock details:");
    print!("{}", render_details(&cleared, timeout, "  "));

    Ok(exit_codes::SUCCESS)
}

pub(crate) fn render_status(path: &Path, info: Option<&LockInfo>, timeout_secs: u64) -> String {
    match info {
        None => format!("No lock file at: {}\n", path.display()),
        Some(info) => {
            let mut out = format!("Lock: {}\n", info.name);
            out.push_str(&render_details(info, timeout_secs, "  "));
            out
        }
    }
}

pub(crate) fn render_list(locks: &[LockInfo], timeout_secs: u64) -> String {
    if locks.is_empty() {
        return "No lock files.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Lock files ({}):", locks.len());
    out.push('\n');

    for lock in locks {
        let _ = writeln!(out, "  {}:", lock.name);
        out.push_str(&render_details(lock, timeout_secs, "    "));
        out.push('\n');
    }

    // Summary
    let orphan_count = locks.iter().filter(|l| l.state.is_orphan()).count();
    if orphan_count > 0 {
        let _ = writeln!(
            out,
            "Note: {} lock file(s) are stale or unverifiable. Use `fsmutex clear <LOCK> --force` to clear.",
            orphan_count
        );
    }

    out
}

fn render_details(info: &LockInfo, timeout_secs: u64, indent: &str) -> String {
    let mut out = String::new();

    if let Some(token) = &info.token {
        let _ = writeln!(out, "{}Token:      {}", indent, token);
        let _ = writeln!(
            out,
            "{}Created:    {}",
            indent,
            token.created_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "{}Age:        {}", indent, token.age_string());
    } else if !info.content.is_empty() {
        let _ = writeln!(out, "{}Content:    {}", indent, info.content);
    }

    let state = match info.state {
        TokenState::Fresh => "fresh".to_string(),
        TokenState::Stale => format!("STALE (exceeds {}s threshold)", timeout_secs),
        TokenState::Unverifiable => "UNVERIFIABLE (no timestamp token)".to_string(),
    };
    let _ = writeln!(out, "{}State:      {}", indent, state);
    let _ = writeln!(out, "{}Path:       {}", indent, info.path.display());

    out
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LockError::operation(format!("failed to serialize output: {}", e)))
}
