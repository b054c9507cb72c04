//! Implementation of the `fsmutex try` command.

use crate::cli::TryArgs;
use crate::config::Config;
use crate::error::Result;
use crate::exit_codes;
use crate::locks::{Lock, LockMode, TokenLock};

/// Execute the `fsmutex try` command.
///
/// A single non-blocking acquire counts as the first attempt, so a stale
/// lock file is reclaimed here when orphan checks run on attempt 1.
pub fn cmd_try(args: TryArgs, config: &Config) -> Result<i32> {
    let mut lock = TokenLock::with_config(&args.lock, config.token_lock);

    if !lock.acquire_nb(LockMode::Exclusive)? {
        println!("Lock is held: {}", args.lock.display());
        return Ok(exit_codes::LOCK_CONTENDED);
    }

    lock.release()?;
    println!("Lock is free: {}", args.lock.display());
    Ok(exit_codes::SUCCESS)
}
