//! Exit code constants for the fsmutex CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, refused action)
//! - 2: Configuration error (invalid options, unusable lock location)
//! - 3: Lock operation failure (I/O, ownership verification)
//! - 4: Blocking acquire timed out
//! - 5: Lock is held by someone else (non-blocking attempt)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a refused action.
pub const USER_ERROR: i32 = 1;

/// Configuration error: invalid option combination or unusable lock location.
pub const CONFIG_FAILURE: i32 = 2;

/// Operation failure: any I/O or verification failure that is not contention.
pub const OPERATION_FAILURE: i32 = 3;

/// Timeout: the attempt budget of a blocking acquire was exhausted.
pub const LOCK_TIMEOUT: i32 = 4;

/// Contention: a non-blocking acquire found the lock held.
pub const LOCK_CONTENDED: i32 = 5;
