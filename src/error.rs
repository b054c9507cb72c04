//! Error types for fsmutex.
//!
//! Uses thiserror for derive macros. Contention is never an error: a
//! non-blocking acquire that finds the lock held returns `Ok(false)`.

use crate::exit_codes;
use std::io;
use thiserror::Error;

/// Main error type for lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// A blocking acquire exhausted its attempt budget.
    #[error(
        "could not acquire lock in the required time frame (max attempts: {attempts}; sleep between attempts: {delay_us}us)"
    )]
    Timeout { attempts: u32, delay_us: u64 },

    /// Invalid option combination or an unusable lock location.
    #[error("invalid lock configuration: {0}")]
    Configuration(String),

    /// Any failure that is not plain contention.
    #[error("{message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The user asked for something the CLI refuses to do.
    #[error("{0}")]
    UserError(String),
}

impl LockError {
    /// Operation failure without an underlying I/O cause.
    pub fn operation(message: impl Into<String>) -> Self {
        LockError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Operation failure caused by an I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        LockError::OperationFailed {
            message: format!("{}: {}", message.into(), source),
            source: Some(source),
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::Timeout { .. } => exit_codes::LOCK_TIMEOUT,
            LockError::Configuration(_) => exit_codes::CONFIG_FAILURE,
            LockError::OperationFailed { .. } => exit_codes::OPERATION_FAILURE,
            LockError::UserError(_) => exit_codes::USER_ERROR,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn timeout_error_has_correct_exit_code() {
        let err = LockError::Timeout {
            attempts: 3,
            delay_us: 50_000,
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_TIMEOUT);
        assert!(err.is_timeout());
    }

    #[test]
    fn configuration_error_has_correct_exit_code() {
        let err = LockError::Configuration("bad".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn operation_error_has_correct_exit_code() {
        let err = LockError::operation("could not release lock");
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
        assert!(!err.is_timeout());
    }

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = LockError::UserError("refusing".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn timeout_message_names_attempts_and_delay() {
        let err = LockError::Timeout {
            attempts: 600,
            delay_us: 25_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("600"));
        assert!(msg.contains("25000us"));
    }

    #[test]
    fn io_error_keeps_source() {
        let cause = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = LockError::io("could not write time to lock file", cause);
        assert!(err.to_string().contains("could not write time to lock file"));
        assert!(err.to_string().contains("denied"));
        assert!(err.source().is_some());
    }
}
