//! Configuration model for fsmutex.
//!
//! This module defines the immutable policy values handed to lock handles at
//! construction, and the `Config` struct that represents `fsmutex.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::{CONFIG_FILE_NAME, Config};
pub use types::{AdvisoryConfig, TokenLockConfig};
