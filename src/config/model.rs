//! Config struct definition and default implementation.

use super::types::{AdvisoryConfig, TokenLockConfig};
use serde::{Deserialize, Serialize};

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "fsmutex.yaml";

/// Configuration for fsmutex.
///
/// This struct represents the contents of `fsmutex.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy for token (exclusive-create) locks.
    pub token_lock: TokenLockConfig,

    /// Policy for OS advisory locks.
    pub advisory: AdvisoryConfig,
}
