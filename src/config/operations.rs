//! Config loading, validation, and discovery operations.

use super::model::{CONFIG_FILE_NAME, Config};
use super::types::TokenLockConfig;
use crate::error::{LockError, Result};
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::Configuration)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Look for `fsmutex.yaml` in `dir` and load it, or fall back to defaults.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document parses as null, which serde_yaml rejects for structs.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            LockError::Configuration(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockError::Configuration(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    pub fn validate(&self) -> Result<()> {
        self.token_lock.validate()
    }
}

impl TokenLockConfig {
    /// Validate the acquisition policy.
    ///
    /// Validation rules:
    /// - `max_attempts` must be positive
    /// - `orphan_check_attempt`, when set, must be positive and not exceed `max_attempts`
    /// - `orphan_timeout_secs` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LockError::Configuration(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if let Some(attempt) = self.orphan_check_attempt {
            if attempt == 0 {
                return Err(LockError::Configuration(
                    "orphan_check_attempt must be greater than 0 (use null to disable)"
                        .to_string(),
                ));
            }
            if attempt > self.max_attempts {
                return Err(LockError::Configuration(format!(
                    "orphan_check_attempt ({}) exceeds max_attempts ({})",
                    attempt, self.max_attempts
                )));
            }
        }

        if self.orphan_timeout_secs == 0 {
            return Err(LockError::Configuration(
                "orphan_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
