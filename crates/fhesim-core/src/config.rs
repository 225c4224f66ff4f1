//! Host configuration parsing and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field failed validation.
    #[error("invalid config: {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Configuration for a coprocessor host instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HostConfig {
    /// Chain identifier mixed into input-proof bindings; proofs issued for
    /// one chain id never verify under another.
    pub chain_id: u64,

    /// Maximum number of registered handles.
    pub max_handles: usize,

    /// Maximum number of encrypted inputs awaiting admission.
    pub max_pending_inputs: usize,

    /// Maximum number of values in one encrypted-input batch.
    pub max_inputs_per_batch: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            max_handles: 65_536,
            max_pending_inputs: 1_024,
            max_inputs_per_batch: 16,
        }
    }
}

impl HostConfig {
    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for invalid TOML (unknown fields included) and
    /// `Invalid` for zero-valued limits.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates limit fields. All limits must be non-zero.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_handles", self.max_handles),
            ("max_pending_inputs", self.max_pending_inputs),
            ("max_inputs_per_batch", self.max_inputs_per_batch),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be non-zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_validates() {
        HostConfig::default().validate().expect("default is valid");
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = HostConfig::from_toml("chain_id = 1\n").expect("parse");
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.max_handles, HostConfig::default().max_handles);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = HostConfig::from_toml("socket = \"/tmp/x\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_zero_limits() {
        let err = HostConfig::from_toml("max_handles = 0\n").expect_err("zero limit");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_handles",
                ..
            }
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "chain_id = 42\nmax_inputs_per_batch = 4").expect("write");
        let config = HostConfig::from_file(file.path()).expect("load");
        assert_eq!(config.chain_id, 42);
        assert_eq!(config.max_inputs_per_batch, 4);
    }
}
