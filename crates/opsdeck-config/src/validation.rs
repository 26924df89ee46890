// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and recognized log levels.

use crate::diagnostic::ConfigError;
use crate::model::OpsdeckConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OpsdeckConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.console.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "console.log_level `{}` is not one of {}",
                config.console.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.openai.default_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.default_model must not be empty".to_string(),
        });
    }

    if config.openai.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "openai.max_tokens must be at least 1".to_string(),
        });
    }

    if config.openai.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.base_url must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = OpsdeckConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = OpsdeckConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn bogus_log_level_fails_validation() {
        let mut config = OpsdeckConfig::default();
        config.console.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))
        ));
    }

    #[test]
    fn zero_max_tokens_fails_validation() {
        let mut config = OpsdeckConfig::default();
        config.openai.max_tokens = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_tokens"))
        ));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = OpsdeckConfig::default();
        config.storage.database_path = "/tmp/test.db".to_string();
        config.console.log_level = "debug".to_string();
        config.openai.max_tokens = 4096;
        assert!(validate_config(&config).is_ok());
    }
}
