// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./opsdeck.toml` > `~/.config/opsdeck/opsdeck.toml`
//! > `/etc/opsdeck/opsdeck.toml` with environment variable overrides via the
//! `OPSDECK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OpsdeckConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/opsdeck/opsdeck.toml` (system-wide)
/// 3. `~/.config/opsdeck/opsdeck.toml` (user XDG config)
/// 4. `./opsdeck.toml` (local directory)
/// 5. `OPSDECK_*` environment variables
pub fn load_config() -> Result<OpsdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeckConfig::default()))
        .merge(Toml::file("/etc/opsdeck/opsdeck.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("opsdeck/opsdeck.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("opsdeck.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<OpsdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeckConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OpsdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeckConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `OPSDECK_OPENAI_API_KEY` must map to
/// `openai.api_key`, not `openai.api.key`.
fn env_provider() -> Env {
    Env::prefixed("OPSDECK_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: OPSDECK_STORAGE_DATABASE_PATH -> "storage_database_path"
        let mapped = key
            .as_str()
            .replacen("console_", "console.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("assistant_", "assistant.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_overrides() {
        let config = load_config_from_str(
            r#"
[storage]
database_path = "/tmp/console.db"
wal_mode = false
"#,
        )
        .unwrap();
        assert_eq!(config.storage.database_path, "/tmp/console.db");
        assert!(!config.storage.wal_mode);
        // Untouched sections keep their defaults.
        assert_eq!(config.openai.max_tokens, 1024);
    }

    #[test]
    fn load_from_str_empty_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.console.name, "opsdeck");
    }
}
