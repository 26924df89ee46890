// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt resolution from configuration.

use tracing::{info, warn};

use opsdeck_config::model::AssistantConfig;

/// Prompt used when the configuration provides none.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Resolves the system prompt following config priority: file > inline > default.
///
/// A configured file that is missing or empty falls back to the inline
/// prompt, then to the default; resolution never fails.
pub async fn resolve_system_prompt(config: &AssistantConfig) -> String {
    if let Some(ref file_path) = config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                if !trimmed.is_empty() {
                    info!(path = file_path.as_str(), "loaded system prompt from file");
                    return trimmed;
                }
            }
            Err(e) => {
                warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(ref prompt) = config.system_prompt
        && !prompt.is_empty()
    {
        return prompt.clone();
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_prompt_when_nothing_configured() {
        let config = AssistantConfig::default();
        assert_eq!(
            resolve_system_prompt(&config).await,
            "You are a helpful assistant."
        );
    }

    #[tokio::test]
    async fn inline_prompt_wins_over_default() {
        let config = AssistantConfig {
            system_prompt: Some("Custom inline prompt.".to_string()),
            system_prompt_file: None,
        };
        assert_eq!(resolve_system_prompt(&config).await, "Custom inline prompt.");
    }

    #[tokio::test]
    async fn file_prompt_wins_over_inline() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("prompt.md");
        std::fs::write(&file_path, "File-based prompt.").unwrap();

        let config = AssistantConfig {
            system_prompt: Some("Inline prompt.".to_string()),
            system_prompt_file: Some(file_path.to_string_lossy().into_owned()),
        };
        assert_eq!(resolve_system_prompt(&config).await, "File-based prompt.");
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_inline() {
        let config = AssistantConfig {
            system_prompt: Some("Fallback prompt.".to_string()),
            system_prompt_file: Some("/nonexistent/path/prompt.md".to_string()),
        };
        assert_eq!(resolve_system_prompt(&config).await, "Fallback prompt.");
    }
}
