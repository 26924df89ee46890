// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion backend for the Opsdeck console.
//!
//! This crate implements [`CompletionBackend`] for Chat Completions
//! endpoints, providing both single-shot completion and streaming SSE
//! responses.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::info;

use opsdeck_config::OpsdeckConfig;
use opsdeck_core::{
    CompletionBackend, CompletionErrorKind, CompletionReply, CompletionRequest, FragmentStream,
    OpsdeckError,
};

use crate::client::OpenAiClient;
use crate::types::{ApiMessage, ChatRequest};

/// Chat Completions backend implementing [`CompletionBackend`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiBackend {
    client: OpenAiClient,
}

impl OpenAiBackend {
    /// Creates a backend from the console configuration.
    pub fn from_config(config: &OpsdeckConfig) -> Result<Self, OpsdeckError> {
        let api_key = resolve_api_key(&config.openai.api_key)?;
        let client = OpenAiClient::new(&api_key, config.openai.base_url.clone())?;

        info!(
            model = config.openai.default_model,
            "completion backend initialized"
        );
        Ok(Self { client })
    }

    /// Creates a backend against an explicit endpoint (used in tests).
    pub fn new(api_key: &SecretString, base_url: String) -> Result<Self, OpsdeckError> {
        Ok(Self {
            client: OpenAiClient::new(api_key, base_url)?,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, OpsdeckError> {
        let api_request = to_chat_request(&request, false);
        let response = self.client.complete(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OpsdeckError::Completion {
                kind: CompletionErrorKind::MalformedResponse,
                message: "response contained no choices".into(),
                source: None,
            })?;

        Ok(CompletionReply {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            finish_reason: choice.finish_reason,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, OpsdeckError> {
        let api_request = to_chat_request(&request, true);
        self.client.stream(&api_request).await
    }
}

/// Converts a backend-neutral request into the wire shape. The transcript is
/// sent verbatim, system entry included, in order.
fn to_chat_request(request: &CompletionRequest, stream: bool) -> ChatRequest {
    ChatRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|entry| ApiMessage {
                role: entry.role.to_string(),
                content: entry.content.clone(),
            })
            .collect(),
        max_tokens: Some(request.max_tokens),
        stream,
    }
}

/// Resolves the API key from config or environment. The key never appears in
/// log output or error messages.
fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, OpsdeckError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var("OPENAI_API_KEY")
        .map(SecretString::from)
        .map_err(|_| {
            OpsdeckError::Config(
                "API key not found. Set openai.api_key in config or the OPENAI_API_KEY environment variable.".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdeck_core::{Role, TranscriptEntry};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transcript_request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![
                TranscriptEntry::system("You are a helpful assistant."),
                TranscriptEntry::user("ping"),
            ],
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn complete_sends_ordered_transcript_and_returns_reply() {
        let server = MockServer::start().await;

        let expected_body = serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "ping"}
            ],
            "stream": false
        });
        let response_body = serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "pong"},
                "finish_reason": "stop"
            }]
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let backend =
            OpenAiBackend::new(&SecretString::from("sk-test"), server.uri()).unwrap();
        let reply = backend.complete(transcript_request()).await.unwrap();
        assert_eq!(reply.content, "pong");
        assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn empty_choices_is_malformed_response() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "id": "chatcmpl-2",
            "model": "gpt-4o-mini",
            "choices": []
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let backend =
            OpenAiBackend::new(&SecretString::from("sk-test"), server.uri()).unwrap();
        let err = backend.complete(transcript_request()).await.unwrap_err();
        match err {
            OpsdeckError::Completion { kind, .. } => {
                assert_eq!(kind, CompletionErrorKind::MalformedResponse);
            }
            other => panic!("expected Completion error, got {other:?}"),
        }
    }

    #[test]
    fn roles_map_to_wire_names() {
        let request = CompletionRequest {
            model: "m".into(),
            messages: vec![
                TranscriptEntry::system("s"),
                TranscriptEntry::user("u"),
                TranscriptEntry {
                    role: Role::Assistant,
                    content: "a".into(),
                },
            ],
            max_tokens: 1,
        };
        let wire = to_chat_request(&request, true);
        let roles: Vec<&str> = wire.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert!(wire.stream);
    }
}
