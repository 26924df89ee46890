// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible Chat Completions endpoints.
//!
//! Handles request construction, bearer authentication, and both streaming
//! and non-streaming responses. There is no retry: one request, one outcome,
//! and the caller decides whether to re-send.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use opsdeck_core::{CompletionErrorKind, FragmentStream, OpsdeckError};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Request timeout. The completion call is the one operation expected to
/// block for a user-perceptible duration; callers wanting a tighter bound
/// wrap the call in their own timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for an OpenAI-compatible Chat Completions service.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a client authenticating with the given API key.
    ///
    /// The Authorization header is marked sensitive so it is excluded from
    /// reqwest's debug output; the key is never logged here.
    pub fn new(api_key: &SecretString, base_url: String) -> Result<Self, OpsdeckError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| OpsdeckError::Config("API key contains invalid header characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OpsdeckError::Completion {
                kind: CompletionErrorKind::Network,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Sends a non-streaming request and returns the parsed response.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, OpsdeckError> {
        let mut req = request.clone();
        req.stream = false;

        let response = self.post(&req).await?;
        let status = response.status();
        debug!(status = %status, "completion response received");

        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body = response.text().await.map_err(|e| OpsdeckError::Completion {
            kind: CompletionErrorKind::Network,
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| OpsdeckError::Completion {
            kind: CompletionErrorKind::MalformedResponse,
            message: format!("failed to parse completion response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Sends a streaming request and returns a stream of reply fragments.
    pub async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream, OpsdeckError> {
        let mut req = request.clone();
        req.stream = true;

        let response = self.post(&req).await?;
        let status = response.status();
        debug!(status = %status, "streaming response received");

        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        Ok(sse::parse_sse_stream(response))
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, OpsdeckError> {
        self.client
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| OpsdeckError::Completion {
                kind: CompletionErrorKind::Network,
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

/// Builds the error for a non-success status, classifying quota exhaustion
/// separately and pulling the service's own message out of the body when it
/// has the standard shape.
async fn status_error(status: StatusCode, response: reqwest::Response) -> OpsdeckError {
    let kind = if status == StatusCode::TOO_MANY_REQUESTS {
        CompletionErrorKind::Quota
    } else {
        CompletionErrorKind::Api
    };

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(envelope) => format!(
            "service returned {status}: {} ({})",
            envelope.error.message,
            envelope.error.type_.as_deref().unwrap_or("unknown")
        ),
        Err(_) => format!("service returned {status}"),
    };

    OpsdeckError::Completion {
        kind,
        message,
        source: None,
    }
}
