// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion backend trait for external text-completion services.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::OpsdeckError;
use crate::types::TranscriptEntry;

/// A request to a completion service: a model identifier and the full
/// ordered transcript, system entry included.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<TranscriptEntry>,
    pub max_tokens: u32,
}

/// A non-streaming reply from a completion service.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    /// Generated assistant text.
    pub content: String,
    /// Model that actually served the request, as reported by the service.
    pub model: String,
    /// Why generation stopped, when the service reports it.
    pub finish_reason: Option<String>,
}

/// A finite, non-restartable sequence of reply fragments.
///
/// Concatenating every `Ok` fragment yields the full reply text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, OpsdeckError>> + Send>>;

/// Backend for external completion services.
///
/// Implementations handle transport and wire format; callers own transcript
/// state. There is no retry inside the seam: one request, one outcome.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the transcript and returns the full assistant reply.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, OpsdeckError>;

    /// Sends the transcript and returns a stream of reply fragments.
    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, OpsdeckError>;
}
