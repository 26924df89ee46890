// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion backend for deterministic testing.
//!
//! `MockCompletion` implements `CompletionBackend` with pre-configured
//! replies, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use opsdeck_core::{
    CompletionBackend, CompletionErrorKind, CompletionReply, CompletionRequest, FragmentStream,
    OpsdeckError,
};

/// A mock completion backend that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue; when the queue is empty a default
/// "mock reply" is returned. Failures can be scripted per call, and every
/// request is recorded so tests can assert on the transcript that was sent.
pub struct MockCompletion {
    replies: Arc<Mutex<VecDeque<String>>>,
    fail_next: Arc<Mutex<Option<CompletionErrorKind>>>,
    fail_mid_stream: Arc<Mutex<bool>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletion {
    /// Creates a mock with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fail_next: Arc::new(Mutex::new(None)),
            fail_mid_stream: Arc::new(Mutex::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(String::from).collect(),
            )),
            fail_next: Arc::new(Mutex::new(None)),
            fail_mid_stream: Arc::new(Mutex::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues one reply.
    pub async fn push_reply(&self, text: &str) {
        self.replies.lock().await.push_back(text.to_string());
    }

    /// Makes the next call fail with the given kind.
    pub async fn fail_next(&self, kind: CompletionErrorKind) {
        *self.fail_next.lock().await = Some(kind);
    }

    /// Makes the next stream yield its first fragment and then an error.
    pub async fn fail_mid_stream(&self) {
        *self.fail_mid_stream.lock().await = true;
    }

    /// Returns the most recent request, if any call was made.
    pub async fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().await.last().cloned()
    }

    /// Number of calls made against this mock.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn next_reply(&self) -> String {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock reply".to_string())
    }

    async fn take_scripted_failure(&self) -> Option<OpsdeckError> {
        self.fail_next
            .lock()
            .await
            .take()
            .map(|kind| OpsdeckError::Completion {
                kind,
                message: "scripted failure".into(),
                source: None,
            })
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a reply into streaming fragments, spaces preserved.
fn fragments_of(reply: &str) -> Vec<String> {
    if reply.is_empty() {
        return Vec::new();
    }
    reply.split_inclusive(' ').map(String::from).collect()
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, OpsdeckError> {
        self.requests.lock().await.push(request.clone());
        if let Some(err) = self.take_scripted_failure().await {
            return Err(err);
        }

        Ok(CompletionReply {
            content: self.next_reply().await,
            model: request.model,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<FragmentStream, OpsdeckError> {
        self.requests.lock().await.push(request);
        if let Some(err) = self.take_scripted_failure().await {
            return Err(err);
        }

        let reply = self.next_reply().await;
        let mut items: Vec<Result<String, OpsdeckError>> =
            fragments_of(&reply).into_iter().map(Ok).collect();

        if std::mem::take(&mut *self.fail_mid_stream.lock().await) {
            items.truncate(1);
            items.push(Err(OpsdeckError::Completion {
                kind: CompletionErrorKind::Network,
                message: "scripted mid-stream failure".into(),
                source: None,
            }));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use opsdeck_core::TranscriptEntry;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".into(),
            messages: vec![TranscriptEntry::user("hi")],
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn replies_pop_in_fifo_order() {
        let mock = MockCompletion::new();
        mock.push_reply("first").await;
        mock.push_reply("second").await;

        assert_eq!(mock.complete(request()).await.unwrap().content, "first");
        assert_eq!(mock.complete(request()).await.unwrap().content, "second");
        // Queue drained: default reply.
        assert_eq!(mock.complete(request()).await.unwrap().content, "mock reply");
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let mock = MockCompletion::new();
        mock.push_reply("ok").await;
        mock.fail_next(CompletionErrorKind::Quota).await;

        assert!(mock.complete(request()).await.is_err());
        assert_eq!(mock.complete(request()).await.unwrap().content, "ok");
    }

    #[tokio::test]
    async fn stream_fragments_concatenate_to_reply() {
        let mock = MockCompletion::new();
        mock.push_reply("a b c").await;

        let stream = mock.stream(request()).await.unwrap();
        let full: String = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(full, "a b c");
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let mock = MockCompletion::new();
        mock.complete(request()).await.unwrap();
        assert_eq!(mock.call_count().await, 1);
        let last = mock.last_request().await.unwrap();
        assert_eq!(last.model, "mock-model");
    }
}
