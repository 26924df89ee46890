// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for streaming chat completion responses.
//!
//! Converts a reqwest response byte stream into reply-text fragments using
//! the `eventsource-stream` crate for SSE protocol compliance. The stream
//! terminates at the `data: [DONE]` sentinel.

use eventsource_stream::Eventsource;
use futures::stream::StreamExt;

use opsdeck_core::{CompletionErrorKind, FragmentStream, OpsdeckError};

use crate::types::ChatChunk;

/// What one SSE event contributes to the fragment stream.
enum SseItem {
    Fragment(String),
    /// Role-only or finish-only delta; nothing to emit.
    Skip,
    /// The `[DONE]` sentinel; end of stream.
    Done,
    Failed(OpsdeckError),
}

/// Parses a reqwest streaming response into a stream of reply fragments.
///
/// Each `data:` payload is deserialized as a [`ChatChunk`] and its first
/// choice's `delta.content` becomes one fragment. Deltas without content are
/// skipped; the stream ends at `[DONE]`.
pub fn parse_sse_stream(response: reqwest::Response) -> FragmentStream {
    let events = response.bytes_stream().eventsource();

    let fragments = events
        .map(|result| match result {
            Ok(event) => {
                let data = event.data.trim();
                if data == "[DONE]" {
                    return SseItem::Done;
                }
                match serde_json::from_str::<ChatChunk>(data) {
                    Ok(chunk) => {
                        match chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                        {
                            Some(text) => SseItem::Fragment(text),
                            None => SseItem::Skip,
                        }
                    }
                    Err(e) => SseItem::Failed(OpsdeckError::Completion {
                        kind: CompletionErrorKind::MalformedResponse,
                        message: format!("failed to parse stream chunk: {e}"),
                        source: Some(Box::new(e)),
                    }),
                }
            }
            Err(e) => SseItem::Failed(OpsdeckError::Completion {
                kind: CompletionErrorKind::Network,
                message: format!("SSE stream error: {e}"),
                source: Some(Box::new(e)),
            }),
        })
        .take_while(|item| futures::future::ready(!matches!(item, SseItem::Done)))
        .filter_map(|item| async move {
            match item {
                SseItem::Fragment(text) => Some(Ok(text)),
                SseItem::Skip => None,
                SseItem::Failed(e) => Some(Err(e)),
                SseItem::Done => None,
            }
        });

    Box::pin(fragments)
}
