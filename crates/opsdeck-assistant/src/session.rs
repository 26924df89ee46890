// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One bounded transcript and its exchange with the completion service.
//!
//! Transcript invariants:
//! - the system entry is always first, set at construction or reset
//! - entries are appended, never edited in place
//! - length only grows, or drops back to exactly one on reset
//!
//! A failed turn leaves the appended user entry in place with no assistant
//! entry; the caller may re-send. There is no retry here.

use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tracing::debug;

use opsdeck_core::{
    CompletionBackend, CompletionRequest, FragmentStream, OpsdeckError, TranscriptEntry,
};

/// Conversation state for one analysis context.
pub struct ConversationSession {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    max_tokens: u32,
    transcript: Vec<TranscriptEntry>,
}

/// In-flight state of one streaming turn.
struct StreamingTurn<'a> {
    inner: FragmentStream,
    transcript: &'a mut Vec<TranscriptEntry>,
    reply: String,
    failed: bool,
}

impl ConversationSession {
    /// Creates a session whose transcript starts as a single system entry.
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        model: impl Into<String>,
        max_tokens: u32,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens,
            transcript: vec![TranscriptEntry::system(system_prompt)],
        }
    }

    /// The full transcript, system entry first.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// The current system prompt.
    pub fn system_prompt(&self) -> &str {
        self.transcript
            .first()
            .map(|entry| entry.content.as_str())
            .unwrap_or("")
    }

    /// Appends a user entry, sends the whole transcript, appends the reply
    /// as an assistant entry, and returns its content.
    ///
    /// On failure the user entry stays and no assistant entry is appended;
    /// the error is surfaced once, with no retry.
    pub async fn send(&mut self, user_message: &str) -> Result<String, OpsdeckError> {
        self.transcript.push(TranscriptEntry::user(user_message));

        let reply = self.backend.complete(self.request()).await?;

        self.transcript
            .push(TranscriptEntry::assistant(reply.content.clone()));
        debug!(
            entries = self.transcript.len(),
            "completion turn appended to transcript"
        );
        Ok(reply.content)
    }

    /// Streaming variant of [`ConversationSession::send`].
    ///
    /// Returns a finite, non-restartable stream of reply fragments whose
    /// concatenation equals the full reply. The assistant entry is appended
    /// only once the stream is exhausted; a stream dropped early, or one that
    /// yields an error, appends nothing. The stream mutably borrows the
    /// session, so the transcript cannot be observed mid-turn.
    pub async fn send_streaming(
        &mut self,
        user_message: &str,
    ) -> Result<impl Stream<Item = Result<String, OpsdeckError>> + '_, OpsdeckError> {
        self.transcript.push(TranscriptEntry::user(user_message));

        let inner = self.backend.stream(self.request()).await?;

        let turn = StreamingTurn {
            inner,
            transcript: &mut self.transcript,
            reply: String::new(),
            failed: false,
        };

        Ok(stream::unfold(turn, |mut turn| async move {
            if turn.failed {
                return None;
            }
            match turn.inner.next().await {
                Some(Ok(fragment)) => {
                    turn.reply.push_str(&fragment);
                    Some((Ok(fragment), turn))
                }
                Some(Err(e)) => {
                    // Failed turn: terminate without an assistant entry.
                    turn.failed = true;
                    Some((Err(e), turn))
                }
                None => {
                    turn.transcript
                        .push(TranscriptEntry::assistant(std::mem::take(&mut turn.reply)));
                    None
                }
            }
        }))
    }

    /// Discards all entries and starts over with a single system entry.
    ///
    /// With `None` the previous system prompt is kept.
    pub fn reset(&mut self, new_system_prompt: Option<String>) {
        let prompt = match new_system_prompt {
            Some(p) => p,
            None => self.system_prompt().to_string(),
        };
        self.transcript.clear();
        self.transcript.push(TranscriptEntry::system(prompt));
        debug!("transcript reset");
    }

    fn request(&self) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: self.transcript.clone(),
            max_tokens: self.max_tokens,
        }
    }
}
