// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded conversation session manager for the Opsdeck console.
//!
//! A [`ConversationSession`] owns one transcript and proxies it to an
//! external completion service through the [`opsdeck_core::CompletionBackend`]
//! seam. Transcript state never leaves the session and is never persisted.

pub mod prompt;
pub mod session;

pub use prompt::resolve_system_prompt;
pub use session::ConversationSession;
