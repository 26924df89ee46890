// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types shared across the Opsdeck workspace.

use serde::{Deserialize, Serialize};

/// The authenticated representation of a user.
///
/// Immutable once constructed: the directory builds one on successful
/// registration or authentication and callers hold it for the lifetime of
/// their interactive session. Fields are public; there is no behavior here.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The stored hash is salted and one-way, but it still has no business
        // in debug output or log lines.
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Speaker of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a conversation transcript.
///
/// Entries are append-only: a transcript is only ever extended or reset,
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Explicit per-interaction caller context.
///
/// The presentation layer threads one of these through each call instead of
/// keeping a global logged-in flag; the core itself stays stateless about
/// who is currently authenticated.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// The authenticated caller, if any.
    pub identity: Option<Identity>,
}

impl SessionContext {
    /// Context for an unauthenticated interaction.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    /// Context carrying an authenticated identity.
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Returns true when the context carries an authenticated identity.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Role of the authenticated caller, if any.
    pub fn role(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.role.as_str())
    }
}
