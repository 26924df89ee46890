// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Opsdeck operator console.
//!
//! This crate provides the error taxonomy, the value types shared across the
//! workspace (identities, transcript entries, session context), and the
//! [`CompletionBackend`] trait that decouples the conversation session from
//! any concrete completion service client.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CompletionErrorKind, OpsdeckError, StorageOp};
pub use traits::{CompletionBackend, CompletionReply, CompletionRequest, FragmentStream};
pub use types::{Identity, Role, SessionContext, TranscriptEntry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = OpsdeckError::Config("test".into());
        let _storage = OpsdeckError::Storage {
            op: StorageOp::Read,
            source: Box::new(std::io::Error::other("test")),
        };
        let _unique = OpsdeckError::UniqueViolation;
        let _completion = OpsdeckError::Completion {
            kind: CompletionErrorKind::Network,
            message: "test".into(),
            source: None,
        };
        let _internal = OpsdeckError::Internal("test".into());
    }

    #[test]
    fn storage_error_display_names_intent_only() {
        let err = OpsdeckError::Storage {
            op: StorageOp::Write,
            source: Box::new(std::io::Error::other("UNIQUE constraint failed: users.username")),
        };
        // The rendered message must not echo statement text or parameters.
        assert_eq!(err.to_string(), "storage error during write");
    }

    #[test]
    fn completion_error_display_includes_kind() {
        let err = OpsdeckError::Completion {
            kind: CompletionErrorKind::Quota,
            message: "rate limited".into(),
            source: None,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("quota"), "got: {rendered}");
    }
}
