// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Opsdeck console core.

use thiserror::Error;

/// Whether a failed storage statement was reading or writing.
///
/// Storage errors carry only this intent marker. Statement text and bound
/// parameter values stay out of the error chain so credentials can never
/// reach a log line through error rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Read,
    Write,
}

impl std::fmt::Display for StorageOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageOp::Read => write!(f, "read"),
            StorageOp::Write => write!(f, "write"),
        }
    }
}

/// Classification of completion-service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    /// Transport-level failure (connect, TLS, timeout, broken stream).
    Network,
    /// The service rejected the request for rate/quota reasons (HTTP 429).
    Quota,
    /// The service answered but the body did not match the expected shape.
    MalformedResponse,
    /// Any other non-success answer from the service.
    Api,
}

impl std::fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionErrorKind::Network => write!(f, "network"),
            CompletionErrorKind::Quota => write!(f, "quota"),
            CompletionErrorKind::MalformedResponse => write!(f, "malformed response"),
            CompletionErrorKind::Api => write!(f, "api"),
        }
    }
}

/// The primary error type used across Opsdeck crates.
#[derive(Debug, Error)]
pub enum OpsdeckError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors. The message names the statement intent only.
    #[error("storage error during {op}")]
    Storage {
        op: StorageOp,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A write hit a storage-level uniqueness constraint.
    ///
    /// Kept separate from [`OpsdeckError::Storage`] so callers can treat the
    /// constraint as a domain signal (duplicate username) instead of a
    /// generic failure.
    #[error("uniqueness constraint violated")]
    UniqueViolation,

    /// Completion-service errors (network, quota, malformed response).
    #[error("completion error ({kind}): {message}")]
    Completion {
        kind: CompletionErrorKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
