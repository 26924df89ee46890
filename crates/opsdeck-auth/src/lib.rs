// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential hashing and the account directory for the Opsdeck console.
//!
//! [`Hasher`] produces and verifies self-describing Argon2id PHC strings;
//! [`AccountDirectory`] registers and authenticates users against the
//! persistence facade, translating storage and hash failures into its own
//! result kinds so no backend detail leaks to callers.

pub mod directory;
pub mod hasher;

pub use directory::{AccountDirectory, AuthError, RegistrationError};
pub use hasher::{HashError, Hasher};
