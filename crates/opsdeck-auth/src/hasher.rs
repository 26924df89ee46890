// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-way password hashing with Argon2id.
//!
//! Output is a PHC string: it embeds the algorithm, version, cost parameters,
//! and a per-credential random salt, so verification needs no side-channel
//! lookup and cost parameters can change without invalidating old hashes.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;

/// Errors from hashing or verifying credentials.
#[derive(Debug, Error)]
pub enum HashError {
    /// The stored value is not a parseable PHC string.
    #[error("stored hash is not a valid PHC string: {0}")]
    Malformed(String),

    /// Hashing itself failed (invalid parameters, internal failure).
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Argon2id credential hasher.
///
/// Uses the `argon2` crate's defaults (Argon2id v19, OWASP-recommended
/// costs). Each hash carries its own parameters, so tuning the defaults
/// later leaves previously stored hashes verifiable.
#[derive(Default)]
pub struct Hasher {
    argon2: Argon2<'static>,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a plaintext password with a freshly generated random salt.
    ///
    /// The same plaintext hashed twice yields different strings.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored PHC string.
    ///
    /// Recomputes with the salt and cost embedded in `stored`; the comparison
    /// inside `argon2` is constant-time. A well-formed mismatch is
    /// `Ok(false)`, never an error.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored).map_err(|e| HashError::Malformed(e.to_string()))?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            // Anything else means the stored string itself is unusable
            // (unsupported algorithm, bad parameter encoding).
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }
}
