// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration and authentication over the persistence facade.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use opsdeck_core::{Identity, OpsdeckError};
use opsdeck_storage::Store;
use opsdeck_storage::queries::users;

use crate::hasher::{HashError, Hasher};

/// Role assigned when a caller registers without naming one.
const DEFAULT_ROLE: &str = "user";

/// Errors from [`AccountDirectory::register`].
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The username is already taken. No row was written.
    #[error("username already exists")]
    DuplicateUsername,

    /// Storage or hashing failed. Details stay in the logs.
    #[error("registration unavailable")]
    Unavailable,
}

/// Errors from [`AccountDirectory::authenticate`].
///
/// `UnknownUser` and `BadPassword` are distinct variants so internal logging
/// can tell them apart, but they render the same message: a caller relaying
/// the error text cannot be used to enumerate usernames.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential record for the username.
    #[error("invalid credentials")]
    UnknownUser,

    /// The password did not match the stored hash.
    #[error("invalid credentials")]
    BadPassword,

    /// Storage failed or the stored hash was unusable. Details stay in the logs.
    #[error("authentication unavailable")]
    Unavailable,
}

/// Registers and authenticates users.
///
/// Holds no per-user state: each call takes its inputs, consults the hasher
/// and the facade, and returns an immutable [`Identity`].
pub struct AccountDirectory {
    store: Arc<Store>,
    hasher: Hasher,
}

impl AccountDirectory {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            hasher: Hasher::new(),
        }
    }

    /// Registers a new user and returns its identity.
    ///
    /// The pre-insert lookup gives the common duplicate case a cheap answer,
    /// but the authoritative duplicate signal is the storage uniqueness
    /// constraint: two concurrent registrations of the same username race
    /// past the lookup, and the loser's insert fails with a unique violation
    /// that maps to [`RegistrationError::DuplicateUsername`] here.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<Identity, RegistrationError> {
        let existing = users::find_by_username(&self.store, username)
            .await
            .map_err(|e| {
                warn!(error = %e, "registration lookup failed");
                RegistrationError::Unavailable
            })?;
        if existing.is_some() {
            debug!(username, "registration rejected: username taken");
            return Err(RegistrationError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash(password).map_err(|e| {
            warn!(error = %e, "registration hashing failed");
            RegistrationError::Unavailable
        })?;

        let role = role.unwrap_or(DEFAULT_ROLE);
        match users::insert(&self.store, username, &password_hash, role).await {
            Ok(()) => {
                debug!(username, role, "user registered");
                Ok(Identity {
                    username: username.to_string(),
                    password_hash,
                    role: role.to_string(),
                })
            }
            Err(OpsdeckError::UniqueViolation) => {
                // Lost a registration race after the lookup.
                debug!(username, "registration rejected by uniqueness constraint");
                Err(RegistrationError::DuplicateUsername)
            }
            Err(e) => {
                warn!(error = %e, "registration insert failed");
                Err(RegistrationError::Unavailable)
            }
        }
    }

    /// Authenticates a user and returns its identity.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let identity = match users::find_by_username(&self.store, username).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                warn!(username, "authentication failed: unknown username");
                return Err(AuthError::UnknownUser);
            }
            Err(e) => {
                warn!(error = %e, "authentication lookup failed");
                return Err(AuthError::Unavailable);
            }
        };

        match self.hasher.verify(password, &identity.password_hash) {
            Ok(true) => Ok(identity),
            Ok(false) => {
                warn!(username, "authentication failed: password mismatch");
                Err(AuthError::BadPassword)
            }
            Err(HashError::Malformed(_)) => {
                warn!(username, "authentication failed: stored hash unusable");
                Err(AuthError::Unavailable)
            }
            Err(e) => {
                warn!(error = %e, "authentication verify failed");
                Err(AuthError::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_directory() -> (AccountDirectory, Arc<Store>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path().join("test.db"), true));
        store.connect().await.unwrap();
        (AccountDirectory::new(store.clone()), store, dir)
    }

    #[tokio::test]
    async fn register_then_authenticate_roundtrips() {
        let (directory, _store, _dir) = setup_directory().await;

        let registered = directory
            .register("alice", "pw1", Some("admin"))
            .await
            .unwrap();
        assert_eq!(registered.username, "alice");
        assert_eq!(registered.role, "admin");

        let authenticated = directory.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(authenticated.username, "alice");
        assert_eq!(authenticated.role, "admin");
    }

    #[tokio::test]
    async fn register_defaults_role_to_user() {
        let (directory, _store, _dir) = setup_directory().await;
        let identity = directory.register("bob", "pw", None).await.unwrap();
        assert_eq!(identity.role, "user");
    }

    #[tokio::test]
    async fn duplicate_register_fails_and_first_password_wins() {
        let (directory, _store, _dir) = setup_directory().await;

        directory.register("alice", "pw1", None).await.unwrap();
        let err = directory.register("alice", "pw2", None).await.unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateUsername));

        // The stored hash still verifies only against the first password.
        assert!(directory.authenticate("alice", "pw1").await.is_ok());
        assert!(matches!(
            directory.authenticate("alice", "pw2").await.unwrap_err(),
            AuthError::BadPassword
        ));
    }

    #[tokio::test]
    async fn unknown_user_and_bad_password_render_identically() {
        let (directory, _store, _dir) = setup_directory().await;
        directory.register("alice", "pw1", None).await.unwrap();

        let unknown = directory.authenticate("nobody", "pw1").await.unwrap_err();
        let mismatch = directory.authenticate("alice", "wrong").await.unwrap_err();

        // Distinguishable internally...
        assert!(matches!(unknown, AuthError::UnknownUser));
        assert!(matches!(mismatch, AuthError::BadPassword));
        // ...identical to the caller.
        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[tokio::test]
    async fn rows_written_outside_the_directory_still_count_as_duplicates() {
        let (directory, store, _dir) = setup_directory().await;

        // e.g. a legacy-imported user.
        opsdeck_storage::queries::users::insert(&store, "carol", "h", "user")
            .await
            .unwrap();
        let err = directory.register("carol", "pw", None).await.unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateUsername));
    }

    #[tokio::test]
    async fn unusable_stored_hash_is_unavailable_not_panic() {
        let (directory, store, _dir) = setup_directory().await;
        opsdeck_storage::queries::users::insert(&store, "dave", "not-a-phc-string", "user")
            .await
            .unwrap();

        let err = directory.authenticate("dave", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable));
    }
}
