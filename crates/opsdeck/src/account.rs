// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdeck register` and `opsdeck login` command implementations.

use std::sync::Arc;

use colored::Colorize;

use opsdeck_auth::{AccountDirectory, RegistrationError};
use opsdeck_config::OpsdeckConfig;
use opsdeck_core::OpsdeckError;
use opsdeck_storage::Store;

/// Registers a new user, prompting twice for the password.
pub async fn run_register(
    config: &OpsdeckConfig,
    username: &str,
    role: Option<&str>,
) -> Result<(), OpsdeckError> {
    let password = rpassword::prompt_password("Password: ")
        .map_err(|e| OpsdeckError::Internal(format!("failed to read password: {e}")))?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .map_err(|e| OpsdeckError::Internal(format!("failed to read password: {e}")))?;

    if password != confirm {
        eprintln!("{}", "passwords do not match".red());
        return Ok(());
    }
    if username.is_empty() || password.is_empty() {
        eprintln!("{}", "username and password must not be empty".red());
        return Ok(());
    }

    let store = Arc::new(Store::from_config(&config.storage));
    store.connect().await?;
    let directory = AccountDirectory::new(store.clone());

    match directory.register(username, &password, role).await {
        Ok(identity) => {
            println!(
                "{} user '{}' registered with role '{}'",
                "ok:".green(),
                identity.username,
                identity.role
            );
        }
        Err(RegistrationError::DuplicateUsername) => {
            eprintln!("{}", "that username is already taken".yellow());
        }
        Err(RegistrationError::Unavailable) => {
            eprintln!("{}", "registration failed, try again later".red());
        }
    }

    store.close().await
}

/// Verifies a user's credentials.
///
/// Both unknown usernames and wrong passwords print the same line.
pub async fn run_login(config: &OpsdeckConfig, username: &str) -> Result<(), OpsdeckError> {
    let password = rpassword::prompt_password("Password: ")
        .map_err(|e| OpsdeckError::Internal(format!("failed to read password: {e}")))?;

    let store = Arc::new(Store::from_config(&config.storage));
    store.connect().await?;
    let directory = AccountDirectory::new(store.clone());

    match directory.authenticate(username, &password).await {
        Ok(identity) => {
            println!(
                "{} logged in as {} ({})",
                "ok:".green(),
                identity.username,
                identity.role
            );
        }
        Err(e) => {
            // AuthError renders one unified message for unknown-user and
            // wrong-password; relaying it leaks nothing.
            eprintln!("{}", e.to_string().red());
        }
    }

    store.close().await
}
