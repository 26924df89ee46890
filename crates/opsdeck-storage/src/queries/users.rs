// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential record queries.
//!
//! These helpers are thin typed wrappers over the facade's parameterized
//! operations; the `users` table itself is defined by the embedded
//! migrations.

use rusqlite::types::Value;

use opsdeck_core::{Identity, OpsdeckError};

use crate::database::{Row, Store};

/// Looks up a credential record by username.
pub async fn find_by_username(
    store: &Store,
    username: &str,
) -> Result<Option<Identity>, OpsdeckError> {
    let row = store
        .query_one(
            "SELECT username, password_hash, role FROM users WHERE username = ?1",
            vec![Value::from(username.to_string())],
        )
        .await?;
    row.map(identity_from_row).transpose()
}

/// Inserts a new credential record. A duplicate username surfaces as
/// [`OpsdeckError::UniqueViolation`] from the storage constraint.
pub async fn insert(
    store: &Store,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<(), OpsdeckError> {
    store
        .execute(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
            vec![
                Value::from(username.to_string()),
                Value::from(password_hash.to_string()),
                Value::from(role.to_string()),
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a credential record unless the username already exists.
///
/// Returns the number of rows actually written (0 for a duplicate).
pub async fn insert_or_ignore(
    store: &Store,
    username: &str,
    password_hash: &str,
    role: &str,
) -> Result<usize, OpsdeckError> {
    store
        .execute(
            "INSERT OR IGNORE INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
            vec![
                Value::from(username.to_string()),
                Value::from(password_hash.to_string()),
                Value::from(role.to_string()),
            ],
        )
        .await
}

fn identity_from_row(row: Row) -> Result<Identity, OpsdeckError> {
    let mut fields = row.into_iter();
    Ok(Identity {
        username: take_text(fields.next())?,
        password_hash: take_text(fields.next())?,
        role: take_text(fields.next())?,
    })
}

fn take_text(value: Option<Value>) -> Result<String, OpsdeckError> {
    match value {
        Some(Value::Text(s)) => Ok(s),
        other => Err(OpsdeckError::Internal(format!(
            "unexpected column shape in users row: {:?}",
            other.map(|v| v.data_type())
        ))),
    }
}
