// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! [`Store`] is the single point of access to the backing SQLite store. All
//! statements are serialized through tokio-rusqlite's single background
//! thread; do NOT create additional `Connection` instances for the same file.
//!
//! Statements are always parameterized: callers pass SQL text with `?N`
//! placeholders and a separate vector of values. Nothing in this module ever
//! interpolates a value into statement text.

use std::path::PathBuf;

use rusqlite::types::Value;
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;
use tracing::debug;

use opsdeck_core::{OpsdeckError, StorageOp};

use crate::migrations;

/// One row, as an ordered tuple of SQLite values.
pub type Row = Vec<Value>;

/// Persistence facade owning at most one live SQLite connection.
///
/// `connect` is idempotent and every read/write operation connects on demand,
/// so callers never manage connection lifecycle themselves. `close` releases
/// the handle; a later operation reopens it.
pub struct Store {
    path: PathBuf,
    wal_mode: bool,
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Creates a store for the given database file. No connection is opened
    /// until the first operation.
    pub fn new(path: impl Into<PathBuf>, wal_mode: bool) -> Self {
        Self {
            path: path.into(),
            wal_mode,
            conn: Mutex::new(None),
        }
    }

    /// Creates a store from the storage section of the console configuration.
    pub fn from_config(config: &opsdeck_config::model::StorageConfig) -> Self {
        Self::new(config.database_path.clone(), config.wal_mode)
    }

    /// Opens the connection if none is live. Safe to call repeatedly.
    ///
    /// The first open creates parent directories, applies PRAGMAs, and runs
    /// embedded migrations.
    pub async fn connect(&self) -> Result<(), OpsdeckError> {
        self.handle().await.map(|_| ())
    }

    /// Returns true while a connection handle is held.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Executes a read-only parameterized statement and returns all matching
    /// rows. No match is an empty vector, not an error.
    pub async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OpsdeckError> {
        let conn = self.handle().await?;
        let sql = sql.to_string();
        conn.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let column_count = stmt.column_count();
            let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(read_row(row, column_count)?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err(StorageOp::Read))
    }

    /// Like [`Store::query_many`] but returns at most one row. An absent row
    /// is an expected outcome (`None`), not an error.
    pub async fn query_one(&self, sql: &str, params: Vec<Value>) -> Result<Option<Row>, OpsdeckError> {
        let conn = self.handle().await?;
        let sql = sql.to_string();
        conn.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let column_count = stmt.column_count();
            let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
            match rows.next()? {
                Some(row) => Ok(Some(read_row(row, column_count)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err(StorageOp::Read))
    }

    /// Runs a mutating parameterized statement and returns the number of
    /// affected rows.
    ///
    /// SQLite autocommits each statement, so the write is durable before this
    /// returns; callers never observe a half-applied write.
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<usize, OpsdeckError> {
        let conn = self.handle().await?;
        let sql = sql.to_string();
        conn.call(move |conn| {
            let affected = conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(affected)
        })
        .await
        .map_err(map_tr_err(StorageOp::Write))
    }

    /// Checkpoints the WAL and releases the connection handle. Idempotent;
    /// the next operation reopens the database.
    pub async fn close(&self) -> Result<(), OpsdeckError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.take() {
            conn.call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err(StorageOp::Write))?;
            debug!("WAL checkpoint complete, connection released");
        }
        Ok(())
    }

    /// Returns the live connection handle, opening one if needed.
    async fn handle(&self) -> Result<Connection, OpsdeckError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                OpsdeckError::Storage {
                    op: StorageOp::Write,
                    source: Box::new(e),
                }
            })?;
        }

        // Migrations run on a short-lived blocking connection before the
        // long-lived async handle opens. WAL mode is persistent in the file,
        // so setting it here covers the async handle too.
        let path = self.path.clone();
        let wal_mode = self.wal_mode;
        tokio::task::spawn_blocking(move || -> Result<(), OpsdeckError> {
            let mut conn = rusqlite::Connection::open(&path).map_err(map_sqlite_err(StorageOp::Write))?;
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")
                    .map_err(map_sqlite_err(StorageOp::Write))?;
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| OpsdeckError::Internal(format!("migration task failed: {e}")))??;

        let conn = Connection::open(&self.path)
            .await
            .map_err(map_sqlite_err(StorageOp::Write))?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err(StorageOp::Write))?;

        debug!(path = %self.path.display(), "database opened");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

/// Reads every column of the current row into an ordered value tuple.
fn read_row(row: &rusqlite::Row<'_>, column_count: usize) -> Result<Row, rusqlite::Error> {
    let mut values = Vec::with_capacity(column_count);
    for i in 0..column_count {
        values.push(row.get::<_, Value>(i)?);
    }
    Ok(values)
}

/// Maps a tokio-rusqlite error into the shared error type.
///
/// Uniqueness-constraint failures get their own variant so callers can treat
/// them as a domain signal. Everything else carries only the statement intent;
/// parameter values never enter the error chain.
pub(crate) fn map_tr_err(op: StorageOp) -> impl FnOnce(tokio_rusqlite::Error) -> OpsdeckError {
    move |err| {
        if let tokio_rusqlite::Error::Error(ref e) = err
            && is_unique_violation(e)
        {
            return OpsdeckError::UniqueViolation;
        }
        OpsdeckError::Storage {
            op,
            source: Box::new(err),
        }
    }
}

/// Maps a plain rusqlite error (from the blocking bootstrap path).
fn map_sqlite_err(op: StorageOp) -> impl FnOnce(rusqlite::Error) -> OpsdeckError {
    move |err| {
        if is_unique_violation(&err) {
            return OpsdeckError::UniqueViolation;
        }
        OpsdeckError::Storage {
            op,
            source: Box::new(err),
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("test.db"), true);
        store.connect().await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let (store, _dir) = setup_store().await;
        store.connect().await.unwrap();
        store.connect().await.unwrap();
        assert!(store.is_connected().await);
    }

    #[tokio::test]
    async fn execute_returns_affected_rows() {
        let (store, _dir) = setup_store().await;
        let affected = store
            .execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
                vec![
                    Value::from("alice".to_string()),
                    Value::from("h1".to_string()),
                    Value::from("user".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn query_one_absent_is_none_not_error() {
        let (store, _dir) = setup_store().await;
        let row = store
            .query_one(
                "SELECT id FROM users WHERE username = ?1",
                vec![Value::from("nobody".to_string())],
            )
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn query_many_no_match_is_empty_vec() {
        let (store, _dir) = setup_store().await;
        let rows = store
            .query_many(
                "SELECT id FROM users WHERE role = ?1",
                vec![Value::from("auditor".to_string())],
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn parameters_are_bound_not_interpolated() {
        let (store, _dir) = setup_store().await;
        // A value full of SQL metacharacters must round-trip untouched.
        let hostile = "x'; DROP TABLE users; --";
        store
            .execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                vec![
                    Value::from(hostile.to_string()),
                    Value::from("h".to_string()),
                ],
            )
            .await
            .unwrap();

        let row = store
            .query_one(
                "SELECT username FROM users WHERE username = ?1",
                vec![Value::from(hostile.to_string())],
            )
            .await
            .unwrap()
            .expect("row should exist");
        assert_eq!(row[0], Value::Text(hostile.to_string()));
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_unique_violation() {
        let (store, _dir) = setup_store().await;
        store
            .execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                vec![
                    Value::from("carol".to_string()),
                    Value::from("h1".to_string()),
                ],
            )
            .await
            .unwrap();

        let err = store
            .execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                vec![
                    Value::from("carol".to_string()),
                    Value::from("h2".to_string()),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OpsdeckError::UniqueViolation));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_reconnect_reopens() {
        let (store, _dir) = setup_store().await;
        store
            .execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                vec![
                    Value::from("dave".to_string()),
                    Value::from("h".to_string()),
                ],
            )
            .await
            .unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(!store.is_connected().await);

        // The next read reopens the same file and sees the committed write.
        let row = store
            .query_one(
                "SELECT username FROM users WHERE username = ?1",
                vec![Value::from("dave".to_string())],
            )
            .await
            .unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn migrations_create_domain_tables() {
        let (store, _dir) = setup_store().await;
        for table in ["cyber_incidents", "datasets_metadata", "it_tickets"] {
            let row = store
                .query_one(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    vec![Value::from(table.to_string())],
                )
                .await
                .unwrap();
            assert!(row.is_some(), "table {table} should exist");
        }
    }

    #[tokio::test]
    async fn storage_error_display_has_no_parameter_values() {
        let (store, _dir) = setup_store().await;
        let err = store
            .execute(
                "INSERT INTO no_such_table (x) VALUES (?1)",
                vec![Value::from("super-secret".to_string())],
            )
            .await
            .unwrap_err();
        let rendered = err.to_string();
        assert!(!rendered.contains("super-secret"), "got: {rendered}");
    }
}
