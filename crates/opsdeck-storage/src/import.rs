// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot legacy user import.
//!
//! Merges a newline-delimited `username,password_hash` flat file into the
//! users table. Duplicates are skipped via `INSERT OR IGNORE`; malformed
//! lines and per-row storage failures are logged and do not abort the run.

use std::path::Path;

use tracing::{debug, info, warn};

use opsdeck_core::OpsdeckError;

use crate::database::Store;
use crate::queries::users;

/// Imports users from a flat file and returns how many rows were actually
/// inserted.
///
/// Per line: blank lines are skipped; lines with fewer than two
/// comma-separated fields are skipped; trailing fields beyond the second are
/// ignored. A missing file is not fatal and reports zero imported.
pub async fn import_from_flat_file(
    store: &Store,
    path: impl AsRef<Path>,
) -> Result<usize, OpsdeckError> {
    let path = path.as_ref();
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "import file not found, nothing to import");
            return Ok(0);
        }
        Err(e) => {
            return Err(OpsdeckError::Internal(format!(
                "failed to read import file {}: {e}",
                path.display()
            )));
        }
    };

    let mut imported = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 2 {
            debug!("skipping malformed import line");
            continue;
        }

        let username = parts[0];
        let password_hash = parts[1];

        match users::insert_or_ignore(store, username, password_hash, "user").await {
            Ok(written) if written > 0 => imported += 1,
            Ok(_) => debug!(username, "skipping duplicate user"),
            Err(e) => warn!(username, error = %e, "failed to import user record"),
        }
    }

    info!(path = %path.display(), imported, "legacy import complete");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Store;
    use tempfile::tempdir;

    async fn setup_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::new(dir.path().join("test.db"), true);
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn imports_valid_lines_and_skips_the_rest() {
        let dir = tempdir().unwrap();
        let store = setup_store(&dir).await;

        let file = dir.path().join("users.txt");
        std::fs::write(&file, "alice,h1\n\nbob,h2,extra\nmalformed\n").unwrap();

        let imported = import_from_flat_file(&store, &file).await.unwrap();
        assert_eq!(imported, 2);

        for name in ["alice", "bob"] {
            let found = users::find_by_username(&store, name).await.unwrap();
            assert!(found.is_some(), "{name} should have been imported");
        }
        // The trailing field on bob's line is ignored.
        let bob = users::find_by_username(&store, "bob").await.unwrap().unwrap();
        assert_eq!(bob.password_hash, "h2");
    }

    #[tokio::test]
    async fn rerun_imports_nothing_new() {
        let dir = tempdir().unwrap();
        let store = setup_store(&dir).await;

        let file = dir.path().join("users.txt");
        std::fs::write(&file, "alice,h1\nbob,h2\n").unwrap();

        assert_eq!(import_from_flat_file(&store, &file).await.unwrap(), 2);
        assert_eq!(import_from_flat_file(&store, &file).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_reports_zero() {
        let dir = tempdir().unwrap();
        let store = setup_store(&dir).await;

        let imported = import_from_flat_file(&store, dir.path().join("no-such-file.txt"))
            .await
            .unwrap();
        assert_eq!(imported, 0);
    }

    #[tokio::test]
    async fn imported_rows_get_default_role() {
        let dir = tempdir().unwrap();
        let store = setup_store(&dir).await;

        let file = dir.path().join("users.txt");
        std::fs::write(&file, "erin,h9\n").unwrap();
        import_from_flat_file(&store, &file).await.unwrap();

        let erin = users::find_by_username(&store, "erin").await.unwrap().unwrap();
        assert_eq!(erin.role, "user");
    }
}
