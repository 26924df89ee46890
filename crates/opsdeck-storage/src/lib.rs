// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence facade for the Opsdeck console.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, parameterized
//! read/write operations for all callers, and the one-shot legacy user
//! import.

pub mod database;
pub mod import;
pub mod migrations;
pub mod queries;

pub use database::{Row, Store};
pub use import::import_from_flat_file;
