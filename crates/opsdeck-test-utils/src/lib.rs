// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the Opsdeck workspace.

pub mod mock_completion;

pub use mock_completion::MockCompletion;
