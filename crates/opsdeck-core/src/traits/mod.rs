// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the console core and its external collaborators.

pub mod completion;

pub use completion::{CompletionBackend, CompletionReply, CompletionRequest, FragmentStream};
