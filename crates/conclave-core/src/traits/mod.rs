// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits at the boundary between the routing core and its collaborators.

pub mod completion;

pub use completion::CompletionBackend;
