// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expert scoring and selection for multi-agent tasks.
//!
//! [`ExpertGate`] ranks a caller-supplied agent roster on four weighted
//! signals; [`ExpertSelector`] applies a [`SelectionStrategy`] to that ranking,
//! falling back to a configured agent when nothing qualifies.
//!
//! [`SelectionStrategy`]: conclave_core::SelectionStrategy

pub mod gate;
pub mod selector;

pub use gate::{ExpertGate, ScoredAgent, ScoringDefaults};
pub use selector::ExpertSelector;
