// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Conclave routing engine.
//!
//! This crate provides the value types exchanged between the scorer, router,
//! budget guard, expert gate, selector and aggregator, together with the
//! shared error type and the completion backend trait.

pub mod agent;
pub mod error;
pub mod response;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use agent::{
    AgentProfile, EXPERT_WEIGHTS, ExpertScore, SelectionOutcome, SelectionResult,
    SelectionStrategy,
};
pub use error::ConclaveError;
pub use response::{AggregatedResponse, AggregationMethod, ExpertResponse};
pub use traits::CompletionBackend;
pub use types::{BudgetCheck, COMPLEXITY_WEIGHTS, ComplexityScore, ModelTier, known_tier_ordinal};
