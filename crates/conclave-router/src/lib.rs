// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query complexity scoring and model tier routing for Conclave.
//!
//! This crate provides:
//! - [`ComplexityScorer`]: LLM-backed complexity scoring with a keyword heuristic fallback
//! - [`ChatCompletionClient`]: the OpenAI-compatible client the scorer calls
//! - [`ModelRouter`]: tier selection with forced tiers, budget downgrades and caps
//!
//! Scoring is the only network I/O in the routing core; routing itself is a
//! pure function of the score, the roster and the per-call options.

pub mod llm;
pub mod router;
pub mod scorer;

pub use llm::ChatCompletionClient;
pub use router::{ModelRouter, RouteOptions, RoutingDecision, tier_name_for_total};
pub use scorer::{ComplexityScorer, heuristic_score};
