// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spend enforcement and cost estimation for the Conclave routing core.
//!
//! This crate provides:
//! - **Cost guard**: in-memory per-user daily and per-team monthly caps, safe to share across threads
//! - **Pricing**: request cost estimates from a tier's per-1k token prices

pub mod guard;
pub mod pricing;

pub use guard::{CostGuard, UsageSnapshot};
pub use pricing::{CHARS_PER_TOKEN, estimate_request_cost, estimate_tokens};
