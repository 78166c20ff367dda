// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response aggregation for multi-expert answers.
//!
//! [`ResponseAggregator`] turns several [`ExpertResponse`]s into one
//! [`AggregatedResponse`] using weighted-average labelling, consensus
//! detection or primary-plus-excerpts synthesis.
//!
//! [`ExpertResponse`]: conclave_core::ExpertResponse
//! [`AggregatedResponse`]: conclave_core::AggregatedResponse

pub mod aggregator;

pub use aggregator::{ResponseAggregator, aggregate_confidence};
