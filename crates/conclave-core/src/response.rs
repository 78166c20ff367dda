// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expert outputs and the aggregated answer built from them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::clamp_dimension;

/// A single expert's answer, as executed by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertResponse {
    pub expert_id: String,
    pub expert_name: String,
    pub response: String,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ExpertResponse {
    /// Build a response, clamping confidence into `[0, 1]`.
    pub fn new(
        expert_id: impl Into<String>,
        expert_name: impl Into<String>,
        response: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            expert_id: expert_id.into(),
            expert_name: expert_name.into(),
            response: response.into(),
            confidence: clamp_dimension(confidence, 1.0),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// How multiple expert responses are merged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    WeightedAverage,
    Consensus,
    #[default]
    Synthesis,
}

/// The merged answer returned to the end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub final_response: String,
    /// The inputs, preserved exactly as received.
    pub expert_responses: Vec<ExpertResponse>,
    pub aggregation_method: AggregationMethod,
    /// Quadratic-weighted confidence in `[0, 1]`.
    pub confidence: f64,
}
