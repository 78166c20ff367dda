// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging of expert responses.
//!
//! Every method first orders responses by confidence, highest first, keeping
//! input order among equals. Text is never blended: weighting only affects
//! order and the labels shown next to each response.

use std::str::FromStr;

use conclave_config::model::FeatureFlags;
use conclave_core::types::clamp_dimension;
use conclave_core::{AggregatedResponse, AggregationMethod, ConclaveError, ExpertResponse};
use tracing::debug;

/// Confidence at or above which a response counts toward consensus.
pub const CONSENSUS_CONFIDENCE: f64 = 0.7;
/// Primary confidence below which synthesis appends other perspectives.
pub const SYNTHESIS_CONFIDENCE: f64 = 0.8;
/// Characters kept from each additional perspective.
pub const EXCERPT_CHARS: usize = 200;

/// Combines expert responses into a single answer.
#[derive(Debug, Clone)]
pub struct ResponseAggregator {
    enabled: bool,
}

impl Default for ResponseAggregator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResponseAggregator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn from_config(features: &FeatureFlags) -> Self {
        Self::new(features.enable_response_aggregation)
    }

    /// Aggregate with a method named by string.
    ///
    /// Fails with [`ConclaveError::InvalidState`] when aggregation is disabled
    /// or `responses` is empty, and with [`ConclaveError::InvalidArgument`] for
    /// an unknown method name.
    pub fn aggregate(
        &self,
        responses: &[ExpertResponse],
        method: &str,
    ) -> Result<AggregatedResponse, ConclaveError> {
        self.ensure_usable(responses)?;
        let method = AggregationMethod::from_str(method).map_err(|_| {
            ConclaveError::InvalidArgument(format!(
                "unknown aggregation method `{method}` (expected weighted_average, consensus or synthesis)"
            ))
        })?;
        self.aggregate_with(responses, method)
    }

    /// Aggregate with an already-parsed method.
    pub fn aggregate_with(
        &self,
        responses: &[ExpertResponse],
        method: AggregationMethod,
    ) -> Result<AggregatedResponse, ConclaveError> {
        self.ensure_usable(responses)?;

        let mut ranked: Vec<&ExpertResponse> = responses.iter().collect();
        ranked.sort_by(|a, b| confidence_of(b).total_cmp(&confidence_of(a)));

        let final_response = match method {
            AggregationMethod::WeightedAverage => weighted_average(&ranked),
            AggregationMethod::Consensus => consensus(&ranked),
            AggregationMethod::Synthesis => synthesis(&ranked),
        };
        let confidence = aggregate_confidence(responses);

        debug!(
            method = %method,
            responses = responses.len(),
            confidence,
            "responses aggregated"
        );

        Ok(AggregatedResponse {
            final_response,
            expert_responses: responses.to_vec(),
            aggregation_method: method,
            confidence,
        })
    }

    fn ensure_usable(&self, responses: &[ExpertResponse]) -> Result<(), ConclaveError> {
        if !self.enabled {
            return Err(ConclaveError::InvalidState(
                "response aggregation is disabled".into(),
            ));
        }
        if responses.is_empty() {
            return Err(ConclaveError::InvalidState(
                "no expert responses to aggregate".into(),
            ));
        }
        Ok(())
    }
}

/// `Σc² / Σc`, clamped to `[0, 1]`; zero when every confidence is zero.
pub fn aggregate_confidence(responses: &[ExpertResponse]) -> f64 {
    let (squares, sum) = responses.iter().map(confidence_of).fold(
        (0.0_f64, 0.0_f64),
        |(squares, sum), c| (squares + c * c, sum + c),
    );
    if sum <= 0.0 {
        return 0.0;
    }
    clamp_dimension(squares / sum, 1.0)
}

fn confidence_of(response: &ExpertResponse) -> f64 {
    clamp_dimension(response.confidence, 1.0)
}

fn weighted_average(ranked: &[&ExpertResponse]) -> String {
    let total: f64 = ranked.iter().map(|r| confidence_of(r)).sum();
    ranked
        .iter()
        .map(|r| {
            let weight = if total > 0.0 {
                confidence_of(r) / total * 100.0
            } else {
                100.0 / ranked.len() as f64
            };
            format!("**{}** (weight: {weight:.1}%)\n{}", r.expert_name, r.response)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn consensus(ranked: &[&ExpertResponse]) -> String {
    let n = ranked.len();
    let high: Vec<&ExpertResponse> = ranked
        .iter()
        .copied()
        .filter(|r| confidence_of(r) >= CONSENSUS_CONFIDENCE)
        .collect();
    let quorum = (2 * n).div_ceil(3);

    if !high.is_empty() && high.len() >= quorum {
        let top = high[0];
        let mut text = format!(
            "## Consensus Reached\n\n{}\n\n*Primary response from {}",
            top.response, top.expert_name
        );
        let agreeing: Vec<&str> = high[1..].iter().map(|r| r.expert_name.as_str()).collect();
        if agreeing.is_empty() {
            text.push_str(".*");
        } else {
            text.push_str(&format!(", with agreement from {}.*", agreeing.join(", ")));
        }
        return text;
    }

    let mut text = String::from("## No Clear Consensus — Multiple Perspectives");
    for (i, r) in ranked.iter().enumerate() {
        text.push_str(&format!(
            "\n\n### {}. {} (confidence: {:.0}%)\n{}",
            i + 1,
            r.expert_name,
            confidence_of(r) * 100.0,
            r.response
        ));
    }
    text
}

fn synthesis(ranked: &[&ExpertResponse]) -> String {
    let primary = ranked[0];
    let mut text = format!("## Primary Response\n\n{}", primary.response);

    if confidence_of(primary) < SYNTHESIS_CONFIDENCE && ranked.len() > 1 {
        text.push_str("\n\n## Additional Perspectives");
        for r in &ranked[1..] {
            let excerpt: String = r.response.chars().take(EXCERPT_CHARS).collect();
            text.push_str(&format!("\n\n- **{}**: {excerpt}...", r.expert_name));
        }
    }
    text
}
