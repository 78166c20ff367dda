// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query complexity, model tier and budget value types.

use serde::{Deserialize, Serialize};

/// Upper bound of every 0-10 scoring dimension.
pub const MAX_DIMENSION: f64 = 10.0;

/// Weights applied to the five complexity dimensions, in field order.
pub const COMPLEXITY_WEIGHTS: [(&str, f64); 5] = [
    ("reasoning_depth", 0.30),
    ("domain_specificity", 0.25),
    ("creativity", 0.20),
    ("context_dependency", 0.15),
    ("output_length", 0.10),
];

/// Clamp a dimension into `[0, max]`, mapping NaN to zero.
pub fn clamp_dimension(value: f64, max: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, max) }
}

/// How hard a query is, on five 0-10 dimensions.
///
/// Both the LLM and heuristic scoring paths produce this same shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexityScore {
    pub reasoning_depth: f64,
    pub domain_specificity: f64,
    pub creativity: f64,
    pub context_dependency: f64,
    pub output_length: f64,
}

impl ComplexityScore {
    /// Build a score, clamping every dimension into `[0, 10]`.
    pub fn new(
        reasoning_depth: f64,
        domain_specificity: f64,
        creativity: f64,
        context_dependency: f64,
        output_length: f64,
    ) -> Self {
        Self {
            reasoning_depth: clamp_dimension(reasoning_depth, MAX_DIMENSION),
            domain_specificity: clamp_dimension(domain_specificity, MAX_DIMENSION),
            creativity: clamp_dimension(creativity, MAX_DIMENSION),
            context_dependency: clamp_dimension(context_dependency, MAX_DIMENSION),
            output_length: clamp_dimension(output_length, MAX_DIMENSION),
        }
    }

    /// A score with the same value on every dimension.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value, value)
    }

    /// Dimension values in [`COMPLEXITY_WEIGHTS`] order.
    pub fn dimensions(&self) -> [f64; 5] {
        [
            self.reasoning_depth,
            self.domain_specificity,
            self.creativity,
            self.context_dependency,
            self.output_length,
        ]
    }

    /// Fixed-weight linear combination of the dimensions, in `[0, 10]`.
    pub fn weighted_total(&self) -> f64 {
        let total: f64 = self
            .dimensions()
            .iter()
            .zip(COMPLEXITY_WEIGHTS.iter())
            .map(|(value, (_, weight))| value * weight)
            .sum();
        clamp_dimension(total, MAX_DIMENSION)
    }
}

/// Ordinal of the well-known tier names: fast=0, balanced=1, powerful=2.
pub fn known_tier_ordinal(name: &str) -> Option<usize> {
    match name {
        "fast" => Some(0),
        "balanced" => Some(1),
        "powerful" => Some(2),
        _ => None,
    }
}

/// A named cost/capability bucket for a generation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelTier {
    /// Tier name (e.g. "fast").
    pub name: String,
    /// Provider-qualified model identifier (e.g. "openai/gpt-4o-mini").
    pub model_name: String,
    /// USD per 1,000 input tokens.
    pub cost_per_1k_input: f64,
    /// USD per 1,000 output tokens.
    pub cost_per_1k_output: f64,
}

impl ModelTier {
    pub fn new(
        name: impl Into<String>,
        model_name: impl Into<String>,
        cost_per_1k_input: f64,
        cost_per_1k_output: f64,
    ) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            cost_per_1k_input: cost_per_1k_input.max(0.0),
            cost_per_1k_output: cost_per_1k_output.max(0.0),
        }
    }

    /// The default fast < balanced < powerful roster.
    pub fn default_roster() -> Vec<ModelTier> {
        vec![
            ModelTier::new("fast", "openai/gpt-4o-mini", 0.00015, 0.0006),
            ModelTier::new("balanced", "anthropic/claude-3.5-sonnet", 0.003, 0.015),
            ModelTier::new("powerful", "anthropic/claude-opus-4", 0.015, 0.075),
        ]
    }

    /// Cost in USD for the given token counts.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (f64::from(input_tokens) / 1000.0) * self.cost_per_1k_input
            + (f64::from(output_tokens) / 1000.0) * self.cost_per_1k_output
    }
}

/// Outcome of a budget check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheck {
    /// Whether the estimated spend fits within every cap.
    pub allowed: bool,
    /// Budget left on the binding cap, never negative.
    pub remaining: f64,
    /// Tier to fall back to; only set on denial.
    pub suggested_tier: Option<String>,
}

impl BudgetCheck {
    /// Tier suggested whenever a check is denied.
    pub const DENIED_SUGGESTED_TIER: &'static str = "fast";

    pub fn allow(remaining: f64) -> Self {
        Self {
            allowed: true,
            remaining: remaining.max(0.0),
            suggested_tier: None,
        }
    }

    pub fn deny(remaining: f64) -> Self {
        Self {
            allowed: false,
            remaining: remaining.max(0.0),
            suggested_tier: Some(Self::DENIED_SUGGESTED_TIER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_weights_sum_to_one() {
        let sum: f64 = COMPLEXITY_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-12, "weights sum to {sum}");
    }

    #[test]
    fn weighted_total_extremes() {
        assert_eq!(ComplexityScore::uniform(0.0).weighted_total(), 0.0);
        assert!((ComplexityScore::uniform(10.0).weighted_total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_total_mixed_score() {
        let score = ComplexityScore::new(7.0, 5.0, 3.0, 8.0, 2.0);
        assert!((score.weighted_total() - 5.35).abs() < 1e-9);
    }

    #[test]
    fn dimensions_are_clamped() {
        let score = ComplexityScore::new(-3.0, 42.0, f64::NAN, 5.0, 10.5);
        assert_eq!(score.reasoning_depth, 0.0);
        assert_eq!(score.domain_specificity, 10.0);
        assert_eq!(score.creativity, 0.0);
        assert_eq!(score.context_dependency, 5.0);
        assert_eq!(score.output_length, 10.0);
    }

    #[test]
    fn default_roster_is_ordered_by_ordinal() {
        let roster = ModelTier::default_roster();
        let ordinals: Vec<_> = roster
            .iter()
            .map(|t| known_tier_ordinal(&t.name).unwrap())
            .collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert!(roster.iter().all(|t| t.model_name.contains('/')));
    }

    #[test]
    fn tier_cost_estimate() {
        let tier = ModelTier::new("balanced", "anthropic/claude-3.5-sonnet", 0.003, 0.015);
        // 2000/1000 * 0.003 + 500/1000 * 0.015 = 0.006 + 0.0075
        assert!((tier.estimate_cost(2000, 500) - 0.0135).abs() < 1e-12);
    }

    #[test]
    fn negative_tier_costs_are_floored() {
        let tier = ModelTier::new("fast", "x/y", -1.0, -2.0);
        assert_eq!(tier.cost_per_1k_input, 0.0);
        assert_eq!(tier.cost_per_1k_output, 0.0);
    }

    #[test]
    fn budget_check_constructors() {
        let ok = BudgetCheck::allow(-0.0000001);
        assert!(ok.allowed);
        assert_eq!(ok.remaining, 0.0);
        assert!(ok.suggested_tier.is_none());

        let denied = BudgetCheck::deny(1.5);
        assert!(!denied.allowed);
        assert_eq!(denied.suggested_tier.as_deref(), Some("fast"));
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn weighted_total_stays_in_range(
                a in -50.0f64..50.0,
                b in -50.0f64..50.0,
                c in -50.0f64..50.0,
                d in -50.0f64..50.0,
                e in -50.0f64..50.0,
            ) {
                let total = ComplexityScore::new(a, b, c, d, e).weighted_total();
                prop_assert!((0.0..=10.0).contains(&total));
            }
        }
    }
}
