// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model tier routing with overrides, budget downgrades and tier caps.
//!
//! Resolution order: forced tier > complexity mapping > budget downgrade > max-tier cap.

use conclave_config::model::RoutingConfig;
use conclave_core::{ComplexityScore, ConclaveError, ModelTier, known_tier_ordinal};
use tracing::{debug, info};

/// Totals at or below this map to the fast tier.
pub const FAST_CEILING: f64 = 3.0;
/// Totals at or below this (and above [`FAST_CEILING`]) map to the balanced tier.
pub const BALANCED_CEILING: f64 = 6.0;
/// Remaining budget below this forces the cheapest tier.
pub const MIN_BUDGET_REMAINING: f64 = 0.01;

/// Absorbs float error in weighted totals so exact boundary scores stay in the lower tier.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Per-call routing inputs beyond the complexity score.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions<'a> {
    /// Return this tier exactly, skipping every other rule.
    pub force_tier: Option<&'a str>,
    /// Never return a tier above this one.
    pub max_tier: Option<&'a str>,
    /// Budget left for the caller, in USD.
    pub budget_remaining: Option<f64>,
    /// Replaces the router's roster for this call only.
    pub custom_tiers: Option<&'a [ModelTier]>,
}

/// A routed tier together with how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    /// Tier the caller should generate with.
    pub tier: ModelTier,
    /// Tier name chosen before budget and cap adjustments.
    pub intended_tier: String,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// Whether low budget forced the cheapest tier.
    pub budget_downgraded: bool,
    /// Whether `max_tier` lowered the result.
    pub capped: bool,
}

/// Maps complexity scores to model tiers.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    tiers: Vec<ModelTier>,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new(ModelTier::default_roster())
    }
}

impl ModelRouter {
    /// Create a router over an ordered tier roster.
    pub fn new(tiers: Vec<ModelTier>) -> Self {
        Self { tiers }
    }

    /// Create a router over the configured roster.
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.tiers.clone())
    }

    /// The default roster for this router.
    pub fn tiers(&self) -> &[ModelTier] {
        &self.tiers
    }

    /// Pick a tier for `score`.
    pub fn route(
        &self,
        score: &ComplexityScore,
        options: RouteOptions<'_>,
    ) -> Result<ModelTier, ConclaveError> {
        self.decide(score, options).map(|decision| decision.tier)
    }

    /// Pick a tier for `score` and explain the choice.
    ///
    /// Fails with [`ConclaveError::InvalidTier`] when `force_tier` or
    /// `max_tier` names a tier missing from the active roster, or when the
    /// active roster is empty.
    pub fn decide(
        &self,
        score: &ComplexityScore,
        options: RouteOptions<'_>,
    ) -> Result<RoutingDecision, ConclaveError> {
        let roster = options.custom_tiers.unwrap_or(self.tiers.as_slice());

        if let Some(forced) = options.force_tier {
            let tier =
                find_tier(roster, forced).ok_or_else(|| ConclaveError::invalid_tier(forced))?;
            info!(tier = forced, "forced tier override");
            return Ok(RoutingDecision {
                tier: tier.clone(),
                intended_tier: forced.to_string(),
                reason: format!("forced to tier {forced}"),
                budget_downgraded: false,
                capped: false,
            });
        }

        let total = score.weighted_total();
        let mapped = tier_name_for_total(total);
        let intended_idx =
            nearest_tier(roster, mapped).ok_or_else(|| ConclaveError::invalid_tier(mapped))?;
        let intended = &roster[intended_idx];
        let mut chosen_idx = intended_idx;

        let mut reason = if intended.name == mapped {
            format!("complexity {total:.2} maps to tier {mapped}")
        } else {
            format!(
                "complexity {total:.2} maps to tier {mapped}, nearest available is {}",
                intended.name
            )
        };

        let mut budget_downgraded = false;
        if let Some(remaining) = options.budget_remaining {
            if remaining < MIN_BUDGET_REMAINING {
                chosen_idx = cheapest_tier(roster);
                budget_downgraded = chosen_idx != intended_idx;
                info!(
                    intended = intended.name.as_str(),
                    actual = roster[chosen_idx].name.as_str(),
                    budget_remaining = remaining,
                    "budget-aware tier downgrade"
                );
                reason.push_str(&format!(
                    "; budget remaining {remaining:.4} forces cheapest tier {}",
                    roster[chosen_idx].name
                ));
            }
        }

        let mut capped = false;
        if let Some(max_name) = options.max_tier {
            let cap_idx = roster
                .iter()
                .position(|t| t.name == max_name)
                .ok_or_else(|| ConclaveError::invalid_tier(max_name))?;
            if tier_ordinal(roster, chosen_idx) > tier_ordinal(roster, cap_idx) {
                debug!(
                    from = roster[chosen_idx].name.as_str(),
                    to = max_name,
                    "tier capped"
                );
                reason.push_str(&format!("; capped at {max_name}"));
                chosen_idx = cap_idx;
                capped = true;
            }
        }

        let tier = roster[chosen_idx].clone();
        debug!(tier = tier.name.as_str(), model = tier.model_name.as_str(), total, "routed");

        Ok(RoutingDecision {
            tier,
            intended_tier: intended.name.clone(),
            reason,
            budget_downgraded,
            capped,
        })
    }
}

/// Well-known tier name for a weighted total.
pub fn tier_name_for_total(total: f64) -> &'static str {
    if total <= FAST_CEILING + BOUNDARY_EPSILON {
        "fast"
    } else if total <= BALANCED_CEILING + BOUNDARY_EPSILON {
        "balanced"
    } else {
        "powerful"
    }
}

fn find_tier<'a>(roster: &'a [ModelTier], name: &str) -> Option<&'a ModelTier> {
    roster.iter().find(|t| t.name == name)
}

/// Ordinal of the tier at `index`: known names first, then roster position.
fn tier_ordinal(roster: &[ModelTier], index: usize) -> usize {
    known_tier_ordinal(&roster[index].name).unwrap_or(3 + index)
}

/// Index of `name`, or of the tier closest to it by ordinal (cheaper wins ties).
fn nearest_tier(roster: &[ModelTier], name: &str) -> Option<usize> {
    if let Some(idx) = roster.iter().position(|t| t.name == name) {
        return Some(idx);
    }
    let target = known_tier_ordinal(name).unwrap_or(0);
    (0..roster.len()).min_by_key(|&idx| {
        let ordinal = tier_ordinal(roster, idx);
        (ordinal.abs_diff(target), ordinal)
    })
}

fn cheapest_tier(roster: &[ModelTier]) -> usize {
    (0..roster.len())
        .min_by_key(|&idx| tier_ordinal(roster, idx))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn tier(name: &str) -> ModelTier {
        ModelTier::new(name, format!("test/{name}"), 0.001, 0.002)
    }

    fn route_name(
        router: &ModelRouter,
        score: ComplexityScore,
        options: RouteOptions<'_>,
    ) -> String {
        router.route(&score, options).unwrap().name
    }

    #[test]
    fn boundaries_map_to_expected_tiers() {
        let router = ModelRouter::default();
        let none = RouteOptions::default();
        assert_eq!(route_name(&router, ComplexityScore::uniform(3.0), none), "fast");
        assert_eq!(route_name(&router, ComplexityScore::uniform(3.001), none), "balanced");
        assert_eq!(route_name(&router, ComplexityScore::uniform(6.0), none), "balanced");
        assert_eq!(route_name(&router, ComplexityScore::uniform(6.001), none), "powerful");
        assert_eq!(route_name(&router, ComplexityScore::uniform(0.0), none), "fast");
        assert_eq!(route_name(&router, ComplexityScore::uniform(10.0), none), "powerful");
    }

    #[test]
    fn forced_tier_wins_over_score() {
        let router = ModelRouter::default();
        let decision = router
            .decide(
                &ComplexityScore::uniform(9.0),
                RouteOptions {
                    force_tier: Some("fast"),
                    budget_remaining: Some(100.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(decision.tier.name, "fast");
        assert!(!decision.budget_downgraded);
        assert!(!decision.capped);
    }

    #[test]
    fn unknown_forced_tier_is_invalid() {
        let router = ModelRouter::default();
        let err = router
            .route(
                &ComplexityScore::uniform(1.0),
                RouteOptions {
                    force_tier: Some("turbo"),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ConclaveError::InvalidTier { ref name } if name == "turbo"));
    }

    #[test]
    #[traced_test]
    fn exhausted_budget_forces_cheapest_tier() {
        let router = ModelRouter::default();
        let decision = router
            .decide(
                &ComplexityScore::uniform(9.5),
                RouteOptions {
                    budget_remaining: Some(0.001),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(decision.tier.name, "fast");
        assert_eq!(decision.intended_tier, "powerful");
        assert!(decision.budget_downgraded);
        assert!(logs_contain("budget-aware tier downgrade"));
    }

    #[test]
    fn budget_at_threshold_is_not_downgraded() {
        let router = ModelRouter::default();
        let decision = router
            .decide(
                &ComplexityScore::uniform(9.5),
                RouteOptions {
                    budget_remaining: Some(0.01),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(decision.tier.name, "powerful");
        assert!(!decision.budget_downgraded);
    }

    #[test]
    fn max_tier_caps_result() {
        let router = ModelRouter::default();
        let decision = router
            .decide(
                &ComplexityScore::uniform(8.0),
                RouteOptions {
                    max_tier: Some("balanced"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(decision.tier.name, "balanced");
        assert!(decision.capped);
    }

    #[test]
    fn max_tier_above_result_is_noop() {
        let router = ModelRouter::default();
        let decision = router
            .decide(
                &ComplexityScore::uniform(1.0),
                RouteOptions {
                    max_tier: Some("powerful"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(decision.tier.name, "fast");
        assert!(!decision.capped);
    }

    #[test]
    fn unknown_max_tier_is_invalid() {
        let router = ModelRouter::default();
        let err = router
            .route(
                &ComplexityScore::uniform(1.0),
                RouteOptions {
                    max_tier: Some("ultra"),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ConclaveError::InvalidTier { .. }));
    }

    #[test]
    fn missing_mapped_tier_uses_nearest_cheaper_on_tie() {
        let router = ModelRouter::default();
        let roster = vec![tier("fast"), tier("powerful")];
        let name = route_name(
            &router,
            ComplexityScore::uniform(5.0),
            RouteOptions {
                custom_tiers: Some(&roster),
                ..Default::default()
            },
        );
        assert_eq!(name, "fast");
    }

    #[test]
    fn missing_mapped_tier_uses_nearest() {
        let router = ModelRouter::default();
        let roster = vec![tier("balanced"), tier("powerful")];
        let name = route_name(
            &router,
            ComplexityScore::uniform(1.0),
            RouteOptions {
                custom_tiers: Some(&roster),
                ..Default::default()
            },
        );
        assert_eq!(name, "balanced");
    }

    #[test]
    fn custom_tiers_do_not_replace_roster() {
        let router = ModelRouter::default();
        let roster = vec![tier("powerful")];
        let name = route_name(
            &router,
            ComplexityScore::uniform(0.0),
            RouteOptions {
                custom_tiers: Some(&roster),
                ..Default::default()
            },
        );
        assert_eq!(name, "powerful");
        assert_eq!(router.tiers().len(), 3);
        assert_eq!(
            route_name(&router, ComplexityScore::uniform(0.0), RouteOptions::default()),
            "fast"
        );
    }

    #[test]
    fn unknown_names_rank_after_known_tiers() {
        let router = ModelRouter::new(vec![tier("mini"), tier("fast"), tier("maxi")]);
        let decision = router
            .decide(
                &ComplexityScore::uniform(9.0),
                RouteOptions {
                    budget_remaining: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap();
        // powerful (2) is missing: mini ranks 3, fast 0, maxi 5
        assert_eq!(decision.intended_tier, "mini");
        assert_eq!(decision.tier.name, "fast");
        assert!(decision.budget_downgraded);
    }

    #[test]
    fn empty_roster_is_invalid_tier() {
        let router = ModelRouter::new(Vec::new());
        let err = router
            .route(&ComplexityScore::uniform(2.0), RouteOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConclaveError::InvalidTier { .. }));
    }

    #[test]
    fn from_config_uses_configured_tiers() {
        let config = RoutingConfig {
            tiers: vec![tier("fast")],
        };
        let router = ModelRouter::from_config(&config);
        assert_eq!(router.tiers().len(), 1);
    }
}
