// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command builds its components from the loaded configuration and
//! returns a JSON document for `main` to print.

use std::path::Path;
use std::str::FromStr;

use conclave_aggregator::ResponseAggregator;
use conclave_config::ConclaveConfig;
use conclave_core::{AgentProfile, ConclaveError, ExpertResponse, SelectionStrategy};
use conclave_cost::{CostGuard, estimate_request_cost};
use conclave_experts::{ExpertGate, ExpertSelector};
use conclave_router::{ComplexityScorer, ModelRouter, RouteOptions, tier_name_for_total};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Inputs for `conclave route`.
#[derive(Debug, Default)]
pub struct RouteArgs<'a> {
    pub query: &'a str,
    pub history: &'a [String],
    pub force_tier: Option<&'a str>,
    pub max_tier: Option<&'a str>,
    pub budget_remaining: Option<f64>,
    pub user_id: &'a str,
    pub team_id: &'a str,
    pub output_tokens: u32,
}

/// Inputs for `conclave select`.
#[derive(Debug, Default)]
pub struct SelectArgs<'a> {
    pub task: &'a str,
    pub skills: &'a [String],
    pub task_type: Option<&'a str>,
    pub strategy: &'a str,
    pub k: Option<usize>,
    pub threshold: Option<f64>,
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConclaveError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConclaveError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ConclaveError::InvalidArgument(format!("{} is not valid JSON input: {e}", path.display()))
    })
}

/// Score a query and report the weighted total with the tier it maps to.
pub async fn score(
    config: &ConclaveConfig,
    query: &str,
    history: &[String],
) -> Result<Value, ConclaveError> {
    let scorer = ComplexityScorer::from_config(&config.classifier);
    let score = scorer.score(query, history, None).await;
    let total = score.weighted_total();

    Ok(json!({
        "score": score,
        "weighted_total": total,
        "mapped_tier": tier_name_for_total(total),
        "classifier": if scorer.has_backend() { "llm" } else { "heuristic" },
    }))
}

/// Score a query, route it and check the estimated spend against the caps.
///
/// Without an explicit `budget_remaining` the router sees what the cost guard
/// has left for this user and team. A denied budget check reroutes to the
/// cheapest tier unless the tier was forced.
pub async fn route(config: &ConclaveConfig, args: &RouteArgs<'_>) -> Result<Value, ConclaveError> {
    let scorer = ComplexityScorer::from_config(&config.classifier);
    let router = ModelRouter::from_config(&config.routing);
    let guard = CostGuard::from_config(&config.cost);

    let score = scorer.score(args.query, args.history, None).await;
    let budget_remaining = args
        .budget_remaining
        .unwrap_or_else(|| guard.usage(args.user_id, args.team_id).remaining());
    let mut options = RouteOptions {
        force_tier: args.force_tier,
        max_tier: args.max_tier,
        budget_remaining: Some(budget_remaining),
        custom_tiers: None,
    };
    let mut decision = router.decide(&score, options)?;

    let mut estimated_cost = estimate_request_cost(&decision.tier, args.query, args.output_tokens);
    let mut budget = guard.check_budget(args.user_id, args.team_id, estimated_cost);
    if !budget.allowed && args.force_tier.is_none() && !decision.budget_downgraded {
        options.budget_remaining = Some(0.0);
        decision = router.decide(&score, options)?;
        estimated_cost = estimate_request_cost(&decision.tier, args.query, args.output_tokens);
        budget = guard.check_budget(args.user_id, args.team_id, estimated_cost);
    }
    debug!(
        tier = decision.tier.name.as_str(),
        budget_remaining,
        estimated_cost,
        allowed = budget.allowed,
        "route computed"
    );

    Ok(json!({
        "score": score,
        "weighted_total": score.weighted_total(),
        "tier": decision.tier,
        "intended_tier": decision.intended_tier,
        "reason": decision.reason,
        "budget_downgraded": decision.budget_downgraded,
        "capped": decision.capped,
        "budget_remaining_usd": budget_remaining,
        "estimated_cost_usd": estimated_cost,
        "budget": budget,
    }))
}

/// Score a roster against a task and apply a selection strategy.
pub fn select(
    config: &ConclaveConfig,
    roster: &[AgentProfile],
    args: &SelectArgs<'_>,
) -> Result<Value, ConclaveError> {
    let strategy = SelectionStrategy::from_str(args.strategy).map_err(|_| {
        ConclaveError::InvalidArgument(format!(
            "unknown selection strategy `{}` (expected top_1, top_k, ensemble or cascade)",
            args.strategy
        ))
    })?;

    let metadata = args.task_type.map(|task_type| {
        let mut map = serde_json::Map::new();
        map.insert("task_type".into(), Value::String(task_type.to_string()));
        map
    });

    let gate = ExpertGate::from_config(&config.features, &config.experts);
    let selector = ExpertSelector::from_config(&config.features, &config.experts);

    let ranked = gate.score_agents(roster, args.task, args.skills, metadata.as_ref());
    let outcome = selector.select(
        &ranked,
        strategy,
        args.k.unwrap_or(config.experts.default_k),
        args.threshold.unwrap_or(config.experts.confidence_threshold),
    );

    serde_json::to_value(outcome).map_err(|e| ConclaveError::Internal(e.to_string()))
}

/// Merge expert responses with the named method, or the configured default.
pub fn aggregate(
    config: &ConclaveConfig,
    responses: &[ExpertResponse],
    method: Option<&str>,
) -> Result<Value, ConclaveError> {
    let aggregator = ResponseAggregator::from_config(&config.features);
    let method = method.unwrap_or(config.aggregation.default_method.as_str());
    let aggregated = aggregator.aggregate(responses, method)?;
    serde_json::to_value(aggregated).map_err(|e| ConclaveError::Internal(e.to_string()))
}

/// Placeholder printed instead of a configured API key.
pub const REDACTED: &str = "<redacted>";

/// Render the effective configuration as TOML, with secrets redacted.
pub fn show_config(config: &ConclaveConfig) -> Result<String, ConclaveError> {
    let mut shown = config.clone();
    if shown.classifier.api_key.is_some() {
        shown.classifier.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown).map_err(|e| ConclaveError::Internal(e.to_string()))
}
