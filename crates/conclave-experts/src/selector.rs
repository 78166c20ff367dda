// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selection strategies over a ranked candidate list.
//!
//! Selection never fails. When nothing reaches the confidence threshold the
//! configured fallback agent is returned, or an empty outcome that says why.

use conclave_config::model::{ExpertConfig, FeatureFlags};
use conclave_core::types::{MAX_DIMENSION, clamp_dimension};
use conclave_core::{ExpertScore, SelectionOutcome, SelectionResult, SelectionStrategy};
use tracing::{debug, info, warn};

use crate::gate::{ScoredAgent, selection_result};

/// Applies a [`SelectionStrategy`] to candidates ranked by [`crate::ExpertGate`].
#[derive(Debug, Clone, Default)]
pub struct ExpertSelector {
    enable_ensemble_mode: bool,
    fallback_agent_id: Option<String>,
}

impl ExpertSelector {
    pub fn new(enable_ensemble_mode: bool, fallback_agent_id: Option<String>) -> Self {
        Self {
            enable_ensemble_mode,
            fallback_agent_id,
        }
    }

    pub fn from_config(features: &FeatureFlags, experts: &ExpertConfig) -> Self {
        Self::new(
            features.enable_ensemble_mode,
            experts.fallback_agent_id.clone(),
        )
    }

    /// Pick agents from `ranked` (best first).
    ///
    /// `k` bounds TOP_K and ENSEMBLE; zero is treated as one. The threshold is
    /// clamped into `[0, 10]`.
    pub fn select(
        &self,
        ranked: &[ScoredAgent<'_>],
        strategy: SelectionStrategy,
        k: usize,
        confidence_threshold: f64,
    ) -> SelectionOutcome {
        let threshold = clamp_threshold(confidence_threshold);
        let k = k.max(1);

        let applied = match strategy {
            SelectionStrategy::TopK | SelectionStrategy::Ensemble
                if !self.enable_ensemble_mode =>
            {
                debug!(requested = %strategy, "ensemble mode disabled, using top_1");
                SelectionStrategy::Top1
            }
            other => other,
        };

        let qualifying: Vec<&ScoredAgent<'_>> = ranked
            .iter()
            .filter(|(_, score)| score.overall() >= threshold)
            .collect();

        let picked: Vec<&ScoredAgent<'_>> = match applied {
            SelectionStrategy::Top1 => ranked
                .first()
                .filter(|(_, score)| score.overall() >= threshold)
                .into_iter()
                .collect(),
            SelectionStrategy::TopK | SelectionStrategy::Ensemble => {
                qualifying.into_iter().take(k).collect()
            }
            SelectionStrategy::Cascade => qualifying,
        };

        if picked.is_empty() {
            return self.fallback(ranked, applied, threshold);
        }

        let agents: Vec<SelectionResult> = picked
            .iter()
            .enumerate()
            .map(|(i, (agent, score))| selection_result(agent, *score, i + 1))
            .collect();

        let mut reasoning = String::new();
        if applied != strategy {
            reasoning.push_str(&format!(
                "Ensemble mode is disabled, so {strategy} ran as top_1. "
            ));
        }
        reasoning.push_str(&describe(applied, &agents, ranked.len(), threshold, k));

        debug!(
            strategy = %applied,
            selected = agents.len(),
            candidates = ranked.len(),
            threshold,
            "experts selected"
        );

        SelectionOutcome {
            agents,
            reasoning,
            strategy: applied,
            fallback_used: false,
        }
    }

    fn fallback(
        &self,
        ranked: &[ScoredAgent<'_>],
        strategy: SelectionStrategy,
        threshold: f64,
    ) -> SelectionOutcome {
        let why = if ranked.is_empty() {
            "No candidates were provided".to_string()
        } else {
            format!("No candidate reached the confidence threshold of {threshold:.1}")
        };

        let Some(id) = &self.fallback_agent_id else {
            warn!(
                strategy = %strategy,
                threshold, "no qualifying expert and no fallback agent configured"
            );
            return SelectionOutcome {
                agents: Vec::new(),
                reasoning: format!("{why} and no fallback agent is configured."),
                strategy,
                fallback_used: true,
            };
        };

        let name = ranked
            .iter()
            .find(|(agent, _)| &agent.id == id)
            .map_or_else(|| id.clone(), |(agent, _)| agent.name.clone());
        info!(fallback_agent = id.as_str(), strategy = %strategy, "using fallback expert");

        let score = ExpertScore::neutral();
        SelectionOutcome {
            agents: vec![SelectionResult {
                expert_id: id.clone(),
                expert_name: name.clone(),
                score,
                reasoning: format!(
                    "Fallback agent with neutral score {:.1}/10.",
                    score.overall()
                ),
                rank: 1,
            }],
            reasoning: format!("{why}; using fallback agent {name}."),
            strategy,
            fallback_used: true,
        }
    }
}

fn clamp_threshold(threshold: f64) -> f64 {
    let clamped = clamp_dimension(threshold, MAX_DIMENSION);
    if clamped != threshold {
        warn!(
            requested = threshold,
            clamped, "confidence threshold out of range, clamped to [0, 10]"
        );
    }
    clamped
}

fn describe(
    strategy: SelectionStrategy,
    agents: &[SelectionResult],
    candidates: usize,
    threshold: f64,
    k: usize,
) -> String {
    match strategy {
        SelectionStrategy::Top1 => format!(
            "Selected {} as the best of {candidates} candidates (score {:.1}/10).",
            agents[0].expert_name,
            agents[0].score.overall()
        ),
        SelectionStrategy::TopK => format!(
            "Selected the top {} of {candidates} candidates at or above {threshold:.1} (k = {k}).",
            agents.len()
        ),
        SelectionStrategy::Ensemble => format!(
            "Selected {} experts at or above {threshold:.1} to answer together; \
             combine their responses downstream (k = {k}).",
            agents.len()
        ),
        SelectionStrategy::Cascade => format!(
            "Cascade of {} candidates at or above {threshold:.1}; try each in rank order \
             until one succeeds.",
            agents.len()
        ),
    }
}
