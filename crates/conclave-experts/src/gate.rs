// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate agent scoring.
//!
//! Each agent gets four signals: skill match against the required skills,
//! past performance, personality fit for the task type, and load balance.
//! Past performance and load balance come from [`ScoringDefaults`] until real
//! telemetry is wired in.

use std::collections::BTreeSet;

use conclave_config::model::{ExpertConfig, FeatureFlags};
use conclave_core::{AgentProfile, ExpertScore, SelectionResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Skill score when the task names no required skills.
pub const NO_SKILLS_REQUIRED_SCORE: f64 = 7.0;
/// Personality score before any trait bonus.
pub const PERSONALITY_BASE: f64 = 6.0;
/// Bonus when the agent's matching trait is strong enough.
pub const PERSONALITY_BONUS: f64 = 3.0;
/// Minimum trait strength that earns the bonus.
pub const TRAIT_THRESHOLD: f64 = 0.7;

/// An agent paired with its score.
pub type ScoredAgent<'a> = (&'a AgentProfile, ExpertScore);

/// Fixed values for the signals that have no telemetry source yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringDefaults {
    pub past_performance: f64,
    pub load_balance: f64,
}

impl Default for ScoringDefaults {
    fn default() -> Self {
        Self {
            past_performance: 5.0,
            load_balance: 10.0,
        }
    }
}

impl From<&ExpertConfig> for ScoringDefaults {
    fn from(config: &ExpertConfig) -> Self {
        Self {
            past_performance: config.past_performance,
            load_balance: config.load_balance,
        }
    }
}

/// Scores and ranks candidate agents for a task.
#[derive(Debug, Clone)]
pub struct ExpertGate {
    enabled: bool,
    defaults: ScoringDefaults,
}

impl Default for ExpertGate {
    fn default() -> Self {
        Self::new(true, ScoringDefaults::default())
    }
}

impl ExpertGate {
    pub fn new(enabled: bool, defaults: ScoringDefaults) -> Self {
        Self { enabled, defaults }
    }

    pub fn from_config(features: &FeatureFlags, experts: &ExpertConfig) -> Self {
        Self::new(features.enable_expert_gate, ScoringDefaults::from(experts))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Score every agent and sort by overall score, best first.
    ///
    /// Agents with equal scores keep their roster order. Returns an empty list
    /// when the gate is disabled.
    pub fn score_agents<'a>(
        &self,
        agents: &'a [AgentProfile],
        task_description: &str,
        required_skills: &[String],
        task_metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Vec<ScoredAgent<'a>> {
        if !self.enabled {
            warn!("expert gate disabled, no candidates scored");
            return Vec::new();
        }

        let mut scored: Vec<ScoredAgent<'a>> = agents
            .iter()
            .map(|agent| (agent, self.score_agent(agent, required_skills, task_metadata)))
            .collect();
        scored.sort_by(|a, b| b.1.overall().total_cmp(&a.1.overall()));

        debug!(
            candidates = scored.len(),
            task_chars = task_description.chars().count(),
            best = scored.first().map(|(a, _)| a.id.as_str()),
            "agents scored"
        );
        scored
    }

    /// Score a single agent.
    pub fn score_agent(
        &self,
        agent: &AgentProfile,
        required_skills: &[String],
        task_metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> ExpertScore {
        ExpertScore::new(
            skill_match(agent, required_skills),
            self.defaults.past_performance,
            personality_fit(agent, task_type(task_metadata)),
            self.defaults.load_balance,
        )
    }

    /// The single best agent, if any.
    pub fn select_best_agent(
        &self,
        agents: &[AgentProfile],
        task_description: &str,
        required_skills: &[String],
        task_metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Option<SelectionResult> {
        self.select_top_k(agents, task_description, required_skills, task_metadata, 1)
            .into_iter()
            .next()
    }

    /// The `k` best agents with generated reasoning, ranked from 1.
    pub fn select_top_k(
        &self,
        agents: &[AgentProfile],
        task_description: &str,
        required_skills: &[String],
        task_metadata: Option<&serde_json::Map<String, serde_json::Value>>,
        k: usize,
    ) -> Vec<SelectionResult> {
        self.score_agents(agents, task_description, required_skills, task_metadata)
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, (agent, score))| selection_result(agent, score, i + 1))
            .collect()
    }
}

/// Build a [`SelectionResult`] with generated reasoning.
pub fn selection_result(agent: &AgentProfile, score: ExpertScore, rank: usize) -> SelectionResult {
    SelectionResult {
        expert_id: agent.id.clone(),
        expert_name: agent.name.clone(),
        score,
        reasoning: reasoning_for(&score),
        rank,
    }
}

/// Fraction of required skills the agent can use, scaled to 0-10.
pub fn skill_match(agent: &AgentProfile, required_skills: &[String]) -> f64 {
    let required: BTreeSet<&str> = required_skills.iter().map(String::as_str).collect();
    if required.is_empty() {
        return NO_SKILLS_REQUIRED_SCORE;
    }
    let available = agent.available_skills();
    let matched = required.intersection(&available).count();
    matched as f64 / required.len() as f64 * 10.0
}

/// Personality trait consulted for a task type.
pub fn personality_trait_for(task_type: &str) -> Option<&'static str> {
    match task_type {
        "creative" => Some("creativity"),
        "analytical" => Some("analytical"),
        "collaborative" => Some("collaborative"),
        _ => None,
    }
}

/// Base fit plus a bonus when the task type's trait is strong.
pub fn personality_fit(agent: &AgentProfile, task_type: Option<&str>) -> f64 {
    let strong = task_type
        .and_then(personality_trait_for)
        .and_then(|name| agent.trait_strength(name))
        .is_some_and(|strength| strength >= TRAIT_THRESHOLD);
    let fit = if strong {
        PERSONALITY_BASE + PERSONALITY_BONUS
    } else {
        PERSONALITY_BASE
    };
    fit.min(10.0)
}

fn task_type(metadata: Option<&serde_json::Map<String, serde_json::Value>>) -> Option<&str> {
    metadata?.get("task_type")?.as_str()
}

/// Deterministic prose explaining a score.
pub fn reasoning_for(score: &ExpertScore) -> String {
    let mut text = format!("Overall score: {:.1}/10.", score.overall());
    let mut strong = false;

    if score.skill_match >= 8.0 {
        text.push_str(&format!(
            " Strong skill match ({:.1}/10) for the required skills.",
            score.skill_match
        ));
        strong = true;
    }
    if score.personality_fit >= 8.0 {
        text.push_str(&format!(
            " Personality well suited to this task type ({:.1}/10).",
            score.personality_fit
        ));
        strong = true;
    }
    if score.load_balance >= 9.0 {
        text.push_str(&format!(
            " Has spare capacity ({:.1}/10 load balance).",
            score.load_balance
        ));
        strong = true;
    }
    if !strong {
        text.push_str(" Selected as the best available match.");
    }
    text
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn metadata(task_type: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("task_type".into(), serde_json::json!(task_type));
        map
    }

    fn roster() -> Vec<AgentProfile> {
        vec![
            AgentProfile::new("writer", "Wren")
                .with_shared_skills(["drafting"])
                .with_custom_skills(["poetry"])
                .with_trait("creativity", 0.9),
            AgentProfile::new("analyst", "Ada")
                .with_shared_skills(["sql", "statistics", "drafting"])
                .with_trait("analytical", 0.8),
            AgentProfile::new("ops", "Otto")
                .with_shared_skills(["sql", "kubernetes"])
                .with_disabled_skills(["sql"]),
        ]
    }

    #[test]
    fn no_required_skills_scores_seven() {
        let agent = AgentProfile::new("a", "A");
        assert_eq!(skill_match(&agent, &[]), 7.0);
    }

    #[test]
    fn skill_match_is_fraction_of_required() {
        let agents = roster();
        let required = skills(&["sql", "statistics"]);
        assert_eq!(skill_match(&agents[1], &required), 10.0);
        // sql is disabled for ops
        assert_eq!(skill_match(&agents[2], &required), 0.0);
        assert_eq!(skill_match(&agents[0], &skills(&["poetry", "sql"])), 5.0);
    }

    #[test]
    fn duplicate_required_skills_count_once() {
        let agent = AgentProfile::new("a", "A").with_shared_skills(["sql"]);
        assert_eq!(skill_match(&agent, &skills(&["sql", "sql", "rust"])), 5.0);
    }

    #[test]
    fn personality_bonus_needs_matching_strong_trait() {
        let agents = roster();
        assert_eq!(personality_fit(&agents[0], Some("creative")), 9.0);
        assert_eq!(personality_fit(&agents[0], Some("analytical")), 6.0);
        assert_eq!(personality_fit(&agents[1], Some("analytical")), 9.0);
        assert_eq!(personality_fit(&agents[1], Some("poetry")), 6.0);
        assert_eq!(personality_fit(&agents[1], None), 6.0);

        let weak = AgentProfile::new("w", "W").with_trait("collaborative", 0.69);
        assert_eq!(personality_fit(&weak, Some("collaborative")), 6.0);
        let exact = AgentProfile::new("e", "E").with_trait("collaborative", 0.7);
        assert_eq!(personality_fit(&exact, Some("collaborative")), 9.0);
    }

    #[test]
    fn agents_sorted_by_overall_descending() {
        let agents = roster();
        let gate = ExpertGate::default();
        let meta = metadata("analytical");
        let ranked =
            gate.score_agents(&agents, "quarterly numbers", &skills(&["sql"]), Some(&meta));

        let ids: Vec<&str> = ranked.iter().map(|(a, _)| a.id.as_str()).collect();
        assert_eq!(ids, vec!["analyst", "writer", "ops"]);
        for pair in ranked.windows(2) {
            assert!(pair[0].1.overall() >= pair[1].1.overall());
        }
    }

    #[test]
    fn ties_keep_roster_order() {
        let agents = vec![AgentProfile::new("first", "F"), AgentProfile::new("second", "S")];
        let ranked = ExpertGate::default().score_agents(&agents, "", &[], None);
        assert_eq!(ranked[0].0.id, "first");
        assert_eq!(ranked[1].0.id, "second");
    }

    #[test]
    fn placeholder_signals_come_from_defaults() {
        let gate = ExpertGate::new(
            true,
            ScoringDefaults {
                past_performance: 8.0,
                load_balance: 3.0,
            },
        );
        let score = gate.score_agent(&AgentProfile::new("a", "A"), &[], None);
        assert_eq!(score.past_performance, 8.0);
        assert_eq!(score.load_balance, 3.0);
    }

    #[test]
    #[traced_test]
    fn disabled_gate_returns_nothing() {
        let agents = roster();
        let gate = ExpertGate::new(false, ScoringDefaults::default());
        assert!(gate.score_agents(&agents, "task", &[], None).is_empty());
        assert!(gate.select_best_agent(&agents, "task", &[], None).is_none());
        assert!(logs_contain("expert gate disabled"));
    }

    #[test]
    fn select_top_k_ranks_from_one() {
        let agents = roster();
        let picked =
            ExpertGate::default().select_top_k(&agents, "t", &skills(&["drafting"]), None, 2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].rank, 1);
        assert_eq!(picked[1].rank, 2);
        assert!(picked[0].reasoning.starts_with("Overall score: "));
    }

    #[test]
    fn reasoning_lists_strong_signals() {
        let text = reasoning_for(&ExpertScore::new(10.0, 6.0, 9.0, 10.0));
        assert!(text.starts_with("Overall score: 8.8/10."));
        assert!(text.contains("Strong skill match"));
        assert!(text.contains("Personality well suited"));
        assert!(text.contains("spare capacity"));
        assert!(!text.contains("best available match"));
    }

    #[test]
    fn reasoning_falls_back_to_generic_sentence() {
        let text = reasoning_for(&ExpertScore::new(5.0, 5.0, 6.0, 5.0));
        assert_eq!(text, "Overall score: 5.2/10. Selected as the best available match.");
    }
}
