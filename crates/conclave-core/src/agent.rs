// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent roster entries, expert scores and selection records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{MAX_DIMENSION, clamp_dimension};

/// Weights applied to the four expert signals, in field order.
pub const EXPERT_WEIGHTS: [(&str, f64); 4] = [
    ("skill_match", 0.40),
    ("past_performance", 0.25),
    ("personality_fit", 0.20),
    ("load_balance", 0.15),
];

/// A candidate agent as supplied by the caller.
///
/// The roster is fetched by the caller; this core never queries for agents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shared_skills: BTreeSet<String>,
    #[serde(default)]
    pub custom_skills: BTreeSet<String>,
    #[serde(default)]
    pub disabled_skills: BTreeSet<String>,
    /// Trait name to strength in `[0, 1]` (e.g. "creativity" -> 0.8).
    #[serde(default)]
    pub personality_traits: BTreeMap<String, f64>,
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_shared_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn with_custom_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn with_disabled_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn with_trait(mut self, name: impl Into<String>, strength: f64) -> Self {
        self.personality_traits.insert(name.into(), strength);
        self
    }

    /// Skills the agent can use: `(shared ∪ custom) − disabled`.
    pub fn available_skills(&self) -> BTreeSet<&str> {
        self.shared_skills
            .iter()
            .chain(self.custom_skills.iter())
            .filter(|s| !self.disabled_skills.contains(*s))
            .map(String::as_str)
            .collect()
    }

    /// Strength of a personality trait, if the agent declares it.
    pub fn trait_strength(&self, name: &str) -> Option<f64> {
        self.personality_traits.get(name).copied()
    }
}

/// Four weighted signals describing how well an agent fits a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpertScore {
    pub skill_match: f64,
    pub past_performance: f64,
    pub personality_fit: f64,
    pub load_balance: f64,
}

impl ExpertScore {
    /// Build a score, clamping every signal into `[0, 10]`.
    pub fn new(
        skill_match: f64,
        past_performance: f64,
        personality_fit: f64,
        load_balance: f64,
    ) -> Self {
        Self {
            skill_match: clamp_dimension(skill_match, MAX_DIMENSION),
            past_performance: clamp_dimension(past_performance, MAX_DIMENSION),
            personality_fit: clamp_dimension(personality_fit, MAX_DIMENSION),
            load_balance: clamp_dimension(load_balance, MAX_DIMENSION),
        }
    }

    /// Score assigned to a fallback agent that was never ranked.
    pub fn neutral() -> Self {
        Self::new(5.0, 5.0, 5.0, 10.0)
    }

    /// Signal values in [`EXPERT_WEIGHTS`] order.
    pub fn signals(&self) -> [f64; 4] {
        [
            self.skill_match,
            self.past_performance,
            self.personality_fit,
            self.load_balance,
        ]
    }

    /// Weighted combination of the signals, in `[0, 10]`.
    pub fn overall(&self) -> f64 {
        let total: f64 = self
            .signals()
            .iter()
            .zip(EXPERT_WEIGHTS.iter())
            .map(|(value, (_, weight))| value * weight)
            .sum();
        clamp_dimension(total, MAX_DIMENSION)
    }
}

/// One selected expert with the prose justification for picking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub expert_id: String,
    pub expert_name: String,
    pub score: ExpertScore,
    pub reasoning: String,
    /// 1-based position in the selection.
    pub rank: usize,
}

/// How candidates are picked from a ranked list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SelectionStrategy {
    #[strum(serialize = "top_1")]
    #[serde(rename = "top_1")]
    Top1,
    #[strum(serialize = "top_k")]
    #[serde(rename = "top_k")]
    TopK,
    #[strum(serialize = "ensemble")]
    #[serde(rename = "ensemble")]
    Ensemble,
    #[strum(serialize = "cascade")]
    #[serde(rename = "cascade")]
    Cascade,
}

/// What a selector decided, including whether it had to fall back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub agents: Vec<SelectionResult>,
    pub reasoning: String,
    /// Strategy actually applied (a degraded TOP_K reports TOP_1).
    pub strategy: SelectionStrategy,
    pub fallback_used: bool,
}

impl SelectionOutcome {
    /// Identifiers of the selected agents, in rank order.
    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.expert_id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
