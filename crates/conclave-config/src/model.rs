// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Conclave routing engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use conclave_core::ModelTier;
use serde::{Deserialize, Serialize};

/// Top-level Conclave configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConclaveConfig {
    /// Feature flags gating the expert gate, ensemble selection and aggregation.
    #[serde(default)]
    pub features: FeatureFlags,

    /// LLM complexity classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Model tier roster used for routing.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Spend caps enforced by the budget guard.
    #[serde(default)]
    pub cost: CostConfig,

    /// Expert scoring and selection settings.
    #[serde(default)]
    pub experts: ExpertConfig,

    /// Response aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Boolean feature flags consumed by the components at construction time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureFlags {
    /// Score candidate agents. When false the gate returns no candidates.
    #[serde(default = "default_true")]
    pub enable_expert_gate: bool,

    /// Allow multi-agent TOP_K / ENSEMBLE selection. When false they degrade to TOP_1.
    #[serde(default)]
    pub enable_ensemble_mode: bool,

    /// Allow merging several expert responses into one.
    #[serde(default = "default_true")]
    pub enable_response_aggregation: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_expert_gate: true,
            enable_ensemble_mode: false,
            enable_response_aggregation: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// LLM complexity classifier configuration.
///
/// When disabled, or when the endpoint fails, complexity is scored with
/// keyword heuristics instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Call the chat-completion endpoint for scoring.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the endpoint. `None` sends no Authorization header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for classification.
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Sampling temperature sent with each request.
    #[serde(default)]
    pub temperature: f64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key: None,
            model: default_classifier_model(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_classifier_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Model tier roster configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Ordered tier roster, cheapest first.
    #[serde(default = "ModelTier::default_roster")]
    pub tiers: Vec<ModelTier>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tiers: ModelTier::default_roster(),
        }
    }
}

/// Spend cap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    /// Per-user spending cap for one UTC day, in USD.
    #[serde(default = "default_daily_user_budget")]
    pub daily_user_budget_usd: f64,

    /// Per-team spending cap for one UTC month, in USD.
    #[serde(default = "default_monthly_team_budget")]
    pub monthly_team_budget_usd: f64,

    /// Fraction of a cap at which a warning is logged (0.0-1.0).
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            daily_user_budget_usd: default_daily_user_budget(),
            monthly_team_budget_usd: default_monthly_team_budget(),
            warn_threshold: default_warn_threshold(),
        }
    }
}

fn default_daily_user_budget() -> f64 {
    5.0
}

fn default_monthly_team_budget() -> f64 {
    100.0
}

fn default_warn_threshold() -> f64 {
    0.8
}

/// Expert scoring and selection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpertConfig {
    /// Agent returned when no candidate clears the threshold.
    #[serde(default)]
    pub fallback_agent_id: Option<String>,

    /// Number of agents taken by TOP_K and ENSEMBLE.
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Minimum overall score (0-10) a candidate needs to be selected.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Past-performance signal assigned to every agent until telemetry exists.
    #[serde(default = "default_past_performance")]
    pub past_performance: f64,

    /// Load-balance signal assigned to every agent until telemetry exists.
    #[serde(default = "default_load_balance")]
    pub load_balance: f64,
}

impl Default for ExpertConfig {
    fn default() -> Self {
        Self {
            fallback_agent_id: None,
            default_k: default_k(),
            confidence_threshold: default_confidence_threshold(),
            past_performance: default_past_performance(),
            load_balance: default_load_balance(),
        }
    }
}

fn default_k() -> usize {
    3
}

fn default_confidence_threshold() -> f64 {
    5.0
}

fn default_past_performance() -> f64 {
    5.0
}

fn default_load_balance() -> f64 {
    10.0
}

/// Response aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    /// Method used when the caller does not name one.
    #[serde(default = "default_method")]
    pub default_method: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_method: default_method(),
        }
    }
}

fn default_method() -> String {
    "synthesis".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
