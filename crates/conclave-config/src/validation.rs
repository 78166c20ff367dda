// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: tier roster shape,
//! non-negative budgets, score ranges and known method names.

use std::collections::HashSet;
use std::str::FromStr;

use conclave_core::AggregationMethod;

use crate::diagnostic::ConfigError;
use crate::model::ConclaveConfig;

/// Validate a deserialized configuration.
///
/// Collects every violation rather than stopping at the first.
pub fn validate_config(config: &ConclaveConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_tiers(config, &mut errors);
    validate_cost(config, &mut errors);
    validate_experts(config, &mut errors);
    validate_classifier(config, &mut errors);

    if AggregationMethod::from_str(&config.aggregation.default_method).is_err() {
        errors.push(ConfigError::validation(format!(
            "aggregation.default_method `{}` must be one of weighted_average, consensus, synthesis",
            config.aggregation.default_method
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tiers(config: &ConclaveConfig, errors: &mut Vec<ConfigError>) {
    let tiers = &config.routing.tiers;
    if tiers.is_empty() {
        errors.push(ConfigError::validation(
            "routing.tiers must contain at least one tier",
        ));
    }

    let mut seen = HashSet::new();
    for (i, tier) in tiers.iter().enumerate() {
        if tier.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "routing.tiers[{i}].name must not be empty"
            )));
        } else if !seen.insert(tier.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate tier name `{}` in routing.tiers",
                tier.name
            )));
        }
        if tier.model_name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "routing.tiers[{i}].model_name must not be empty"
            )));
        }
        if tier.cost_per_1k_input < 0.0 || tier.cost_per_1k_output < 0.0 {
            errors.push(ConfigError::validation(format!(
                "routing.tiers[{i}] costs must be non-negative"
            )));
        }
    }
}

fn validate_cost(config: &ConclaveConfig, errors: &mut Vec<ConfigError>) {
    let cost = &config.cost;
    if cost.daily_user_budget_usd < 0.0 {
        errors.push(ConfigError::validation(format!(
            "cost.daily_user_budget_usd must be non-negative, got {}",
            cost.daily_user_budget_usd
        )));
    }
    if cost.monthly_team_budget_usd < 0.0 {
        errors.push(ConfigError::validation(format!(
            "cost.monthly_team_budget_usd must be non-negative, got {}",
            cost.monthly_team_budget_usd
        )));
    }
    if !(cost.warn_threshold > 0.0 && cost.warn_threshold <= 1.0) {
        errors.push(ConfigError::validation(format!(
            "cost.warn_threshold must be in (0, 1], got {}",
            cost.warn_threshold
        )));
    }
}

fn validate_experts(config: &ConclaveConfig, errors: &mut Vec<ConfigError>) {
    let experts = &config.experts;
    for (key, value) in [
        ("confidence_threshold", experts.confidence_threshold),
        ("past_performance", experts.past_performance),
        ("load_balance", experts.load_balance),
    ] {
        if !(0.0..=10.0).contains(&value) {
            errors.push(ConfigError::validation(format!(
                "experts.{key} must be in [0, 10], got {value}"
            )));
        }
    }
    if experts.default_k == 0 {
        errors.push(ConfigError::validation(
            "experts.default_k must be at least 1",
        ));
    }
    if let Some(id) = &experts.fallback_agent_id {
        if id.trim().is_empty() {
            errors.push(ConfigError::validation(
                "experts.fallback_agent_id must not be empty when set",
            ));
        }
    }
}

fn validate_classifier(config: &ConclaveConfig, errors: &mut Vec<ConfigError>) {
    let classifier = &config.classifier;
    if !(0.0..=2.0).contains(&classifier.temperature) {
        errors.push(ConfigError::validation(format!(
            "classifier.temperature must be in [0, 2], got {}",
            classifier.temperature
        )));
    }
    if classifier.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "classifier.timeout_secs must be greater than zero",
        ));
    }
    if classifier.enabled && classifier.base_url.trim().is_empty() {
        errors.push(ConfigError::validation(
            "classifier.base_url must not be empty when the classifier is enabled",
        ));
    }
}

#[cfg(test)]
mod tests {
    use conclave_core::ModelTier;

    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ConclaveConfig::default()).is_ok());
    }

    #[test]
    fn empty_roster_fails_validation() {
        let mut config = ConclaveConfig::default();
        config.routing.tiers.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "at least one tier"));
    }

    #[test]
    fn duplicate_tier_names_fail_validation() {
        let mut config = ConclaveConfig::default();
        config
            .routing
            .tiers
            .push(ModelTier::new("fast", "openai/gpt-4.1-nano", 0.0001, 0.0004));
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "duplicate tier name `fast`"));
    }

    #[test]
    fn negative_budget_fails_validation() {
        let mut config = ConclaveConfig::default();
        config.cost.daily_user_budget_usd = -5.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "daily_user_budget_usd"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ConclaveConfig::default();
        config.cost.monthly_team_budget_usd = -1.0;
        config.experts.confidence_threshold = 11.0;
        config.experts.default_k = 0;
        config.aggregation.default_method = "majority".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "got: {errors:?}");
    }

    #[test]
    fn enabled_classifier_needs_base_url() {
        let mut config = ConclaveConfig::default();
        config.classifier.enabled = true;
        config.classifier.base_url = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "classifier.base_url"));
    }
}
