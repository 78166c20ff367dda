// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./conclave.toml` > `~/.config/conclave/conclave.toml` > `/etc/conclave/conclave.toml`
//! with environment variable overrides via `CONCLAVE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConclaveConfig;

/// Top-level sections an env var name may start with.
const SECTIONS: &[&str] = &[
    "features",
    "classifier",
    "routing",
    "cost",
    "experts",
    "aggregation",
    "logging",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/conclave/conclave.toml` (system-wide)
/// 3. `~/.config/conclave/conclave.toml` (user XDG config)
/// 4. `./conclave.toml` (local directory)
/// 5. `CONCLAVE_*` environment variables
pub fn load_config() -> Result<ConclaveConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ConclaveConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConclaveConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConclaveConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConclaveConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ConclaveConfig::default()))
        .merge(Toml::file("/etc/conclave/conclave.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("conclave/conclave.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("conclave.toml"))
        .merge(env_provider())
}

/// Map a prefix-stripped env var name to a dotted, lowercase config key.
///
/// Figment passes the name in its original case. Only the section boundary
/// becomes a dot, so `COST_DAILY_USER_BUDGET_USD` maps to
/// `cost.daily_user_budget_usd`.
pub fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

/// Environment provider using explicit `map()` rather than `split("_")`,
/// since most key names contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("CONCLAVE_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section() {
        assert_eq!(
            env_key_to_path("cost_daily_user_budget_usd"),
            "cost.daily_user_budget_usd"
        );
        assert_eq!(
            env_key_to_path("features_enable_ensemble_mode"),
            "features.enable_ensemble_mode"
        );
        assert_eq!(env_key_to_path("classifier_api_key"), "classifier.api_key");
        assert_eq!(env_key_to_path("unknown"), "unknown");
    }

    #[test]
    fn env_keys_are_matched_case_insensitively() {
        assert_eq!(env_key_to_path("LOGGING_LEVEL"), "logging.level");
        assert_eq!(
            env_key_to_path("COST_MONTHLY_TEAM_BUDGET_USD"),
            "cost.monthly_team_budget_usd"
        );
        assert_eq!(env_key_to_path("Experts_Default_K"), "experts.default_k");
    }

    #[test]
    fn single_env_var_loads_with_empty_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("conclave.toml", "")?;
            jail.set_env("CONCLAVE_LOGGING_LEVEL", "debug");

            let config = load_config_from_path(Path::new("conclave.toml"))?;
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.cost.daily_user_budget_usd, 5.0);
            Ok(())
        });
    }

    #[test]
    fn env_vars_override_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "conclave.toml",
                r#"
[cost]
daily_user_budget_usd = 7.5
"#,
            )?;
            jail.set_env("CONCLAVE_COST_MONTHLY_TEAM_BUDGET_USD", "250.0");
            jail.set_env("CONCLAVE_FEATURES_ENABLE_ENSEMBLE_MODE", "true");

            let config = load_config_from_path(Path::new("conclave.toml"))?;
            assert_eq!(config.cost.daily_user_budget_usd, 7.5);
            assert_eq!(config.cost.monthly_team_budget_usd, 250.0);
            assert!(config.features.enable_ensemble_mode);
            Ok(())
        });
    }
}
