// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget guard with per-user daily and per-team monthly caps.
//!
//! Counters live in memory behind a single mutex. Every check, record and
//! usage query runs its prune-read-compare-write sequence inside one critical
//! section, so concurrent calls never interleave and records never get lost.
//!
//! Counters are keyed by the UTC day (`%Y-%m-%d`) or month (`%Y-%m`). Keys for
//! past periods are dropped lazily on each access; there is no background task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use conclave_config::model::CostConfig;
use conclave_core::BudgetCheck;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Source of the current time. Injectable for rollover tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Default fraction of a cap at which a warning is logged.
pub const DEFAULT_WARN_THRESHOLD: f64 = 0.8;

#[derive(Debug, Default)]
struct Counters {
    /// (user_id, day) -> spend.
    daily: HashMap<(String, String), f64>,
    /// (team_id, month) -> spend.
    monthly: HashMap<(String, String), f64>,
}

impl Counters {
    fn prune(&mut self, day: &str, month: &str) {
        self.daily.retain(|(_, d), _| d == day);
        self.monthly.retain(|(_, m), _| m == month);
    }

    fn daily_spent(&self, user_id: &str, day: &str) -> f64 {
        self.daily
            .get(&(user_id.to_string(), day.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    fn monthly_spent(&self, team_id: &str, month: &str) -> f64 {
        self.monthly
            .get(&(team_id.to_string(), month.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Current spend against both caps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub daily_spent: f64,
    pub monthly_spent: f64,
    pub daily_budget: f64,
    pub monthly_budget: f64,
}

impl UsageSnapshot {
    /// Budget left on the tighter of the two caps, never negative.
    pub fn remaining(&self) -> f64 {
        (self.daily_budget - self.daily_spent)
            .min(self.monthly_budget - self.monthly_spent)
            .max(0.0)
    }
}

/// Enforces spend caps before expensive calls are made.
///
/// Construct once and share (e.g. behind an `Arc`); it never panics and
/// never returns an error.
pub struct CostGuard {
    daily_budget: f64,
    monthly_budget: f64,
    warn_threshold: f64,
    counters: Mutex<Counters>,
    clock: Clock,
}

impl std::fmt::Debug for CostGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostGuard")
            .field("daily_budget", &self.daily_budget)
            .field("monthly_budget", &self.monthly_budget)
            .field("warn_threshold", &self.warn_threshold)
            .finish_non_exhaustive()
    }
}

impl CostGuard {
    /// Create a guard with the given caps, in USD.
    pub fn new(daily_budget: f64, monthly_budget: f64) -> Self {
        Self {
            daily_budget: sanitize(daily_budget),
            monthly_budget: sanitize(monthly_budget),
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            counters: Mutex::new(Counters::default()),
            clock: Arc::new(Utc::now),
        }
    }

    /// Create a guard from the `[cost]` config section.
    pub fn from_config(config: &CostConfig) -> Self {
        Self::new(config.daily_user_budget_usd, config.monthly_team_budget_usd)
            .with_warn_threshold(config.warn_threshold)
    }

    /// Fraction of a cap at which checks log a warning.
    pub fn with_warn_threshold(mut self, threshold: f64) -> Self {
        self.warn_threshold = threshold;
        self
    }

    /// Replace the wall clock.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        let clock: Clock = Arc::new(clock);
        self.clock = clock;
        self
    }

    pub fn daily_budget(&self) -> f64 {
        self.daily_budget
    }

    pub fn monthly_budget(&self) -> f64 {
        self.monthly_budget
    }

    /// Decide whether `estimated_cost` fits within both caps.
    ///
    /// The daily cap is checked first. Spending exactly up to a cap is allowed.
    /// A denial always suggests the fast tier.
    pub fn check_budget(&self, user_id: &str, team_id: &str, estimated_cost: f64) -> BudgetCheck {
        let estimated_cost = sanitize(estimated_cost);
        let (day, month) = self.period_keys();
        let mut counters = self.lock();
        counters.prune(&day, &month);

        let daily_spent = counters.daily_spent(user_id, &day);
        if daily_spent + estimated_cost > self.daily_budget {
            info!(
                user_id,
                daily_spent,
                estimated_cost,
                daily_budget = self.daily_budget,
                "daily budget exceeded, request denied"
            );
            return BudgetCheck::deny(self.daily_budget - daily_spent);
        }

        let monthly_spent = counters.monthly_spent(team_id, &month);
        if monthly_spent + estimated_cost > self.monthly_budget {
            info!(
                team_id,
                monthly_spent,
                estimated_cost,
                monthly_budget = self.monthly_budget,
                "monthly budget exceeded, request denied"
            );
            return BudgetCheck::deny(self.monthly_budget - monthly_spent);
        }

        if daily_spent + estimated_cost >= self.daily_budget * self.warn_threshold {
            warn!(
                user_id,
                daily_spent,
                estimated_cost,
                daily_budget = self.daily_budget,
                "approaching daily budget cap"
            );
        }
        if monthly_spent + estimated_cost >= self.monthly_budget * self.warn_threshold {
            warn!(
                team_id,
                monthly_spent,
                estimated_cost,
                monthly_budget = self.monthly_budget,
                "approaching monthly budget cap"
            );
        }

        let remaining = (self.daily_budget - daily_spent - estimated_cost)
            .min(self.monthly_budget - monthly_spent - estimated_cost);
        BudgetCheck::allow(remaining)
    }

    /// Add `cost` to the user's daily and the team's monthly counters.
    pub fn record_cost(&self, user_id: &str, team_id: &str, cost: f64) {
        if !cost.is_finite() || cost < 0.0 {
            warn!(user_id, team_id, cost, "ignoring invalid cost record");
            return;
        }
        let (day, month) = self.period_keys();
        let mut counters = self.lock();
        counters.prune(&day, &month);

        *counters
            .daily
            .entry((user_id.to_string(), day))
            .or_insert(0.0) += cost;
        *counters
            .monthly
            .entry((team_id.to_string(), month))
            .or_insert(0.0) += cost;
        debug!(user_id, team_id, cost, "cost recorded");
    }

    /// Current spend for `user_id` today and `team_id` this month.
    pub fn usage(&self, user_id: &str, team_id: &str) -> UsageSnapshot {
        let (day, month) = self.period_keys();
        let mut counters = self.lock();
        counters.prune(&day, &month);
        UsageSnapshot {
            daily_spent: counters.daily_spent(user_id, &day),
            monthly_spent: counters.monthly_spent(team_id, &month),
            daily_budget: self.daily_budget,
            monthly_budget: self.monthly_budget,
        }
    }

    fn period_keys(&self) -> (String, String) {
        let now = (self.clock)();
        (
            now.format("%Y-%m-%d").to_string(),
            now.format("%Y-%m").to_string(),
        )
    }

    /// Counters stay consistent even if a holder panicked, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Non-finite or negative amounts count as zero.
fn sanitize(amount: f64) -> f64 {
    if amount.is_finite() { amount.max(0.0) } else { 0.0 }
}
