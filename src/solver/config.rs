//! Scheduling policy and solve configuration.
//!
//! [`SchedulingPolicy`] carries the business knobs the constraint builder
//! reads (rest window, fairness slack, per-type quotas, objective
//! weights). [`SolveConfig`] carries the runtime knobs the orchestrator
//! reads (deadline, worker count).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum contiguous rest per volunteer per day, in minutes.
pub const DEFAULT_REST_MINUTES: i64 = 300;

/// Default rest-eligible window: 09:00, as a minute of day.
pub const DEFAULT_REST_WINDOW_START_MIN: i64 = 9 * 60;

/// Default rest-eligible window end: 23:00, as a minute of day.
pub const DEFAULT_REST_WINDOW_END_MIN: i64 = 23 * 60;

/// Grid step for rest-start candidates and preference scoring, in minutes.
pub const SCORING_STEP_MINUTES: i64 = 15;

/// Per-quest-type coverage policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeQuota {
    /// The quest type this quota applies to.
    pub type_id: String,
    /// Every eligible, non-committed volunteer must staff at least one
    /// quest of this type.
    pub at_least_one: bool,
    /// No volunteer may staff more than one quest of this type.
    pub at_most_one: bool,
}

impl TypeQuota {
    /// Creates a quota with both directions disabled.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            at_least_one: false,
            at_most_one: false,
        }
    }

    /// Requires at least one quest of this type per eligible volunteer.
    pub fn at_least_one(mut self) -> Self {
        self.at_least_one = true;
        self
    }

    /// Caps the type at one quest per volunteer.
    pub fn at_most_one(mut self) -> Self {
        self.at_most_one = true;
        self
    }
}

/// Business rules the constraint builder translates into the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingPolicy {
    /// Minimum contiguous free interval per volunteer per day, minutes.
    pub rest_minutes: i64,
    /// Start of the rest-eligible period, minute of day.
    pub rest_window_start_min: i64,
    /// End of the rest-eligible period, minute of day.
    pub rest_window_end_min: i64,
    /// Maximum allowed daily deviation from the adjusted theoretical
    /// minutes, in minutes (both directions).
    pub max_daily_deviation_min: f64,
    /// Weight of the global fairness span in the objective.
    pub fairness_weight: f64,
    /// Weight of the summed preference scores in the objective.
    pub preference_weight: f64,
    /// Per-type coverage quotas.
    pub type_quotas: Vec<TypeQuota>,
    /// Quest type whose show-scoped quests are capped at one per
    /// volunteer per show per day ("tracking" type).
    pub tracking_type_id: Option<String>,
    /// Quest type reserved for serenity-eligible volunteers.
    pub serenity_type_id: Option<String>,
    /// Forbid assignments whose preference score is negative.
    pub forbid_negative_preference: bool,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            rest_minutes: DEFAULT_REST_MINUTES,
            rest_window_start_min: DEFAULT_REST_WINDOW_START_MIN,
            rest_window_end_min: DEFAULT_REST_WINDOW_END_MIN,
            max_daily_deviation_min: 180.0,
            // Fairness dominates preference by an order of magnitude, so
            // the solver narrows workload imbalance first and optimizes
            // satisfaction within that envelope.
            fairness_weight: 10.0,
            preference_weight: 1.0,
            type_quotas: Vec::new(),
            tracking_type_id: None,
            serenity_type_id: None,
            forbid_negative_preference: false,
        }
    }
}

impl SchedulingPolicy {
    /// Quota declared for a type, if any.
    pub fn quota_for(&self, type_id: &str) -> Option<&TypeQuota> {
        self.type_quotas.iter().find(|q| q.type_id == type_id)
    }
}

/// Runtime knobs for the solve orchestration.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// External time budget for the whole orchestration, including
    /// explanation probes. `None` = unbounded. Enforced between backend
    /// calls; a single backend call is not interruptible.
    pub time_budget: Option<Duration>,
    /// Parallel worker count, forwarded to backends that accept it;
    /// advisory for single-threaded backends.
    pub num_workers: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_budget: None,
            num_workers: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let p = SchedulingPolicy::default();
        assert_eq!(p.rest_minutes, DEFAULT_REST_MINUTES);
        assert!(p.fairness_weight > p.preference_weight);
        assert!(p.quota_for("qt1").is_none());
    }

    #[test]
    fn test_type_quota_builder() {
        let q = TypeQuota::new("qt1").at_least_one().at_most_one();
        assert!(q.at_least_one && q.at_most_one);
        let policy = SchedulingPolicy {
            type_quotas: vec![q],
            ..SchedulingPolicy::default()
        };
        assert!(policy.quota_for("qt1").is_some());
    }
}
