//! Constraint-model builder.
//!
//! Walks the resolved [`Event`] and emits one binary decision variable
//! per (volunteer, quest) pair plus the hard constraints of the business
//! rules, each filed under an [`AssumptionTag`] so that the
//! orchestrator can disable rule instances when hunting for a minimal
//! infeasibility explanation.
//!
//! The builder is a pure, single-threaded function of the event and
//! policy: it never fails on unsatisfiable inputs (satisfiability is the
//! solver's verdict), only on modeling errors such as overlapping quests
//! inside one linked group or an event that was never strengthened.

use std::collections::{BTreeMap, BTreeSet};

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use itertools::Itertools;
use thiserror::Error;

use crate::models::{Event, Quest};

use super::assumption::AssumptionTag;
use super::config::{SchedulingPolicy, SCORING_STEP_MINUTES};
use super::objective::{adjusted_theoretical_minutes, preference_score};

/// Wide bound for the deviation variables when the daily slack rule is
/// disabled during explanation probes.
const DEVIATION_BOUND_MIN: f64 = 100_000.0;

/// Fatal modeling errors: configuration problems the input data must fix.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The builder observed unresolved references; `strengthen` must run
    /// first.
    #[error("event references are not resolved; run resolve::strengthen before building")]
    UnresolvedEvent,
    /// Two quests inside the same linked group overlap, which makes the
    /// group-continuity rule contradict temporal exclusivity.
    #[error("linked quests '{quest_a}' and '{quest_b}' overlap inside one group")]
    OverlappingLinkedQuests { quest_a: String, quest_b: String },
}

/// Whether a build carries the real objective or a constant one.
///
/// Explanation probes only ask "is there any roster at all", so they
/// skip the objective terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveMode {
    /// Minimize the fairness/preference objective.
    Optimize,
    /// Constant objective; feasibility check only.
    FeasibilityOnly,
}

/// A fully materialized constraint problem, ready for one solve call.
///
/// Variables and constraints are rebuilt per call, since the backend consumes
/// them, so the builder can re-emit the model with any tag set disabled.
pub struct CompiledModel {
    /// Variable definitions (consumed by the solve).
    pub variables: ProblemVariables,
    /// Decision variable per (volunteer position, quest position).
    pub assignment: BTreeMap<(usize, usize), Variable>,
    /// All emitted constraints.
    pub constraints: Vec<Constraint>,
    /// Objective expression to minimize.
    pub objective: Expression,
    /// Tags of every rule instance present in this build.
    pub tags: BTreeSet<AssumptionTag>,
}

/// Accumulates constraints, honoring the disabled-tag set.
struct Emitter<'a> {
    disabled: &'a BTreeSet<AssumptionTag>,
    tags: BTreeSet<AssumptionTag>,
    constraints: Vec<Constraint>,
}

impl<'a> Emitter<'a> {
    fn new(disabled: &'a BTreeSet<AssumptionTag>) -> Self {
        Self {
            disabled,
            tags: BTreeSet::new(),
            constraints: Vec::new(),
        }
    }

    /// Files constraints under a tag; dropped wholesale when the tag is
    /// disabled.
    fn emit(&mut self, tag: AssumptionTag, cs: Vec<Constraint>) {
        if self.disabled.contains(&tag) {
            return;
        }
        self.tags.insert(tag);
        self.constraints.extend(cs);
    }

    /// Files a definitional constraint that is never disabled.
    fn push_untagged(&mut self, c: Constraint) {
        self.constraints.push(c);
    }
}

/// Builds constraint problems from a resolved event and a policy.
pub struct ModelBuilder<'a> {
    event: &'a Event,
    policy: &'a SchedulingPolicy,
    /// Overlapping quest pairs (i < j), precomputed once.
    overlap_pairs: Vec<(usize, usize)>,
}

impl<'a> ModelBuilder<'a> {
    /// Prepares a builder, verifying the event is resolved and that no
    /// linked group contains mutually overlapping quests (fail fast:
    /// that is a data error, not a solvable model).
    pub fn new(event: &'a Event, policy: &'a SchedulingPolicy) -> Result<Self, ModelError> {
        if !event.is_resolved() {
            return Err(ModelError::UnresolvedEvent);
        }
        for group in event.quest_groups() {
            for (&i, &j) in group.iter().tuple_combinations() {
                let (a, b) = (&event.quests()[i], &event.quests()[j]);
                if a.overlaps(b) {
                    return Err(ModelError::OverlappingLinkedQuests {
                        quest_a: a.name.clone(),
                        quest_b: b.name.clone(),
                    });
                }
            }
        }
        let quests = event.quests();
        let overlap_pairs = (0..quests.len())
            .tuple_combinations()
            .filter(|&(i, j)| quests[i].overlaps(&quests[j]))
            .collect();
        Ok(Self {
            event,
            policy,
            overlap_pairs,
        })
    }

    /// Emits the model, skipping every rule instance whose tag is in
    /// `disabled`.
    pub fn build(
        &self,
        disabled: &BTreeSet<AssumptionTag>,
        mode: ObjectiveMode,
    ) -> CompiledModel {
        let event = self.event;
        let quests = event.quests();
        let volunteers = event.volunteers();

        let mut variables = ProblemVariables::new();
        let mut assignment: BTreeMap<(usize, usize), Variable> = BTreeMap::new();
        for (vi, volunteer) in volunteers.iter().enumerate() {
            for qi in 0..quests.len() {
                let var = variables.add(
                    variable()
                        .binary()
                        .name(format!("assign_{}_q{}", volunteer.id, qi)),
                );
                assignment.insert((vi, qi), var);
            }
        }

        let mut out = Emitter::new(disabled);

        // Pre-fixed pairs: several rules exempt them.
        let mut prefixed: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (qi, quest) in quests.iter().enumerate() {
            for vid in quest.fixed_volunteers.iter().filter_map(|r| r.resolved_id()) {
                if let Some(vi) = event.volunteer_position(vid) {
                    prefixed.insert((vi, qi));
                }
            }
        }

        // 1. Coverage: exact staffing per quest.
        for (qi, quest) in quests.iter().enumerate() {
            let total: Expression = (0..volunteers.len())
                .map(|vi| Expression::from(assignment[&(vi, qi)]))
                .sum();
            out.emit(
                AssumptionTag::Coverage {
                    quest_id: quest.id.clone(),
                },
                vec![constraint!(total == f64::from(quest.needed_volunteers))],
            );
        }

        // 2. Temporal exclusivity over overlapping pairs.
        for &(i, j) in &self.overlap_pairs {
            let cs = (0..volunteers.len())
                .map(|vi| constraint!(assignment[&(vi, i)] + assignment[&(vi, j)] <= 1))
                .collect();
            out.emit(
                AssumptionTag::Exclusivity {
                    quest_a: quests[i].id.clone(),
                    quest_b: quests[j].id.clone(),
                },
                cs,
            );
        }

        // 3. Pre-fixed assignments are forced true.
        for &(vi, qi) in &prefixed {
            out.emit(
                AssumptionTag::Prefixed {
                    volunteer_id: volunteers[vi].id.clone(),
                    quest_id: quests[qi].id.clone(),
                },
                vec![constraint!(assignment[&(vi, qi)] == 1)],
            );
        }

        // 4. Saturation lock: fully committed volunteers take nothing
        // more that day.
        for day in event.days() {
            for (vi, volunteer) in volunteers.iter().enumerate() {
                if !volunteer.is_fully_committed(day, event) {
                    continue;
                }
                let cs: Vec<Constraint> = event
                    .quests_on(day)
                    .iter()
                    .filter(|&&qi| !prefixed.contains(&(vi, qi)))
                    .map(|&qi| constraint!(assignment[&(vi, qi)] == 0))
                    .collect();
                if !cs.is_empty() {
                    out.emit(
                        AssumptionTag::Saturation {
                            volunteer_id: volunteer.id.clone(),
                            day,
                        },
                        cs,
                    );
                }
            }
        }

        // 5. Coverage-by-type quotas.
        for quota in &self.policy.type_quotas {
            let typed: Vec<usize> = quests
                .iter()
                .enumerate()
                .filter(|(_, q)| q.type_ids.iter().any(|t| t == &quota.type_id))
                .map(|(qi, _)| qi)
                .collect();
            if typed.is_empty() {
                continue;
            }
            for (vi, volunteer) in volunteers.iter().enumerate() {
                if volunteer.forbids_type(&quota.type_id) {
                    continue;
                }
                let sum: Expression = typed
                    .iter()
                    .map(|&qi| Expression::from(assignment[&(vi, qi)]))
                    .sum();
                let mut cs = Vec::new();
                if quota.at_most_one {
                    cs.push(constraint!(sum.clone() <= 1));
                }
                // "At least one" only binds volunteers that still have
                // room on some day carrying this type.
                let uncommitted_somewhere = typed.iter().any(|&qi| {
                    !volunteer.is_fully_committed(quests[qi].day(), event)
                });
                if quota.at_least_one && uncommitted_somewhere {
                    cs.push(constraint!(sum >= 1));
                }
                if !cs.is_empty() {
                    out.emit(
                        AssumptionTag::TypeQuota {
                            volunteer_id: volunteer.id.clone(),
                            type_id: quota.type_id.clone(),
                        },
                        cs,
                    );
                }
            }
        }

        // 6. Group continuity: pivot staffing follows to every member.
        for group in event.quest_groups() {
            let pivot = *group
                .iter()
                .min_by_key(|&&qi| (quests[qi].needed_volunteers, qi))
                .expect("groups have members");
            let mut cs = Vec::new();
            for &member in group.iter().filter(|&&m| m != pivot) {
                for vi in 0..volunteers.len() {
                    cs.push(constraint!(
                        assignment[&(vi, pivot)] - assignment[&(vi, member)] <= 0
                    ));
                }
            }
            out.emit(
                AssumptionTag::GroupFollow {
                    pivot_quest_id: quests[pivot].id.clone(),
                },
                cs,
            );
        }

        // 7. Show tracking: one tracking quest per volunteer per show
        // per day.
        if let Some(tracking_type) = &self.policy.tracking_type_id {
            let mut per_show_day: BTreeMap<(String, chrono::NaiveDate), Vec<usize>> =
                BTreeMap::new();
            for (qi, quest) in quests.iter().enumerate() {
                if quest.type_ids.iter().any(|t| t == tracking_type) {
                    if let Some(show) = &quest.show_id {
                        per_show_day
                            .entry((show.clone(), quest.day()))
                            .or_default()
                            .push(qi);
                    }
                }
            }
            for ((show_id, day), indices) in per_show_day {
                if indices.len() < 2 {
                    continue;
                }
                for (vi, volunteer) in volunteers.iter().enumerate() {
                    let sum: Expression = indices
                        .iter()
                        .map(|&qi| Expression::from(assignment[&(vi, qi)]))
                        .sum();
                    out.emit(
                        AssumptionTag::ShowTracking {
                            volunteer_id: volunteer.id.clone(),
                            show_id: show_id.clone(),
                            day,
                        },
                        vec![constraint!(sum <= 1)],
                    );
                }
            }
        }

        // 8-11, 14. Per-volunteer bars: presence window, unavailable
        // hours, specialist gating, forbidden places/types (plus the
        // serenity gate), negative appreciation. Each bar is evaluated
        // independently, so an explanation names every rule binding a
        // pair rather than only the first one checked. Pre-fixed pairs
        // are exempt everywhere except specialist gating, which is a
        // data requirement rather than an availability preference.
        for (vi, volunteer) in volunteers.iter().enumerate() {
            let mut presence = Vec::new();
            let mut unavailable = Vec::new();
            let mut excluded = Vec::new();
            let mut disliked = Vec::new();
            for (qi, quest) in quests.iter().enumerate() {
                if prefixed.contains(&(vi, qi)) {
                    continue;
                }
                if !volunteer.is_present_for(quest) {
                    presence.push(constraint!(assignment[&(vi, qi)] == 0));
                }
                if volunteer.is_unavailable_during(quest) {
                    unavailable.push(constraint!(assignment[&(vi, qi)] == 0));
                }
                let place_banned = quest
                    .place_id
                    .as_deref()
                    .is_some_and(|p| volunteer.forbids_place(p));
                let type_banned = quest.type_ids.iter().any(|t| volunteer.forbids_type(t));
                let serenity_banned = self.policy.serenity_type_id.as_deref().is_some_and(|t| {
                    quest.type_ids.iter().any(|qt| qt == t) && !volunteer.serenity_eligible
                });
                if place_banned || type_banned || serenity_banned {
                    excluded.push(constraint!(assignment[&(vi, qi)] == 0));
                }
                if self.policy.forbid_negative_preference
                    && preference_score(volunteer, quest) < 0
                {
                    disliked.push(constraint!(assignment[&(vi, qi)] == 0));
                }
            }
            if !presence.is_empty() {
                out.emit(
                    AssumptionTag::Presence {
                        volunteer_id: volunteer.id.clone(),
                    },
                    presence,
                );
            }
            if !unavailable.is_empty() {
                out.emit(
                    AssumptionTag::Unavailability {
                        volunteer_id: volunteer.id.clone(),
                    },
                    unavailable,
                );
            }
            if !excluded.is_empty() {
                out.emit(
                    AssumptionTag::Exclusion {
                        volunteer_id: volunteer.id.clone(),
                    },
                    excluded,
                );
            }
            if !disliked.is_empty() {
                out.emit(
                    AssumptionTag::Appreciation {
                        volunteer_id: volunteer.id.clone(),
                    },
                    disliked,
                );
            }

            // 10. Specialist gating applies even to pre-fixed pairs.
            for (qi, quest) in quests.iter().enumerate() {
                let required: Vec<&str> = quest
                    .type_ids
                    .iter()
                    .filter(|t| {
                        event
                            .quest_type(t)
                            .is_some_and(|qt| qt.specialist_only)
                    })
                    .map(String::as_str)
                    .collect();
                if required.is_empty() || required.iter().any(|t| volunteer.has_specialty(t)) {
                    continue;
                }
                out.emit(
                    AssumptionTag::Specialist {
                        volunteer_id: volunteer.id.clone(),
                        quest_id: quest.id.clone(),
                    },
                    vec![constraint!(assignment[&(vi, qi)] == 0)],
                );
            }
        }

        // 12. Mutual enmity, once per unordered pair.
        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (vi, volunteer) in volunteers.iter().enumerate() {
            for enemy in volunteer
                .forbidden_coworkers
                .iter()
                .filter_map(|r| r.resolved_id())
            {
                if let Some(ei) = event.volunteer_position(enemy) {
                    if ei != vi {
                        pairs.insert((vi.min(ei), vi.max(ei)));
                    }
                }
            }
        }
        for (a, b) in pairs {
            let cs = (0..quests.len())
                .map(|qi| constraint!(assignment[&(a, qi)] + assignment[&(b, qi)] <= 1))
                .collect();
            out.emit(
                AssumptionTag::Enmity {
                    volunteer_a: volunteers[a].id.clone(),
                    volunteer_b: volunteers[b].id.clone(),
                },
                cs,
            );
        }

        // 13. Daily rest: a contiguous free interval must fit into the
        // rest-eligible window, discretized to candidate start times on
        // the scoring grid. Skipped for days where some candidate window
        // clears every quest regardless of assignment.
        let candidates: Vec<i64> = {
            let last_start = self.policy.rest_window_end_min - self.policy.rest_minutes;
            (self.policy.rest_window_start_min..=last_start)
                .step_by(SCORING_STEP_MINUTES as usize)
                .collect()
        };
        for day in event.days() {
            let day_quests: Vec<usize> = event.quests_on(day).to_vec();
            if day_quests.is_empty() {
                continue;
            }
            let conflicts_of = |s: i64| -> Vec<usize> {
                day_quests
                    .iter()
                    .copied()
                    .filter(|&qi| {
                        let (qs, qe) = quests[qi].minute_of_day_span();
                        qs < s + self.policy.rest_minutes && s < qe
                    })
                    .collect()
            };
            if candidates.iter().any(|&s| conflicts_of(s).is_empty()) {
                // A rest slot is always free that day, whoever works what.
                continue;
            }
            for (vi, volunteer) in volunteers.iter().enumerate() {
                let mut cs = Vec::new();
                let mut any: Expression = Expression::from(0.0);
                for &s in &candidates {
                    let rest = variables.add(variable().binary());
                    any += rest;
                    for qi in conflicts_of(s) {
                        cs.push(constraint!(rest + assignment[&(vi, qi)] <= 1));
                    }
                }
                cs.push(constraint!(any >= 1));
                out.emit(
                    AssumptionTag::Rest {
                        volunteer_id: volunteer.id.clone(),
                        day,
                    },
                    cs,
                );
            }
        }

        // Fairness deviations, global span, and the objective.
        let mut preference: Expression = Expression::from(0.0);
        for (vi, volunteer) in volunteers.iter().enumerate() {
            for (qi, quest) in quests.iter().enumerate() {
                let score = preference_score(volunteer, quest);
                if score != 0 {
                    preference += score as f64 * assignment[&(vi, qi)];
                }
            }
        }

        let lower = variables.add(
            variable()
                .min(-DEVIATION_BOUND_MIN)
                .max(DEVIATION_BOUND_MIN)
                .name("deviation_lower"),
        );
        let upper = variables.add(
            variable()
                .min(-DEVIATION_BOUND_MIN)
                .max(DEVIATION_BOUND_MIN)
                .name("deviation_upper"),
        );
        out.push_untagged(constraint!(upper - lower >= 0));
        for day in event.days() {
            let adjusted = adjusted_theoretical_minutes(event, day);
            for (vi, volunteer) in volunteers.iter().enumerate() {
                let deviation = variables.add(
                    variable()
                        .min(-DEVIATION_BOUND_MIN)
                        .max(DEVIATION_BOUND_MIN),
                );
                let worked: Expression = event
                    .quests_on(day)
                    .iter()
                    .map(|&qi| quests[qi].duration_minutes() as f64 * assignment[&(vi, qi)])
                    .sum();
                let owed = adjusted.get(&volunteer.id).copied().unwrap_or(0.0);
                out.push_untagged(constraint!(deviation == worked - owed));
                out.push_untagged(constraint!(lower - deviation <= 0));
                out.push_untagged(constraint!(deviation - upper <= 0));
                out.emit(
                    AssumptionTag::DailySlack {
                        volunteer_id: volunteer.id.clone(),
                        day,
                    },
                    vec![
                        constraint!(deviation <= self.policy.max_daily_deviation_min),
                        constraint!(deviation >= -self.policy.max_daily_deviation_min),
                    ],
                );
            }
        }

        let objective = match mode {
            ObjectiveMode::Optimize => {
                self.policy.fairness_weight * (upper - lower)
                    - self.policy.preference_weight * preference
            }
            ObjectiveMode::FeasibilityOnly => Expression::from(0.0),
        };

        CompiledModel {
            variables,
            assignment,
            constraints: out.constraints,
            objective,
            tags: out.tags,
        }
    }

    /// The overlapping quest pairs the model enforces exclusivity on.
    pub fn overlap_pairs(&self) -> &[(usize, usize)] {
        &self.overlap_pairs
    }

    /// Convenience access to a quest by position.
    pub fn quest(&self, qi: usize) -> &Quest {
        &self.event.quests()[qi]
    }
}
