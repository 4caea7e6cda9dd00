//! Objective composition: preference scoring and fairness deviation.
//!
//! Two soft criteria feed the objective:
//!
//! - **Preference score**: a quest's span is walked in fixed 15-minute
//!   sub-intervals; each sub-interval contributes the volunteer's per-hour
//!   preference for that hour. Counted only when the assignment variable
//!   is true.
//! - **Fairness deviation**: per volunteer per day, actual assigned
//!   minutes minus an adjusted theoretical workload. The adjustment zeroes
//!   days outside the presence window and redistributes the day's global
//!   surplus or deficit (required work minutes vs. aggregate theoretical
//!   capacity) evenly across the volunteers that can still absorb it.
//!
//! The final objective, minimized:
//! `fairness_weight × (global deviation span) − preference_weight × Σ realized preference`.

use chrono::{NaiveDate, Timelike};
use std::collections::BTreeMap;

use crate::models::{Event, Quest, Roster, Volunteer};

use super::config::{SchedulingPolicy, SCORING_STEP_MINUTES};

/// Preference score of one quest for one volunteer.
///
/// Walks `[start, end)` in [`SCORING_STEP_MINUTES`] steps, summing the
/// volunteer's per-hour preference at each step.
pub fn preference_score(volunteer: &Volunteer, quest: &Quest) -> i64 {
    let step = chrono::Duration::minutes(SCORING_STEP_MINUTES);
    let mut score = 0i64;
    let mut t = quest.start;
    while t < quest.end {
        score += i64::from(volunteer.preference_for_hour(t.time().hour()));
        t += step;
    }
    score
}

/// Adjusted theoretical minutes owed per volunteer for one day.
///
/// Volunteers absent that day owe zero. Volunteers already fully
/// committed keep their raw contract. The remaining ("adjustable")
/// volunteers share the day's surplus or deficit evenly:
/// `required work minutes − aggregate theoretical capacity`, divided by
/// the adjustable head count.
pub fn adjusted_theoretical_minutes(event: &Event, day: NaiveDate) -> BTreeMap<String, f64> {
    let mut theoretical: BTreeMap<String, f64> = BTreeMap::new();
    let mut adjustable: Vec<String> = Vec::new();
    let mut capacity = 0.0;

    for volunteer in event.volunteers() {
        let theo = if volunteer.is_present_on(day) {
            volunteer.daily_theoretical_minutes
        } else {
            0.0
        };
        capacity += theo;
        theoretical.insert(volunteer.id.clone(), theo);
        if theo > 0.0 && !volunteer.is_fully_committed(day, event) {
            adjustable.push(volunteer.id.clone());
        }
    }

    let required: f64 = event
        .quests_on(day)
        .iter()
        .filter_map(|&idx| event.quest(idx))
        .map(|q| f64::from(q.needed_volunteers) * q.duration_minutes() as f64)
        .sum();

    if !adjustable.is_empty() {
        let share = (required - capacity) / adjustable.len() as f64;
        for id in adjustable {
            if let Some(theo) = theoretical.get_mut(&id) {
                *theo += share;
            }
        }
    }
    theoretical
}

/// Realized fairness and preference figures for a solved roster.
///
/// All deviations are in minutes; the span is the worst-case
/// over-allocation minus the worst-case under-allocation across the
/// whole event.
#[derive(Debug, Clone)]
pub struct ObjectiveSummary {
    /// Deviation per (volunteer id, day): assigned − adjusted theoretical.
    pub deviations: BTreeMap<(String, NaiveDate), f64>,
    /// Smallest deviation across all volunteer-days.
    pub lower_deviation: f64,
    /// Largest deviation across all volunteer-days.
    pub upper_deviation: f64,
    /// Sum of realized preference scores.
    pub total_preference: i64,
    /// The combined scalar the solver minimized.
    pub objective_value: f64,
}

impl ObjectiveSummary {
    /// Computes the summary for a roster.
    pub fn compute(roster: &Roster, event: &Event, policy: &SchedulingPolicy) -> Self {
        let mut deviations = BTreeMap::new();
        for day in event.days() {
            let adjusted = adjusted_theoretical_minutes(event, day);
            for volunteer in event.volunteers() {
                let assigned = roster.assigned_minutes_on(&volunteer.id, day, event) as f64;
                let owed = adjusted.get(&volunteer.id).copied().unwrap_or(0.0);
                deviations.insert((volunteer.id.clone(), day), assigned - owed);
            }
        }
        let lower_deviation = deviations.values().copied().fold(f64::INFINITY, f64::min);
        let upper_deviation = deviations
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let (lower_deviation, upper_deviation) = if deviations.is_empty() {
            (0.0, 0.0)
        } else {
            (lower_deviation, upper_deviation)
        };

        let mut total_preference = 0i64;
        for slot in &roster.slots {
            let Some(quest) = event.quest(slot.quest_index) else {
                continue;
            };
            for vid in &slot.volunteer_ids {
                if let Some(volunteer) = event.volunteer_by_id(vid) {
                    total_preference += preference_score(volunteer, quest);
                }
            }
        }

        let objective_value = policy.fairness_weight * (upper_deviation - lower_deviation)
            - policy.preference_weight * total_preference as f64;
        Self {
            deviations,
            lower_deviation,
            upper_deviation,
            total_preference,
            objective_value,
        }
    }

    /// Deviation for one volunteer-day, if computed.
    pub fn deviation_for(&self, volunteer_id: &str, day: NaiveDate) -> Option<f64> {
        self.deviations
            .get(&(volunteer_id.to_string(), day))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::at;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    #[test]
    fn test_preference_walk_sums_quarter_hours() {
        let v = Volunteer::new("v", "V")
            .with_hour_preference(10, 2)
            .with_hour_preference(11, -5);
        let q = Quest::new("q", "q", 1, at(day(), 10, 0), at(day(), 12, 0));
        // Four 15-minute steps at +2, four at -5.
        assert_eq!(preference_score(&v, &q), 4 * 2 + 4 * -5);
    }

    #[test]
    fn test_preference_partial_hour() {
        let v = Volunteer::new("v", "V").with_hour_preference(10, 2);
        let q = Quest::new("q", "q", 1, at(day(), 10, 0), at(day(), 10, 30));
        assert_eq!(preference_score(&v, &q), 4);
    }

    #[test]
    fn test_adjustment_spreads_surplus() {
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("a", "A").with_theoretical_minutes(120.0));
        event.add_volunteer(Volunteer::new("b", "B").with_theoretical_minutes(120.0));
        // One quest needing 2 volunteers for 180 minutes: required = 360,
        // capacity = 240, surplus = 120 spread as +60 each.
        event.add_quest(Quest::new("q", "q", 2, at(day(), 10, 0), at(day(), 13, 0)));
        let adjusted = adjusted_theoretical_minutes(&event, day());
        assert_eq!(adjusted["a"], 180.0);
        assert_eq!(adjusted["b"], 180.0);
    }

    #[test]
    fn test_absent_volunteer_owes_nothing() {
        let mut event = Event::new();
        event.add_volunteer(
            Volunteer::new("away", "Away")
                .with_theoretical_minutes(120.0)
                .with_presence(Some(at(day().succ_opt().unwrap(), 9, 0)), None),
        );
        event.add_volunteer(Volunteer::new("here", "Here").with_theoretical_minutes(120.0));
        event.add_quest(Quest::new("q", "q", 1, at(day(), 10, 0), at(day(), 12, 0)));
        let adjusted = adjusted_theoretical_minutes(&event, day());
        assert_eq!(adjusted["away"], 0.0);
        // required 120 − capacity 120 = 0 surplus.
        assert_eq!(adjusted["here"], 120.0);
    }

    #[test]
    fn test_exact_contract_yields_zero_deviation() {
        // A volunteer contracted for 2 hours, assigned exactly 2 hours.
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("ana", "Ana").with_theoretical_minutes(120.0));
        event.add_quest(Quest::new("q", "q", 1, at(day(), 10, 0), at(day(), 12, 0)));
        let mut roster = Roster::new();
        roster.add_slot(0, "q", vec!["ana".into()]);

        let summary = ObjectiveSummary::compute(&roster, &event, &SchedulingPolicy::default());
        assert_eq!(summary.deviation_for("ana", day()), Some(0.0));
        assert_eq!(summary.lower_deviation, 0.0);
        assert_eq!(summary.upper_deviation, 0.0);
    }
}
