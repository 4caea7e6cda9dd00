//! Volunteer model.
//!
//! A volunteer is bound by contracted daily minutes, per-hour preferences,
//! declared unavailability, an optional presence window, and exclusion
//! lists (co-workers, places, quest types). Exclusion and specialty lists
//! are ingested as raw ids and resolved by [`crate::resolve::strengthen`].
//!
//! # Preference scale
//! The original data source maps each hour slot to `-5` (works only under
//! constraint), `0` (neutral) or `+2` (preferred slot); a fourth state
//! marks the hour unavailable and lands in [`Volunteer::unavailable_hours`]
//! instead. The model accepts any signed value.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::event::Event;
use super::quest::{Quest, DAY_CUTOFF_HOUR};
use super::reference::EntityRef;

/// A person available for quest assignment.
///
/// # Invariant
/// `id` is unique across all volunteers (checked by
/// [`crate::validation::validate_event`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    /// Unique volunteer identifier.
    pub id: String,
    /// Nickname volunteers go by during the event.
    pub nickname: String,
    /// Legal first name.
    pub first_name: String,
    /// Legal last name.
    pub last_name: String,
    /// Whether this volunteer may staff the serenity-flagged quest type.
    pub serenity_eligible: bool,
    /// Contracted workload per event day, in minutes.
    pub daily_theoretical_minutes: f64,
    /// Per-hour preference scores (hour of day → signed score).
    /// Missing hours are neutral (0).
    pub hour_preferences: BTreeMap<u32, i32>,
    /// Hours of the day the volunteer cannot work at all.
    pub unavailable_hours: BTreeSet<u32>,
    /// Volunteers this one must never share a quest with (symmetric).
    pub forbidden_coworkers: Vec<EntityRef>,
    /// Places this volunteer must not be assigned to.
    pub forbidden_places: Vec<EntityRef>,
    /// Quest types this volunteer must not be assigned to.
    pub forbidden_types: Vec<EntityRef>,
    /// Quest-type specialties this volunteer holds.
    pub specialties: Vec<EntityRef>,
    /// Earliest datetime the volunteer is on site, if bounded.
    pub arrival: Option<NaiveDateTime>,
    /// Latest datetime the volunteer is on site, if bounded.
    pub departure: Option<NaiveDateTime>,
    /// Indices of quests already locked onto this volunteer.
    /// Filled from the quests' fixed lists during resolution.
    pub fixed_quests: Vec<usize>,
}

impl Volunteer {
    /// Creates a new volunteer.
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            first_name: String::new(),
            last_name: String::new(),
            serenity_eligible: false,
            daily_theoretical_minutes: 0.0,
            hour_preferences: BTreeMap::new(),
            unavailable_hours: BTreeSet::new(),
            forbidden_coworkers: Vec::new(),
            forbidden_places: Vec::new(),
            forbidden_types: Vec::new(),
            specialties: Vec::new(),
            arrival: None,
            departure: None,
            fixed_quests: Vec::new(),
        }
    }

    /// Sets the legal name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Sets the contracted daily workload in minutes.
    pub fn with_theoretical_minutes(mut self, minutes: f64) -> Self {
        self.daily_theoretical_minutes = minutes;
        self
    }

    /// Sets the preference score for one hour slot.
    pub fn with_hour_preference(mut self, hour: u32, score: i32) -> Self {
        self.hour_preferences.insert(hour, score);
        self
    }

    /// Marks one hour of the day as unavailable.
    pub fn with_unavailable_hour(mut self, hour: u32) -> Self {
        self.unavailable_hours.insert(hour);
        self
    }

    /// Declares a forbidden co-worker (by raw id).
    pub fn with_forbidden_coworker(mut self, volunteer_id: impl Into<String>) -> Self {
        self.forbidden_coworkers.push(EntityRef::raw(volunteer_id));
        self
    }

    /// Declares a forbidden place (by raw id).
    pub fn with_forbidden_place(mut self, place_id: impl Into<String>) -> Self {
        self.forbidden_places.push(EntityRef::raw(place_id));
        self
    }

    /// Declares a forbidden quest type (by raw id).
    pub fn with_forbidden_type(mut self, type_id: impl Into<String>) -> Self {
        self.forbidden_types.push(EntityRef::raw(type_id));
        self
    }

    /// Declares a held specialty (by raw quest-type id).
    pub fn with_specialty(mut self, type_id: impl Into<String>) -> Self {
        self.specialties.push(EntityRef::raw(type_id));
        self
    }

    /// Marks the volunteer as serenity-eligible.
    pub fn with_serenity_eligibility(mut self) -> Self {
        self.serenity_eligible = true;
        self
    }

    /// Bounds the volunteer's presence window.
    pub fn with_presence(
        mut self,
        arrival: Option<NaiveDateTime>,
        departure: Option<NaiveDateTime>,
    ) -> Self {
        self.arrival = arrival;
        self.departure = departure;
        self
    }

    /// Preference score for an hour slot (0 when unstated).
    pub fn preference_for_hour(&self, hour: u32) -> i32 {
        self.hour_preferences.get(&hour).copied().unwrap_or(0)
    }

    /// Whether the place is on this volunteer's forbidden list.
    pub fn forbids_place(&self, place_id: &str) -> bool {
        self.forbidden_places
            .iter()
            .any(|r| r.resolved_id() == Some(place_id))
    }

    /// Whether the quest type is on this volunteer's forbidden list.
    pub fn forbids_type(&self, type_id: &str) -> bool {
        self.forbidden_types
            .iter()
            .any(|r| r.resolved_id() == Some(type_id))
    }

    /// Whether the volunteer holds the given specialty.
    pub fn has_specialty(&self, type_id: &str) -> bool {
        self.specialties
            .iter()
            .any(|r| r.resolved_id() == Some(type_id))
    }

    /// Whether the quest fits inside this volunteer's presence window.
    pub fn is_present_for(&self, quest: &Quest) -> bool {
        self.arrival.is_none_or(|a| quest.start >= a)
            && self.departure.is_none_or(|d| quest.end <= d)
    }

    /// Whether the quest's day falls inside the presence window.
    ///
    /// A day counts as present when any part of it (05:00 to 05:00 next
    /// day) overlaps `[arrival, departure]`.
    pub fn is_present_on(&self, day: NaiveDate) -> bool {
        let cutoff = NaiveTime::from_hms_opt(DAY_CUTOFF_HOUR, 0, 0).expect("valid time");
        let day_start = day.and_time(cutoff);
        let day_end = day
            .checked_add_days(Days::new(1))
            .map_or(day_start, |d| d.and_time(cutoff));
        self.arrival.is_none_or(|a| a < day_end) && self.departure.is_none_or(|d| d > day_start)
    }

    /// Whether the quest's span hits one of this volunteer's unavailable
    /// hour windows.
    ///
    /// Each unavailable hour is anchored to the quest's event day; hours
    /// before the 05:00 cutoff belong to the next calendar day, matching
    /// the day-bucket rule.
    pub fn is_unavailable_during(&self, quest: &Quest) -> bool {
        let day = quest.day();
        self.unavailable_hours.iter().any(|&hour| {
            let date = if hour < DAY_CUTOFF_HOUR {
                day.checked_add_days(Days::new(1)).unwrap_or(day)
            } else {
                day
            };
            let window_start =
                date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"));
            let window_end = window_start + chrono::Duration::hours(1);
            quest.start < window_end && window_start < quest.end
        })
    }

    /// Minutes of already-fixed quests this volunteer carries on a day.
    pub fn fixed_minutes_on(&self, day: NaiveDate, event: &Event) -> i64 {
        self.fixed_quests
            .iter()
            .filter_map(|&idx| event.quest(idx))
            .filter(|q| q.day() == day)
            .map(Quest::duration_minutes)
            .sum()
    }

    /// Whether the volunteer's fixed quests already meet or exceed the
    /// contracted daily minutes for a day.
    ///
    /// A fully committed volunteer is barred from further unassigned work
    /// that day.
    pub fn is_fully_committed(&self, day: NaiveDate, event: &Event) -> bool {
        self.fixed_minutes_on(day, event) as f64 >= self.daily_theoretical_minutes
            && self.daily_theoretical_minutes > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quest::at;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn quest(start_h: u32, end_h: u32) -> Quest {
        Quest::new("q", "q", 1, at(day(), start_h, 0), at(day(), end_h, 0))
    }

    #[test]
    fn test_preference_defaults_to_neutral() {
        let v = Volunteer::new("v1", "Ana").with_hour_preference(20, 2);
        assert_eq!(v.preference_for_hour(20), 2);
        assert_eq!(v.preference_for_hour(10), 0);
    }

    #[test]
    fn test_unavailable_hour_intersects_quest() {
        let v = Volunteer::new("v1", "Ana").with_unavailable_hour(14);
        assert!(v.is_unavailable_during(&quest(13, 15)));
        assert!(v.is_unavailable_during(&quest(14, 15)));
        assert!(!v.is_unavailable_during(&quest(15, 17)));
        // Window ends at 15:00; a quest starting then is clear.
        assert!(!v.is_unavailable_during(&quest(10, 14)));
    }

    #[test]
    fn test_unavailable_hour_before_cutoff_wraps_to_next_date() {
        // Unavailable at 01:00: anchored to the night after the event day.
        let v = Volunteer::new("v1", "Ana").with_unavailable_hour(1);
        let night = Quest::new(
            "n",
            "n",
            1,
            at(day(), 23, 0),
            at(day().succ_opt().unwrap(), 2, 0),
        );
        assert!(v.is_unavailable_during(&night));
        assert!(!v.is_unavailable_during(&quest(10, 12)));
    }

    #[test]
    fn test_presence_window() {
        let v = Volunteer::new("v1", "Ana")
            .with_presence(Some(at(day(), 12, 0)), Some(at(day(), 18, 0)));
        assert!(v.is_present_for(&quest(12, 14)));
        assert!(!v.is_present_for(&quest(11, 13)));
        assert!(!v.is_present_for(&quest(17, 19)));
        assert!(v.is_present_on(day()));
        assert!(!v.is_present_on(day().succ_opt().unwrap()));
    }

    #[test]
    fn test_fixed_minutes_and_daily_commitment() {
        let mut event = Event::new();
        event.add_quest(Quest::new("q1", "Locked", 1, at(day(), 10, 0), at(day(), 12, 0)));
        event.add_quest(Quest::new("q2", "Open", 1, at(day(), 14, 0), at(day(), 15, 0)));
        let mut v = Volunteer::new("v1", "Ana").with_theoretical_minutes(120.0);
        v.fixed_quests = vec![0];

        assert_eq!(v.fixed_minutes_on(day(), &event), 120);
        assert!(v.is_fully_committed(day(), &event));
        // No fixed work on other days.
        assert!(!v.is_fully_committed(day().succ_opt().unwrap(), &event));
    }

    #[test]
    fn test_zero_contract_volunteer_is_never_committed() {
        // Volunteers without contracted minutes stay assignable; a zero
        // contract would otherwise saturate on any fixed work at all.
        let mut event = Event::new();
        event.add_quest(Quest::new("q1", "Locked", 1, at(day(), 10, 0), at(day(), 12, 0)));
        let mut v = Volunteer::new("v1", "Ana");
        v.fixed_quests = vec![0];

        assert_eq!(v.fixed_minutes_on(day(), &event), 120);
        assert!(!v.is_fully_committed(day(), &event));
    }

    #[test]
    fn test_forbidden_lists_only_match_resolved() {
        let mut v = Volunteer::new("v1", "Ana").with_forbidden_place("p1");
        assert!(!v.forbids_place("p1")); // unresolved yet
        v.forbidden_places[0] = EntityRef::Resolved("p1".into());
        assert!(v.forbids_place("p1"));
        assert!(!v.forbids_place("p2"));
    }
}
