//! Roster: the solved assignment relation.
//!
//! A roster records, for every quest, which volunteers staff it. It is a
//! derived artifact of the solve; the domain entities are never mutated
//! by solving, and export adapters consume the roster together with the
//! read-only [`super::Event`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::event::Event;

/// Staffing of one quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSlot {
    /// Position of the quest in the event's quest list.
    pub quest_index: usize,
    /// The quest's id (denormalized for export convenience).
    pub quest_id: String,
    /// Ids of the volunteers assigned to the quest.
    pub volunteer_ids: Vec<String>,
}

/// A complete volunteer-to-quest assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// One slot per quest, in quest order.
    pub slots: Vec<RosterSlot>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the staffing of one quest.
    pub fn add_slot(&mut self, quest_index: usize, quest_id: impl Into<String>, volunteer_ids: Vec<String>) {
        self.slots.push(RosterSlot {
            quest_index,
            quest_id: quest_id.into(),
            volunteer_ids,
        });
    }

    /// Volunteers assigned to the quest at `quest_index`.
    pub fn volunteers_for_quest(&self, quest_index: usize) -> &[String] {
        self.slots
            .iter()
            .find(|s| s.quest_index == quest_index)
            .map_or(&[], |s| s.volunteer_ids.as_slice())
    }

    /// Whether a volunteer staffs the quest at `quest_index`.
    pub fn is_assigned(&self, volunteer_id: &str, quest_index: usize) -> bool {
        self.volunteers_for_quest(quest_index)
            .iter()
            .any(|id| id == volunteer_id)
    }

    /// Indices of every quest a volunteer staffs.
    pub fn quests_for_volunteer(&self, volunteer_id: &str) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|s| s.volunteer_ids.iter().any(|id| id == volunteer_id))
            .map(|s| s.quest_index)
            .collect()
    }

    /// Minutes a volunteer works on a given event day.
    pub fn assigned_minutes_on(&self, volunteer_id: &str, day: NaiveDate, event: &Event) -> i64 {
        self.quests_for_volunteer(volunteer_id)
            .into_iter()
            .filter_map(|idx| event.quest(idx))
            .filter(|q| q.day() == day)
            .map(|q| q.duration_minutes())
            .sum()
    }

    /// Total assigned volunteer-slots across all quests.
    pub fn assignment_count(&self) -> usize {
        self.slots.iter().map(|s| s.volunteer_ids.len()).sum()
    }

    /// Minutes worked per volunteer per day, for reporting.
    pub fn minutes_by_volunteer_day(&self, event: &Event) -> BTreeMap<(String, NaiveDate), i64> {
        let mut acc: BTreeMap<(String, NaiveDate), i64> = BTreeMap::new();
        for slot in &self.slots {
            let Some(quest) = event.quest(slot.quest_index) else {
                continue;
            };
            for vid in &slot.volunteer_ids {
                *acc.entry((vid.clone(), quest.day())).or_insert(0) += quest.duration_minutes();
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quest::at;
    use crate::models::Quest;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn sample() -> (Event, Roster) {
        let mut event = Event::new();
        event.add_quest(Quest::new("q1", "Gate", 2, at(day(), 10, 0), at(day(), 12, 0)));
        event.add_quest(Quest::new("q2", "Bar", 1, at(day(), 14, 0), at(day(), 15, 0)));
        let mut roster = Roster::new();
        roster.add_slot(0, "q1", vec!["ana".into(), "bob".into()]);
        roster.add_slot(1, "q2", vec!["ana".into()]);
        (event, roster)
    }

    #[test]
    fn test_lookups() {
        let (_, roster) = sample();
        assert!(roster.is_assigned("ana", 0));
        assert!(roster.is_assigned("ana", 1));
        assert!(!roster.is_assigned("bob", 1));
        assert_eq!(roster.quests_for_volunteer("ana"), vec![0, 1]);
        assert_eq!(roster.assignment_count(), 3);
    }

    #[test]
    fn test_assigned_minutes_per_day() {
        let (event, roster) = sample();
        assert_eq!(roster.assigned_minutes_on("ana", day(), &event), 180);
        assert_eq!(roster.assigned_minutes_on("bob", day(), &event), 120);
        let by_day = roster.minutes_by_volunteer_day(&event);
        assert_eq!(by_day[&("ana".to_string(), day())], 180);
    }
}
