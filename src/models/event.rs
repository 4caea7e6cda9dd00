//! Event: the full problem instance.
//!
//! Holds the by-id repositories for every entity kind plus the derived
//! day index. Repositories are populated once by ingestion adapters,
//! linked once by [`crate::resolve::strengthen`], and read-only from then
//! on; the builder receives the event by shared reference and never
//! mutates it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::catalog::{Place, QuestType, Show};
use super::quest::Quest;
use super::volunteer::Volunteer;

/// A multi-day event: catalogs, quests, volunteers, derived indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    places: BTreeMap<String, Place>,
    quest_types: BTreeMap<String, QuestType>,
    shows: BTreeMap<String, Show>,
    volunteers: Vec<Volunteer>,
    volunteer_index: BTreeMap<String, usize>,
    quests: Vec<Quest>,
    quest_index: BTreeMap<String, Vec<usize>>,
    quests_by_day: BTreeMap<NaiveDate, Vec<usize>>,
    /// Linked-quest groups (quest indices), built during resolution.
    quest_groups: Vec<BTreeSet<usize>>,
    /// Set once `strengthen` has run.
    resolved: bool,
}

impl Event {
    /// Creates an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a place. Re-registering an id replaces the entry.
    pub fn add_place(&mut self, place: Place) {
        self.places.insert(place.id.clone(), place);
    }

    /// Registers a quest type. Re-registering an id replaces the entry.
    pub fn add_quest_type(&mut self, quest_type: QuestType) {
        self.quest_types.insert(quest_type.id.clone(), quest_type);
    }

    /// Registers a show. Re-registering an id replaces the entry.
    pub fn add_show(&mut self, show: Show) {
        self.shows.insert(show.id.clone(), show);
    }

    /// Registers a volunteer.
    ///
    /// Duplicate ids are kept in the list so that
    /// [`crate::validation::validate_event`] can report them; lookups
    /// always return the first occurrence.
    pub fn add_volunteer(&mut self, volunteer: Volunteer) {
        let idx = self.volunteers.len();
        self.volunteer_index
            .entry(volunteer.id.clone())
            .or_insert(idx);
        self.volunteers.push(volunteer);
    }

    /// Registers a quest, indexing it by id and by event day.
    ///
    /// Several quests may share one id (sub-quests from splitting).
    pub fn add_quest(&mut self, quest: Quest) {
        let idx = self.quests.len();
        self.quest_index
            .entry(quest.id.clone())
            .or_default()
            .push(idx);
        self.quests_by_day.entry(quest.day()).or_default().push(idx);
        self.quests.push(quest);
    }

    /// Place lookup by id.
    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    /// Quest-type lookup by id.
    pub fn quest_type(&self, id: &str) -> Option<&QuestType> {
        self.quest_types.get(id)
    }

    /// Show lookup by id.
    pub fn show(&self, id: &str) -> Option<&Show> {
        self.shows.get(id)
    }

    /// All places, ordered by id.
    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    /// All quest types, ordered by id.
    pub fn quest_types(&self) -> impl Iterator<Item = &QuestType> {
        self.quest_types.values()
    }

    /// All shows, ordered by id.
    pub fn shows(&self) -> impl Iterator<Item = &Show> {
        self.shows.values()
    }

    /// Volunteer by position.
    pub fn volunteer(&self, idx: usize) -> Option<&Volunteer> {
        self.volunteers.get(idx)
    }

    /// Volunteer by id (first occurrence wins).
    pub fn volunteer_by_id(&self, id: &str) -> Option<&Volunteer> {
        self.volunteer_index.get(id).map(|&i| &self.volunteers[i])
    }

    /// Whether a volunteer id is registered.
    pub fn has_volunteer(&self, id: &str) -> bool {
        self.volunteer_index.contains_key(id)
    }

    /// Position of a volunteer id in the registration order (first
    /// occurrence wins).
    pub fn volunteer_position(&self, id: &str) -> Option<usize> {
        self.volunteer_index.get(id).copied()
    }

    /// All volunteers, in registration order.
    pub fn volunteers(&self) -> &[Volunteer] {
        &self.volunteers
    }

    /// Quest by position.
    pub fn quest(&self, idx: usize) -> Option<&Quest> {
        self.quests.get(idx)
    }

    /// All quests, in registration order.
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    /// Indices of the quests registered under an id.
    pub fn quest_indices_by_id(&self, id: &str) -> &[usize] {
        self.quest_index.get(id).map_or(&[], Vec::as_slice)
    }

    /// Event days carrying at least one quest, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.quests_by_day.keys().copied().collect()
    }

    /// Indices of the quests bucketed to a day.
    pub fn quests_on(&self, day: NaiveDate) -> &[usize] {
        self.quests_by_day.get(&day).map_or(&[], Vec::as_slice)
    }

    /// Whether every required type of a quest is splittable.
    ///
    /// Quests with no declared type are not considered splittable.
    pub fn is_splittable(&self, quest: &Quest) -> bool {
        !quest.type_ids.is_empty()
            && quest
                .type_ids
                .iter()
                .all(|t| self.quest_types.get(t).is_some_and(|qt| qt.splittable))
    }

    /// Linked-quest groups (quest indices). Empty before resolution.
    pub fn quest_groups(&self) -> &[BTreeSet<usize>] {
        &self.quest_groups
    }

    /// Whether [`crate::resolve::strengthen`] has run.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    // Resolution hooks, crate-internal: the resolver is the only writer
    // after ingestion.

    pub(crate) fn volunteers_mut(&mut self) -> &mut [Volunteer] {
        &mut self.volunteers
    }

    pub(crate) fn quests_mut(&mut self) -> &mut [Quest] {
        &mut self.quests
    }

    pub(crate) fn set_quest_groups(&mut self, groups: Vec<BTreeSet<usize>>) {
        self.quest_groups = groups;
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quest::at;
    use crate::models::QuestType;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn sample_event() -> Event {
        let mut event = Event::new();
        event.add_place(Place::new("p1", "Gate"));
        event.add_quest_type(QuestType::new("qt1", "Bar").splittable());
        event.add_quest_type(QuestType::new("qt2", "Sound"));
        event.add_quest(
            Quest::new("q1", "Early", 2, at(day(), 10, 0), at(day(), 12, 0)).with_type("qt1"),
        );
        event.add_quest(
            // Past midnight: buckets to the same event day.
            Quest::new(
                "q2",
                "Late",
                1,
                at(day().succ_opt().unwrap(), 1, 0),
                at(day().succ_opt().unwrap(), 3, 0),
            ),
        );
        event
    }

    #[test]
    fn test_day_index_uses_bucket_rule() {
        let event = sample_event();
        assert_eq!(event.days(), vec![day()]);
        assert_eq!(event.quests_on(day()).len(), 2);
    }

    #[test]
    fn test_quest_id_index_allows_shared_ids() {
        let mut event = sample_event();
        event.add_quest(Quest::new("q1", "Early #2", 2, at(day(), 12, 0), at(day(), 14, 0)));
        assert_eq!(event.quest_indices_by_id("q1"), &[0, 2]);
        assert_eq!(event.quest_indices_by_id("missing"), &[] as &[usize]);
    }

    #[test]
    fn test_is_splittable_requires_all_types_splittable() {
        let event = sample_event();
        let all_splittable = Quest::new("s", "s", 1, at(day(), 9, 0), at(day(), 10, 0)).with_type("qt1");
        let mixed = all_splittable.clone().with_type("qt2");
        let untyped = Quest::new("u", "u", 1, at(day(), 9, 0), at(day(), 10, 0));
        assert!(event.is_splittable(&all_splittable));
        assert!(!event.is_splittable(&mixed));
        assert!(!event.is_splittable(&untyped));
    }

    #[test]
    fn test_first_volunteer_wins_on_duplicate_id() {
        let mut event = sample_event();
        event.add_volunteer(crate::models::Volunteer::new("v1", "Ana"));
        event.add_volunteer(crate::models::Volunteer::new("v1", "Impostor"));
        assert_eq!(event.volunteers().len(), 2);
        assert_eq!(event.volunteer_by_id("v1").unwrap().nickname, "Ana");
    }
}
