//! Export adapters: flat assignment feed, rich web document, calendar.
//!
//! All exporters are pure functions of the read-only [`Event`] plus the
//! solved [`Roster`]; nothing here mutates domain state. Timestamps are
//! rendered as local ISO-8601 without offset, matching the ingestion
//! format.

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::Serialize;

use crate::models::{Event, Roster};

const EXPORT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn iso(t: NaiveDateTime) -> String {
    t.format(EXPORT_TIME_FORMAT).to_string()
}

/// One line of the flat assignment feed.
///
/// `locked` is always `false` on a fresh solve; downstream planning tools
/// flip it to pin a slot across re-solves.
#[derive(Debug, Clone, Serialize)]
pub struct FlatAssignment {
    pub name: String,
    pub quest_id: String,
    pub volunteers_id: Vec<String>,
    pub start: String,
    pub end: String,
    pub locked: bool,
}

/// Flattens a roster into one record per quest, in quest order.
pub fn flat_assignments(event: &Event, roster: &Roster) -> Vec<FlatAssignment> {
    roster
        .slots
        .iter()
        .filter_map(|slot| {
            let quest = event.quest(slot.quest_index)?;
            Some(FlatAssignment {
                name: quest.name.clone(),
                quest_id: slot.quest_id.clone(),
                volunteers_id: slot.volunteer_ids.clone(),
                start: iso(quest.start),
                end: iso(quest.end),
                locked: false,
            })
        })
        .collect()
}

/// Serializes the flat feed as pretty-printed JSON.
pub fn flat_json(event: &Event, roster: &Roster) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&flat_assignments(event, roster))
}

#[derive(Debug, Clone, Serialize)]
pub struct WebCatalogEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebVolunteer {
    pub id: String,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebQuest {
    pub id: String,
    pub name: String,
    pub type_ids: Vec<String>,
    pub place_id: Option<String>,
    pub show_id: Option<String>,
    pub needed_volunteers: u32,
    pub start: String,
    pub end: String,
    pub volunteer_ids: Vec<String>,
}

/// Self-contained document for the web planning frontend: the catalogs
/// the quest records reference by id, plus the staffed quests.
#[derive(Debug, Clone, Serialize)]
pub struct WebDocument {
    pub quest_types: Vec<WebCatalogEntry>,
    pub places: Vec<WebCatalogEntry>,
    pub volunteers: Vec<WebVolunteer>,
    pub quests: Vec<WebQuest>,
}

/// Builds the web document for a solved roster.
pub fn web_document(event: &Event, roster: &Roster) -> WebDocument {
    let quests = roster
        .slots
        .iter()
        .filter_map(|slot| {
            let quest = event.quest(slot.quest_index)?;
            Some(WebQuest {
                id: quest.id.clone(),
                name: quest.name.clone(),
                type_ids: quest.type_ids.clone(),
                place_id: quest.place_id.clone(),
                show_id: quest.show_id.clone(),
                needed_volunteers: quest.needed_volunteers,
                start: iso(quest.start),
                end: iso(quest.end),
                volunteer_ids: slot.volunteer_ids.clone(),
            })
        })
        .collect();
    WebDocument {
        quest_types: event
            .quest_types()
            .map(|qt| WebCatalogEntry {
                id: qt.id.clone(),
                name: qt.name.clone(),
            })
            .collect(),
        places: event
            .places()
            .map(|p| WebCatalogEntry {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect(),
        volunteers: event
            .volunteers()
            .iter()
            .map(|v| WebVolunteer {
                id: v.id.clone(),
                nickname: v.nickname.clone(),
            })
            .collect(),
        quests,
    }
}

/// Serializes the web document as pretty-printed JSON.
pub fn web_json(event: &Event, roster: &Roster) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&web_document(event, roster))
}

/// One calendar block per staffed quest: who is on, where.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    /// Nicknames of the assigned volunteers, comma-joined.
    pub title: String,
    /// Place name, empty when the quest has no place.
    pub description: String,
    pub start: String,
    pub end: String,
}

/// Builds calendar entries for every staffed quest.
pub fn calendar_entries(event: &Event, roster: &Roster) -> Vec<CalendarEntry> {
    roster
        .slots
        .iter()
        .filter(|slot| !slot.volunteer_ids.is_empty())
        .filter_map(|slot| {
            let quest = event.quest(slot.quest_index)?;
            let title = slot
                .volunteer_ids
                .iter()
                .filter_map(|id| event.volunteer_by_id(id))
                .map(|v| v.nickname.as_str())
                .join(", ");
            let description = quest
                .place_id
                .as_deref()
                .and_then(|p| event.place(p))
                .map(|p| p.name.clone())
                .unwrap_or_default();
            Some(CalendarEntry {
                title,
                description,
                start: iso(quest.start),
                end: iso(quest.end),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{at, Place, Quest, QuestType, Volunteer};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn sample() -> (Event, Roster) {
        let mut event = Event::new();
        event.add_place(Place::new("p1", "Main Gate"));
        event.add_quest_type(QuestType::new("qt1", "Bar"));
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_volunteer(Volunteer::new("bob", "Bob"));
        event.add_quest(
            Quest::new("q1", "Gate shift", 2, at(day(), 10, 0), at(day(), 12, 0))
                .with_type("qt1")
                .with_place("p1"),
        );
        let mut roster = Roster::new();
        roster.add_slot(0, "q1", vec!["ana".into(), "bob".into()]);
        (event, roster)
    }

    #[test]
    fn test_flat_feed_shape() {
        let (event, roster) = sample();
        let json = flat_json(&event, &roster).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let record = &parsed[0];
        assert_eq!(record["name"], "Gate shift");
        assert_eq!(record["quest_id"], "q1");
        assert_eq!(record["volunteers_id"][1], "bob");
        assert_eq!(record["start"], "2024-07-03T10:00:00");
        assert_eq!(record["locked"], false);
    }

    #[test]
    fn test_web_document_carries_catalogs() {
        let (event, roster) = sample();
        let doc = web_document(&event, &roster);
        assert_eq!(doc.places.len(), 1);
        assert_eq!(doc.quest_types.len(), 1);
        assert_eq!(doc.volunteers.len(), 2);
        assert_eq!(doc.quests[0].volunteer_ids, vec!["ana", "bob"]);
        assert_eq!(doc.quests[0].place_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_calendar_titles_and_places() {
        let (event, roster) = sample();
        let entries = calendar_entries(&event, &roster);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Ana, Bob");
        assert_eq!(entries[0].description, "Main Gate");
    }

    #[test]
    fn test_unstaffed_quests_skip_the_calendar() {
        let (event, mut roster) = sample();
        roster.slots[0].volunteer_ids.clear();
        assert!(calendar_entries(&event, &roster).is_empty());
        // The flat feed still lists them.
        assert_eq!(flat_assignments(&event, &roster).len(), 1);
    }
}
