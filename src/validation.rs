//! Input validation and post-solve verification.
//!
//! [`validate_event`] catches data problems before any model is built:
//! duplicate ids and dangling catalog references. [`verify_roster`]
//! independently re-checks the structural invariants of a solved roster
//! (exact coverage, temporal exclusivity, daily rest) without trusting
//! the solver, so regressions in the model surface as hard failures.

use itertools::Itertools;
use thiserror::Error;

use crate::models::{Event, Roster};
use crate::solver::{SchedulingPolicy, SCORING_STEP_MINUTES};

/// One violated rule, with the entities involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("volunteer id '{0}' is registered more than once")]
    DuplicateVolunteerId(String),
    #[error("quest '{quest_id}' references unknown quest type '{type_id}'")]
    UnknownQuestType { quest_id: String, type_id: String },
    #[error("quest '{quest_id}' references unknown place '{place_id}'")]
    UnknownPlace { quest_id: String, place_id: String },
    #[error("quest '{quest_id}' references unknown show '{show_id}'")]
    UnknownShow { quest_id: String, show_id: String },
    #[error("quest '{quest_id}' is staffed by {actual} volunteers, needs {needed}")]
    CoverageMismatch {
        quest_id: String,
        needed: u32,
        actual: usize,
    },
    #[error("volunteer '{volunteer_id}' is assigned twice to quest '{quest_id}'")]
    DuplicateAssignment {
        volunteer_id: String,
        quest_id: String,
    },
    #[error("volunteer '{volunteer_id}' is on overlapping quests '{quest_a}' and '{quest_b}'")]
    OverlappingAssignments {
        volunteer_id: String,
        quest_a: String,
        quest_b: String,
    },
    #[error("volunteer '{volunteer_id}' has no contiguous rest on {day}")]
    MissingRest { volunteer_id: String, day: String },
}

/// `Ok(())` or every violation found.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Checks the event's referential integrity before solving.
pub fn validate_event(event: &Event) -> ValidationResult {
    let mut errors = Vec::new();

    let mut seen = std::collections::BTreeSet::new();
    for volunteer in event.volunteers() {
        if !seen.insert(volunteer.id.as_str()) {
            errors.push(ValidationError::DuplicateVolunteerId(volunteer.id.clone()));
        }
    }

    for quest in event.quests() {
        for type_id in &quest.type_ids {
            if event.quest_type(type_id).is_none() {
                errors.push(ValidationError::UnknownQuestType {
                    quest_id: quest.id.clone(),
                    type_id: type_id.clone(),
                });
            }
        }
        if let Some(place_id) = &quest.place_id {
            if event.place(place_id).is_none() {
                errors.push(ValidationError::UnknownPlace {
                    quest_id: quest.id.clone(),
                    place_id: place_id.clone(),
                });
            }
        }
        if let Some(show_id) = &quest.show_id {
            if event.show(show_id).is_none() {
                errors.push(ValidationError::UnknownShow {
                    quest_id: quest.id.clone(),
                    show_id: show_id.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Re-checks the structural invariants of a solved roster.
pub fn verify_roster(event: &Event, roster: &Roster, policy: &SchedulingPolicy) -> ValidationResult {
    let mut errors = Vec::new();

    for (qi, quest) in event.quests().iter().enumerate() {
        let assigned = roster.volunteers_for_quest(qi);
        if assigned.len() != quest.needed_volunteers as usize {
            errors.push(ValidationError::CoverageMismatch {
                quest_id: quest.id.clone(),
                needed: quest.needed_volunteers,
                actual: assigned.len(),
            });
        }
        for id in assigned.iter().duplicates() {
            errors.push(ValidationError::DuplicateAssignment {
                volunteer_id: id.clone(),
                quest_id: quest.id.clone(),
            });
        }
    }

    for volunteer in event.volunteers() {
        let mine = roster.quests_for_volunteer(&volunteer.id);
        for (&a, &b) in mine.iter().tuple_combinations() {
            let (qa, qb) = (&event.quests()[a], &event.quests()[b]);
            if qa.overlaps(qb) {
                errors.push(ValidationError::OverlappingAssignments {
                    volunteer_id: volunteer.id.clone(),
                    quest_a: qa.id.clone(),
                    quest_b: qb.id.clone(),
                });
            }
        }

        // Rest: some candidate window in the eligible period must clear
        // every quest the volunteer works that day.
        for day in event.days() {
            let spans: Vec<(i64, i64)> = mine
                .iter()
                .map(|&qi| &event.quests()[qi])
                .filter(|q| q.day() == day)
                .map(|q| q.minute_of_day_span())
                .collect();
            if spans.is_empty() {
                continue;
            }
            let last_start = policy.rest_window_end_min - policy.rest_minutes;
            let rested = (policy.rest_window_start_min..=last_start)
                .step_by(SCORING_STEP_MINUTES as usize)
                .any(|s| {
                    spans
                        .iter()
                        .all(|&(qs, qe)| qs >= s + policy.rest_minutes || qe <= s)
                });
            if !rested {
                errors.push(ValidationError::MissingRest {
                    volunteer_id: volunteer.id.clone(),
                    day: day.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{at, Place, Quest, QuestType, Volunteer};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    #[test]
    fn test_clean_event_passes() {
        let mut event = Event::new();
        event.add_place(Place::new("p1", "Gate"));
        event.add_quest_type(QuestType::new("qt1", "Bar"));
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_quest(
            Quest::new("q1", "Shift", 1, at(day(), 10, 0), at(day(), 12, 0))
                .with_type("qt1")
                .with_place("p1"),
        );
        assert!(validate_event(&event).is_ok());
    }

    #[test]
    fn test_dangling_references_and_duplicates_are_reported() {
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_volunteer(Volunteer::new("ana", "Other Ana"));
        event.add_quest(
            Quest::new("q1", "Shift", 1, at(day(), 10, 0), at(day(), 12, 0))
                .with_type("ghost")
                .with_place("nowhere"),
        );
        let errors = validate_event(&event).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateVolunteerId("ana".into())));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownQuestType { type_id, .. } if type_id == "ghost"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownPlace { place_id, .. } if place_id == "nowhere"
        )));
    }

    #[test]
    fn test_verify_catches_coverage_and_overlap() {
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_quest(Quest::new("q1", "First", 1, at(day(), 10, 0), at(day(), 12, 0)));
        event.add_quest(Quest::new("q2", "Second", 2, at(day(), 11, 0), at(day(), 13, 0)));

        let mut roster = Roster::new();
        roster.add_slot(0, "q1", vec!["ana".into()]);
        roster.add_slot(1, "q2", vec!["ana".into()]);

        let errors =
            verify_roster(&event, &roster, &SchedulingPolicy::default()).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::CoverageMismatch { quest_id, .. } if quest_id == "q2"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::OverlappingAssignments { volunteer_id, .. } if volunteer_id == "ana"
        )));
    }

    #[test]
    fn test_verify_catches_missing_rest() {
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_quest(Quest::new("q1", "Marathon", 1, at(day(), 8, 0), at(day(), 23, 30)));
        let mut roster = Roster::new();
        roster.add_slot(0, "q1", vec!["ana".into()]);

        let errors =
            verify_roster(&event, &roster, &SchedulingPolicy::default()).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::MissingRest { volunteer_id, .. } if volunteer_id == "ana"
        )));
    }

    #[test]
    fn test_verify_accepts_a_clean_roster() {
        let mut event = Event::new();
        event.add_volunteer(Volunteer::new("ana", "Ana"));
        event.add_quest(Quest::new("q1", "Shift", 1, at(day(), 10, 0), at(day(), 12, 0)));
        let mut roster = Roster::new();
        roster.add_slot(0, "q1", vec!["ana".into()]);
        assert!(verify_roster(&event, &roster, &SchedulingPolicy::default()).is_ok());
    }
}
