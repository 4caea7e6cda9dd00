//! Assumption tags: explainability labels for constraint instances.
//!
//! Every "soft-hard" constraint instance the builder emits is filed under
//! a tag naming the business rule and the entities involved. The backend
//! has no assumption literals, so the orchestrator explains infeasibility
//! by re-solving with tag groups disabled and reporting the minimal set
//! that cannot be removed (deletion-based MUS). Tags are the unit of both
//! disabling and reporting, so their granularity is the business-rule
//! instance, not the raw inequality.

use serde::{Deserialize, Serialize};
use std::fmt;

use chrono::NaiveDate;

/// One taggable constraint instance.
///
/// `Display` renders the human-readable cause shown to schedule authors
/// (e.g. `"volunteers ana and bob cannot work together"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssumptionTag {
    /// Quest must be staffed by exactly its needed count.
    Coverage { quest_id: String },
    /// Two overlapping quests exclude sharing any volunteer.
    Exclusivity { quest_a: String, quest_b: String },
    /// A volunteer is locked onto a quest up front.
    Prefixed { volunteer_id: String, quest_id: String },
    /// A fully committed volunteer takes no further work that day.
    Saturation { volunteer_id: String, day: NaiveDate },
    /// Per-type quota ("at least one" / "at most one") for a volunteer.
    TypeQuota { volunteer_id: String, type_id: String },
    /// Group continuity: pivot staffing follows to every member.
    GroupFollow { pivot_quest_id: String },
    /// One tracking quest per volunteer per show per day.
    ShowTracking {
        volunteer_id: String,
        show_id: String,
        day: NaiveDate,
    },
    /// Quests outside the volunteer's presence window are barred.
    Presence { volunteer_id: String },
    /// Quests hitting the volunteer's unavailable hours are barred.
    Unavailability { volunteer_id: String },
    /// Specialist-only quests require a matching specialty.
    Specialist { volunteer_id: String, quest_id: String },
    /// Forbidden places and quest types are barred.
    Exclusion { volunteer_id: String },
    /// Two volunteers never share a quest.
    Enmity { volunteer_a: String, volunteer_b: String },
    /// Contiguous rest must fit into the volunteer's day.
    Rest { volunteer_id: String, day: NaiveDate },
    /// Daily workload deviation stays within the allowed slack.
    DailySlack { volunteer_id: String, day: NaiveDate },
    /// Negative-preference assignments are barred.
    Appreciation { volunteer_id: String },
}

impl fmt::Display for AssumptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coverage { quest_id } => {
                write!(f, "quest {quest_id} must be fully staffed")
            }
            Self::Exclusivity { quest_a, quest_b } => {
                write!(f, "quests {quest_a} and {quest_b} overlap in time")
            }
            Self::Prefixed {
                volunteer_id,
                quest_id,
            } => write!(f, "volunteer {volunteer_id} is locked onto quest {quest_id}"),
            Self::Saturation { volunteer_id, day } => {
                write!(f, "volunteer {volunteer_id} is fully committed on {day}")
            }
            Self::TypeQuota {
                volunteer_id,
                type_id,
            } => write!(
                f,
                "volunteer {volunteer_id} is under the quota for quest type {type_id}"
            ),
            Self::GroupFollow { pivot_quest_id } => write!(
                f,
                "staffing of quest {pivot_quest_id} carries over to its linked quests"
            ),
            Self::ShowTracking {
                volunteer_id,
                show_id,
                day,
            } => write!(
                f,
                "volunteer {volunteer_id} may track show {show_id} at most once on {day}"
            ),
            Self::Presence { volunteer_id } => write!(
                f,
                "volunteer {volunteer_id} can only work within their presence window"
            ),
            Self::Unavailability { volunteer_id } => write!(
                f,
                "volunteer {volunteer_id} has declared unavailable hours"
            ),
            Self::Specialist {
                volunteer_id,
                quest_id,
            } => write!(
                f,
                "volunteer {volunteer_id} lacks the specialty quest {quest_id} requires"
            ),
            Self::Exclusion { volunteer_id } => write!(
                f,
                "volunteer {volunteer_id} has forbidden places or quest types"
            ),
            Self::Enmity {
                volunteer_a,
                volunteer_b,
            } => write!(
                f,
                "volunteers {volunteer_a} and {volunteer_b} cannot work together"
            ),
            Self::Rest { volunteer_id, day } => write!(
                f,
                "volunteer {volunteer_id} needs a contiguous rest on {day}"
            ),
            Self::DailySlack { volunteer_id, day } => write!(
                f,
                "volunteer {volunteer_id}'s workload on {day} must stay near their contract"
            ),
            Self::Appreciation { volunteer_id } => write!(
                f,
                "volunteer {volunteer_id} is shielded from disliked hours"
            ),
        }
    }
}
