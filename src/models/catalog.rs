//! Catalog entities: places, quest types, shows.
//!
//! Small label-like entities referenced by quests and volunteers.
//! Immutable after construction; registered in the [`crate::models::Event`]
//! by-id repositories at ingestion time.

use serde::{Deserialize, Serialize};

/// A physical location where quests happen.
///
/// Quests at different places incur an inter-quest travel buffer when
/// overlap is tested (see [`crate::models::Quest::overlaps`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Unique place identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

impl Place {
    /// Creates a new place.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A category of quest (e.g. bar shift, stage hand, gate watch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestType {
    /// Unique quest-type identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether a long quest of this type may be cut into sub-quests.
    pub splittable: bool,
    /// Whether quests of this type require a matching specialty.
    pub specialist_only: bool,
}

impl QuestType {
    /// Creates a new quest type (not splittable, no specialty required).
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            splittable: false,
            specialist_only: false,
        }
    }

    /// Marks quests of this type as splittable into sub-quests.
    pub fn splittable(mut self) -> Self {
        self.splittable = true;
        self
    }

    /// Marks quests of this type as requiring a matching specialty.
    pub fn specialist_only(mut self) -> Self {
        self.specialist_only = true;
        self
    }
}

/// A performance grouping label.
///
/// Purely descriptive: clusters the quests belonging to one show so that
/// show-scoped policies (e.g. "one tracking quest per volunteer per show
/// per day") can be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// Unique show identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

impl Show {
    /// Creates a new show.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
