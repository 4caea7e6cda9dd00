//! Scheduling domain models.
//!
//! Pure data plus derived temporal geometry. Entities are created once by
//! ingestion adapters, cross-linked once by [`crate::resolve::strengthen`],
//! and treated as read-only by the constraint builder and solver. The
//! solved assignment lives in a separate [`Roster`] artifact.

mod catalog;
mod event;
mod quest;
mod reference;
mod roster;
mod volunteer;

pub use catalog::{Place, QuestType, Show};
pub use event::Event;
pub use quest::{
    at, Quest, DAY_CUTOFF_HOUR, DEFAULT_SPLIT_MINUTES, INTER_QUEST_BUFFER_MIN,
};
pub use reference::{resolve_list, EntityRef};
pub use roster::{Roster, RosterSlot};
pub use volunteer::Volunteer;
