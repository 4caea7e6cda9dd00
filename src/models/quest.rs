//! Quest model: a time-boxed shift needing N volunteers.
//!
//! Carries the temporal geometry the constraint builder works from:
//! duration, event-day bucketing (nights past midnight belong to the
//! previous day), and pairwise overlap with an inter-quest travel buffer
//! between different places.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::reference::EntityRef;

/// Minutes of travel buffer applied when testing overlap between quests
/// at different places.
pub const INTER_QUEST_BUFFER_MIN: i64 = 15;

/// Hour before which a quest still belongs to the previous event day.
pub const DAY_CUTOFF_HOUR: u32 = 5;

/// Default chunk length when splitting a splittable quest, in minutes.
pub const DEFAULT_SPLIT_MINUTES: i64 = 120;

/// A single staffed, time-boxed task.
///
/// A quest may require several [`super::QuestType`]s simultaneously, sit
/// at an optional [`super::Place`], belong to an optional [`super::Show`],
/// and declare links to other quests that must share its staffing.
///
/// # Invariant
/// `end > start` (enforced at construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    /// Quest identifier. Sub-quests produced by [`Quest::split`] keep the
    /// parent id, so ids are not unique across the quest list.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Required quest-type ids (a quest may require several at once).
    pub type_ids: Vec<String>,
    /// Where the quest happens, if anywhere specific.
    pub place_id: Option<String>,
    /// Show this quest belongs to, if any.
    pub show_id: Option<String>,
    /// Exact number of volunteers the quest needs.
    pub needed_volunteers: u32,
    /// Shift start.
    pub start: NaiveDateTime,
    /// Shift end.
    pub end: NaiveDateTime,
    /// Volunteers locked onto this quest before solving.
    pub fixed_volunteers: Vec<EntityRef>,
    /// Quests that must share this quest's staffing (symmetric once
    /// resolved and grouped).
    pub linked_quests: Vec<EntityRef>,
}

impl Quest {
    /// Creates a new quest.
    ///
    /// # Panics
    /// Panics if `end <= start`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        needed_volunteers: u32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        assert!(end > start, "quest must end after it starts");
        Self {
            id: id.into(),
            name: name.into(),
            type_ids: Vec::new(),
            place_id: None,
            show_id: None,
            needed_volunteers,
            start,
            end,
            fixed_volunteers: Vec::new(),
            linked_quests: Vec::new(),
        }
    }

    /// Adds a required quest type.
    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_ids.push(type_id.into());
        self
    }

    /// Sets the place.
    pub fn with_place(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    /// Sets the show.
    pub fn with_show(mut self, show_id: impl Into<String>) -> Self {
        self.show_id = Some(show_id.into());
        self
    }

    /// Locks a volunteer onto this quest.
    pub fn with_fixed_volunteer(mut self, volunteer_id: impl Into<String>) -> Self {
        self.fixed_volunteers.push(EntityRef::raw(volunteer_id));
        self
    }

    /// Declares a link to another quest (by raw id, resolved later).
    pub fn with_linked_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.linked_quests.push(EntityRef::raw(quest_id));
        self
    }

    /// Shift length in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Event day this quest belongs to.
    ///
    /// Starts before 05:00 bucket into the previous calendar day, since
    /// event nights run past midnight.
    pub fn day(&self) -> NaiveDate {
        let date = self.start.date();
        if self.start.time().hour() < DAY_CUTOFF_HOUR {
            date.checked_sub_days(Days::new(1)).unwrap_or(date)
        } else {
            date
        }
    }

    /// Whether two quests conflict in time.
    ///
    /// Spans at different places are kept apart by
    /// [`INTER_QUEST_BUFFER_MIN`]: two such quests conflict whenever the
    /// gap between them is shorter than the buffer. Quests at the same
    /// place, or where either has no place, compare unpadded.
    pub fn overlaps(&self, other: &Quest) -> bool {
        let buffer = match (&self.place_id, &other.place_id) {
            (Some(a), Some(b)) if a != b => chrono::Duration::minutes(INTER_QUEST_BUFFER_MIN),
            _ => chrono::Duration::zero(),
        };
        self.start - buffer < other.end && other.start < self.end + buffer
    }

    /// Minute-of-day span `[start, end)` of this quest.
    ///
    /// Spans crossing midnight are clamped to 23:59, a preserved
    /// approximation of the original system, not a bug to fix silently.
    pub fn minute_of_day_span(&self) -> (i64, i64) {
        let start_min = i64::from(self.start.time().hour()) * 60 + i64::from(self.start.time().minute());
        let end_min = if self.end.date() > self.start.date() {
            23 * 60 + 59
        } else {
            i64::from(self.end.time().hour()) * 60 + i64::from(self.end.time().minute())
        };
        (start_min, end_min)
    }

    /// Cuts this quest into chunks of at most `chunk_minutes` minutes.
    ///
    /// Chunks are named `"{name} #{i}"` and share the parent's id, types,
    /// place, show, needed count and locked volunteers. Intended for
    /// ingestion adapters handling quests whose types are all splittable;
    /// the core never splits on its own. A quest no longer than one chunk
    /// is returned whole (with its original name).
    pub fn split(&self, chunk_minutes: i64) -> Vec<Quest> {
        assert!(chunk_minutes > 0, "chunk length must be positive");
        if self.duration_minutes() <= chunk_minutes {
            return vec![self.clone()];
        }
        let step = chrono::Duration::minutes(chunk_minutes);
        let mut chunks = Vec::new();
        let mut chunk_start = self.start;
        let mut i = 0;
        while chunk_start < self.end {
            let chunk_end = (chunk_start + step).min(self.end);
            i += 1;
            let mut chunk = self.clone();
            chunk.name = format!("{} #{}", self.name, i);
            chunk.start = chunk_start;
            chunk.end = chunk_end;
            chunk.linked_quests = Vec::new();
            chunks.push(chunk);
            chunk_start = chunk_end;
        }
        chunks
    }
}

/// Builds a `NaiveDateTime` from date plus hour/minute, for tests and
/// adapters.
pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn quest(name: &str, start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Quest {
        Quest::new(
            name,
            name,
            1,
            at(day(), start_h, start_m),
            at(day(), end_h, end_m),
        )
    }

    #[test]
    #[should_panic(expected = "must end after")]
    fn test_end_before_start_rejected() {
        let _ = quest("bad", 10, 0, 9, 0);
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(quest("q", 10, 0, 12, 30).duration_minutes(), 150);
    }

    #[test]
    fn test_day_bucket_cutoff() {
        // 04:59 belongs to the previous event day; 05:00 to its own.
        let before = quest("night", 4, 59, 6, 0);
        let after = quest("morning", 5, 0, 6, 0);
        assert_eq!(before.day(), day().pred_opt().unwrap());
        assert_eq!(after.day(), day());
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = quest("a", 10, 0, 12, 0);
        let b = quest("b", 11, 0, 13, 0);
        let c = quest("c", 14, 0, 15, 0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert_eq!(a.overlaps(&c), c.overlaps(&a));
    }

    #[test]
    fn test_same_place_back_to_back_do_not_overlap() {
        let a = quest("a", 10, 0, 12, 0).with_place("p1");
        let b = quest("b", 12, 0, 14, 0).with_place("p1");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_different_places_respect_travel_buffer() {
        let a = quest("a", 10, 0, 12, 0).with_place("p1");
        // 10-minute gap, different place: inside the buffer → conflict.
        let close = quest("b", 12, 10, 14, 0).with_place("p2");
        assert!(a.overlaps(&close));
        assert!(close.overlaps(&a));
        // 15-minute gap: exactly the buffer → no conflict.
        let apart = quest("c", 12, 15, 14, 0).with_place("p2");
        assert!(!a.overlaps(&apart));
        assert!(!apart.overlaps(&a));
    }

    #[test]
    fn test_no_place_means_no_buffer() {
        let a = quest("a", 10, 0, 12, 0).with_place("p1");
        let b = quest("b", 12, 5, 14, 0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_minute_of_day_span_clamps_midnight() {
        let plain = quest("q", 10, 0, 12, 30);
        assert_eq!(plain.minute_of_day_span(), (600, 750));

        let overnight = Quest::new(
            "n",
            "n",
            1,
            at(day(), 22, 0),
            at(day().succ_opt().unwrap(), 2, 0),
        );
        assert_eq!(overnight.minute_of_day_span(), (1320, 1439));
    }

    #[test]
    fn test_split_into_chunks() {
        let long = quest("watch", 10, 0, 15, 0).with_place("p1").with_type("qt");
        let chunks = long.split(DEFAULT_SPLIT_MINUTES);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].name, "watch #1");
        assert_eq!(chunks[0].start, at(day(), 10, 0));
        assert_eq!(chunks[0].end, at(day(), 12, 0));
        // Last chunk truncated to the quest end.
        assert_eq!(chunks[2].start, at(day(), 14, 0));
        assert_eq!(chunks[2].end, at(day(), 15, 0));
        // Chunks keep id, place and types.
        assert!(chunks.iter().all(|c| c.id == "watch" && c.place_id.as_deref() == Some("p1")));
    }

    #[test]
    fn test_split_short_quest_returned_whole() {
        let short = quest("short", 10, 0, 11, 0);
        let chunks = short.split(DEFAULT_SPLIT_MINUTES);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].name, "short");
    }
}
