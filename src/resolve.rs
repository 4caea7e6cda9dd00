//! One-shot reference resolution ("strengthen").
//!
//! Ingestion leaves cross-references as raw id strings. This pass runs
//! exactly once, after every entity exists and before the constraint
//! builder: it verifies each id against the owning repository, collapses
//! the references to their resolved form, back-fills the volunteers'
//! fixed-quest lists, and clusters linked quests into groups via
//! [`crate::grouping::UnionFind`].
//!
//! Unknown ids are lookup misses: non-fatal ingestion errors, dropped
//! from the resolved lists and reported per record. Running the pass a
//! second time is safe but wasteful; it short-circuits on an already
//! resolved event.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::grouping::UnionFind;
use crate::models::{resolve_list, Event};

/// Which reference list a lookup miss was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefList {
    ForbiddenCoworkers,
    ForbiddenPlaces,
    ForbiddenTypes,
    Specialties,
    FixedVolunteers,
    LinkedQuests,
}

impl std::fmt::Display for RefList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ForbiddenCoworkers => "forbidden co-workers",
            Self::ForbiddenPlaces => "forbidden places",
            Self::ForbiddenTypes => "forbidden quest types",
            Self::Specialties => "specialties",
            Self::FixedVolunteers => "fixed volunteers",
            Self::LinkedQuests => "linked quests",
        };
        f.write_str(label)
    }
}

/// An id that resolved to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMiss {
    /// Id of the entity owning the dangling reference.
    pub owner_id: String,
    /// The list the dangling id sat in.
    pub list: RefList,
    /// The id that matched no registered entity.
    pub missing_id: String,
}

/// Outcome of the strengthen pass.
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    /// Per-record lookup misses (ingestion errors, non-fatal).
    pub misses: Vec<LookupMiss>,
    /// Number of linked-quest groups with at least two members.
    pub groups_built: usize,
}

impl ResolveReport {
    /// Whether every reference resolved.
    pub fn is_clean(&self) -> bool {
        self.misses.is_empty()
    }
}

/// Resolves every cross-reference in the event, exactly once.
///
/// Returns the lookup misses and group count. Calling this on an already
/// resolved event is a no-op.
pub fn strengthen(event: &mut Event) -> ResolveReport {
    if event.is_resolved() {
        debug!("strengthen called on an already resolved event; skipping");
        return ResolveReport::default();
    }

    let mut report = ResolveReport::default();

    let volunteer_ids: BTreeSet<String> =
        event.volunteers().iter().map(|v| v.id.clone()).collect();
    let place_ids: BTreeSet<String> = event.places().map(|p| p.id.clone()).collect();
    let type_ids: BTreeSet<String> = event.quest_types().map(|t| t.id.clone()).collect();
    let quest_ids: BTreeSet<String> = event.quests().iter().map(|q| q.id.clone()).collect();

    for volunteer in event.volunteers_mut() {
        let owner = volunteer.id.clone();
        for (list, refs, known) in [
            (
                RefList::ForbiddenCoworkers,
                &mut volunteer.forbidden_coworkers,
                &volunteer_ids,
            ),
            (
                RefList::ForbiddenPlaces,
                &mut volunteer.forbidden_places,
                &place_ids,
            ),
            (
                RefList::ForbiddenTypes,
                &mut volunteer.forbidden_types,
                &type_ids,
            ),
            (RefList::Specialties, &mut volunteer.specialties, &type_ids),
        ] {
            for missing_id in resolve_list(refs, |id| known.contains(id)) {
                warn!(owner = %owner, %list, id = %missing_id, "dropping unresolved reference");
                report.misses.push(LookupMiss {
                    owner_id: owner.clone(),
                    list,
                    missing_id,
                });
            }
        }
    }

    let mut fixed_by_volunteer: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut linked_ids_per_quest: Vec<Vec<String>> = Vec::new();
    for (idx, quest) in event.quests_mut().iter_mut().enumerate() {
        let owner = quest.id.clone();
        for missing_id in resolve_list(&mut quest.fixed_volunteers, |id| {
            volunteer_ids.contains(id)
        }) {
            warn!(owner = %owner, list = %RefList::FixedVolunteers, id = %missing_id, "dropping unresolved reference");
            report.misses.push(LookupMiss {
                owner_id: owner.clone(),
                list: RefList::FixedVolunteers,
                missing_id,
            });
        }
        for missing_id in resolve_list(&mut quest.linked_quests, |id| quest_ids.contains(id)) {
            warn!(owner = %owner, list = %RefList::LinkedQuests, id = %missing_id, "dropping unresolved reference");
            report.misses.push(LookupMiss {
                owner_id: owner.clone(),
                list: RefList::LinkedQuests,
                missing_id,
            });
        }
        for vid in quest.fixed_volunteers.iter().filter_map(|r| r.resolved_id()) {
            fixed_by_volunteer
                .entry(vid.to_string())
                .or_default()
                .push(idx);
        }
        linked_ids_per_quest.push(
            quest
                .linked_quests
                .iter()
                .filter_map(|r| r.resolved_id().map(str::to_string))
                .collect(),
        );
    }

    for volunteer in event.volunteers_mut() {
        if let Some(indices) = fixed_by_volunteer.get(&volunteer.id) {
            volunteer.fixed_quests = indices.clone();
        }
    }

    // Linked-quest grouping: links are symmetric, so one declared edge is
    // enough to merge both sides. Links address ids, and split sub-quests
    // share their parent id, so one link may merge several indices.
    let n = event.quests().len();
    let mut groups: UnionFind<BTreeSet<usize>> =
        UnionFind::new((0..n).map(|i| BTreeSet::from([i])).collect());
    for (idx, linked_ids) in linked_ids_per_quest.iter().enumerate() {
        for target_id in linked_ids {
            for &target_idx in event.quest_indices_by_id(target_id) {
                groups.union(idx, target_idx, |mut a, b| {
                    a.extend(b);
                    a
                });
            }
        }
    }
    let multi_member: Vec<BTreeSet<usize>> = groups
        .sets()
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(_, members)| members.clone())
        .collect();
    report.groups_built = multi_member.len();
    debug!(
        groups = report.groups_built,
        misses = report.misses.len(),
        "event strengthened"
    );
    event.set_quest_groups(multi_member);
    event.mark_resolved();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{at, EntityRef, Place, Quest, QuestType, Volunteer};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()
    }

    fn sample_event() -> Event {
        let mut event = Event::new();
        event.add_place(Place::new("p1", "Gate"));
        event.add_quest_type(QuestType::new("qt1", "Bar"));
        event.add_volunteer(
            Volunteer::new("ana", "Ana")
                .with_forbidden_coworker("bob")
                .with_forbidden_coworker("ghost")
                .with_forbidden_place("p1")
                .with_specialty("qt1"),
        );
        event.add_volunteer(Volunteer::new("bob", "Bob"));
        event.add_quest(
            Quest::new("q1", "Open", 1, at(day(), 10, 0), at(day(), 12, 0))
                .with_fixed_volunteer("ana")
                .with_linked_quest("q2"),
        );
        event.add_quest(Quest::new("q2", "Close", 1, at(day(), 12, 0), at(day(), 14, 0)));
        event.add_quest(Quest::new("q3", "Solo", 1, at(day(), 15, 0), at(day(), 16, 0)));
        event
    }

    #[test]
    fn test_strengthen_resolves_and_reports_misses() {
        let mut event = sample_event();
        let report = strengthen(&mut event);

        assert!(event.is_resolved());
        assert_eq!(report.misses.len(), 1);
        assert_eq!(report.misses[0].missing_id, "ghost");
        assert_eq!(report.misses[0].list, RefList::ForbiddenCoworkers);

        let ana = event.volunteer_by_id("ana").unwrap();
        assert_eq!(ana.forbidden_coworkers, vec![EntityRef::Resolved("bob".into())]);
        assert!(ana.forbids_place("p1"));
        assert!(ana.has_specialty("qt1"));
        assert_eq!(ana.fixed_quests, vec![0]);
    }

    #[test]
    fn test_strengthen_builds_symmetric_groups() {
        let mut event = sample_event();
        let report = strengthen(&mut event);

        assert_eq!(report.groups_built, 1);
        let groups = event.quest_groups();
        assert_eq!(groups.len(), 1);
        // q1 listed q2; both land in one group, q3 stays out.
        assert_eq!(groups[0], std::collections::BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_strengthen_is_idempotent() {
        let mut event = sample_event();
        let first = strengthen(&mut event);
        let second = strengthen(&mut event);
        assert!(!first.is_clean());
        assert!(second.is_clean());
        assert_eq!(second.groups_built, 0);
        assert_eq!(event.quest_groups().len(), 1);
    }
}
