//! Cross-entity references.
//!
//! Ingestion adapters collect raw identifier strings before the entities
//! they point at necessarily exist. A reference therefore starts
//! `Unresolved` and is collapsed to `Resolved` by the one-shot
//! [`crate::resolve::strengthen`] pass, which verifies the id against the
//! owning [`crate::models::Event`] repository. The constraint-model
//! builder only ever observes `Resolved` references (enforced by a
//! precondition check).

use serde::{Deserialize, Serialize};

/// A by-id reference to another entity, resolved or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    /// Raw identifier as ingested; not yet checked against a repository.
    Unresolved(String),
    /// Identifier verified to exist in the corresponding repository.
    Resolved(String),
}

impl EntityRef {
    /// Creates an unresolved reference from a raw id.
    pub fn raw(id: impl Into<String>) -> Self {
        Self::Unresolved(id.into())
    }

    /// The referenced id, resolved or not.
    pub fn id(&self) -> &str {
        match self {
            Self::Unresolved(id) | Self::Resolved(id) => id,
        }
    }

    /// Whether this reference has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The id, but only if resolved.
    pub fn resolved_id(&self) -> Option<&str> {
        match self {
            Self::Resolved(id) => Some(id),
            Self::Unresolved(_) => None,
        }
    }
}

/// Resolves a list of references in place against a membership predicate.
///
/// Known ids become `Resolved`; unknown ids are dropped from the list and
/// returned so the caller can report the lookup misses. Misses are
/// non-fatal: one bad reference never sinks the whole event.
pub fn resolve_list(refs: &mut Vec<EntityRef>, exists: impl Fn(&str) -> bool) -> Vec<String> {
    let mut misses = Vec::new();
    refs.retain_mut(|r| {
        if r.is_resolved() {
            return true;
        }
        let id = r.id().to_string();
        if exists(&id) {
            *r = EntityRef::Resolved(id);
            true
        } else {
            misses.push(id);
            false
        }
    });
    misses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_is_unresolved() {
        let r = EntityRef::raw("v1");
        assert!(!r.is_resolved());
        assert_eq!(r.id(), "v1");
        assert_eq!(r.resolved_id(), None);
    }

    #[test]
    fn test_resolve_list_keeps_known_drops_unknown() {
        let mut refs = vec![EntityRef::raw("a"), EntityRef::raw("ghost"), EntityRef::raw("b")];
        let misses = resolve_list(&mut refs, |id| id == "a" || id == "b");
        assert_eq!(misses, vec!["ghost".to_string()]);
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(EntityRef::is_resolved));
    }

    #[test]
    fn test_resolve_list_is_idempotent() {
        let mut refs = vec![EntityRef::raw("a")];
        assert!(resolve_list(&mut refs, |id| id == "a").is_empty());
        assert!(resolve_list(&mut refs, |_| false).is_empty());
        assert_eq!(refs[0], EntityRef::Resolved("a".into()));
    }
}
