//! Union-Find with payload merge.
//!
//! Generic disjoint-set structure over dense indices, where every set
//! carries a mergeable payload. Used to cluster linked quests into groups
//! that must be staffed by the same volunteers: each quest starts as a
//! singleton set containing itself, and every declared link merges two
//! sets with a set-union payload merge.
//!
//! Elements are `usize` indices into the caller's entity slice, avoiding
//! ownership cycles between mutually linked entities.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 21 (Disjoint Sets)

/// Disjoint-set forest over `0..len` with a payload per set.
///
/// Uses path compression on `find` and union by rank, so any sequence of
/// operations runs in near-constant amortized time per operation.
///
/// After all unions, `find` returns the same representative for every
/// element of a connected component, and that representative's payload is
/// the merge of all original member payloads (in some merge order; the
/// merge function should be associative and commutative).
#[derive(Debug, Clone)]
pub struct UnionFind<P> {
    parent: Vec<usize>,
    rank: Vec<u32>,
    /// Payload storage; only root slots are populated.
    payload: Vec<Option<P>>,
}

impl<P> UnionFind<P> {
    /// Creates a forest of singletons, one per payload, rank 0.
    pub fn new(payloads: Vec<P>) -> Self {
        let n = payloads.len();
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            payload: payloads.into_iter().map(Some).collect(),
        }
    }

    /// Number of elements (not sets).
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Returns the representative of `x`'s set, compressing the path.
    ///
    /// # Panics
    /// Panics if `x >= self.len()`.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Second pass: rewrite every visited node's parent to the root.
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merges the sets containing `x` and `y`.
    ///
    /// If they are already the same set this is a no-op. Otherwise the
    /// lower-rank root is attached under the higher-rank root (ties pick
    /// the second root and bump its rank) and the surviving root's payload
    /// becomes `merge(payload_x, payload_y)`.
    pub fn union(&mut self, x: usize, y: usize, merge: impl FnOnce(P, P) -> P) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        let (winner, loser) = if self.rank[rx] > self.rank[ry] {
            (rx, ry)
        } else {
            if self.rank[rx] == self.rank[ry] {
                self.rank[ry] += 1;
            }
            (ry, rx)
        };
        self.parent[loser] = winner;
        let a = self.payload[winner].take().expect("root payload present");
        let b = self.payload[loser].take().expect("root payload present");
        self.payload[winner] = Some(merge(a, b));
    }

    /// Payload of the set containing `x`.
    pub fn payload(&mut self, x: usize) -> &P {
        let root = self.find(x);
        self.payload[root].as_ref().expect("root payload present")
    }

    /// Iterates over the current roots and their payloads.
    pub fn sets(&mut self) -> Vec<(usize, &P)> {
        let roots: Vec<usize> = (0..self.len()).filter(|&i| self.parent[i] == i).collect();
        roots
            .into_iter()
            .map(|r| (r, self.payload[r].as_ref().expect("root payload present")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn singletons(n: usize) -> UnionFind<BTreeSet<usize>> {
        UnionFind::new((0..n).map(|i| BTreeSet::from([i])).collect())
    }

    fn set_union(mut a: BTreeSet<usize>, b: BTreeSet<usize>) -> BTreeSet<usize> {
        a.extend(b);
        a
    }

    #[test]
    fn test_singletons_are_their_own_roots() {
        let mut uf = singletons(4);
        for i in 0..4 {
            assert_eq!(uf.find(i), i);
            assert_eq!(uf.payload(i), &BTreeSet::from([i]));
        }
    }

    #[test]
    fn test_union_merges_payloads() {
        let mut uf = singletons(5);
        uf.union(0, 1, set_union);
        uf.union(3, 4, set_union);
        assert_eq!(uf.find(0), uf.find(1));
        assert_eq!(uf.payload(1), &BTreeSet::from([0, 1]));
        assert_eq!(uf.payload(3), &BTreeSet::from([3, 4]));
        assert_eq!(uf.payload(2), &BTreeSet::from([2]));
    }

    #[test]
    fn test_component_payload_is_order_independent() {
        // Same links applied in different orders must yield the same
        // membership payloads.
        let links = [(0, 1), (2, 3), (1, 2), (4, 5)];
        let mut forward = singletons(6);
        for &(a, b) in &links {
            forward.union(a, b, set_union);
        }
        let mut backward = singletons(6);
        for &(a, b) in links.iter().rev() {
            backward.union(b, a, set_union);
        }
        for i in 0..6 {
            assert_eq!(forward.payload(i), backward.payload(i));
        }
        assert_eq!(forward.payload(0), &BTreeSet::from([0, 1, 2, 3]));
        assert_eq!(forward.payload(4), &BTreeSet::from([4, 5]));
    }

    #[test]
    fn test_find_is_idempotent_after_unions() {
        let mut uf = singletons(4);
        uf.union(0, 1, set_union);
        uf.union(1, 2, set_union);
        let root = uf.find(0);
        assert_eq!(uf.find(0), root);
        assert_eq!(uf.find(1), root);
        assert_eq!(uf.find(2), root);
        assert_ne!(uf.find(3), root);
    }

    #[test]
    fn test_redundant_union_is_noop() {
        let mut uf = singletons(3);
        uf.union(0, 1, set_union);
        uf.union(1, 0, set_union);
        uf.union(0, 0, set_union);
        assert_eq!(uf.payload(0), &BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_sets_enumeration() {
        let mut uf = singletons(4);
        uf.union(0, 3, set_union);
        let sets = uf.sets();
        assert_eq!(sets.len(), 3);
        let members: Vec<&BTreeSet<usize>> = sets.iter().map(|(_, p)| *p).collect();
        assert!(members.contains(&&BTreeSet::from([0, 3])));
    }
}
