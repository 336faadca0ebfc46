use crate::cache::{CacheStats, ReachCache};
use refnet_core::{CandidateId, NetworkView, RefNetError, ReferralEdge, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Forest of referrer -> candidate relationships.
///
/// Each candidate has at most one referrer, immutable once set, and the
/// relation stays acyclic: every node has a finite referrer chain ending at a
/// root. A rejected insertion leaves the maps untouched.
#[derive(Debug, Default)]
pub struct ReferralGraph {
    referrer_of: FxHashMap<CandidateId, CandidateId>,
    children_of: FxHashMap<CandidateId, BTreeSet<CandidateId>>,
    candidates: BTreeSet<CandidateId>,
    reach: ReachCache,
}

impl ReferralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `referrer` directly referred `candidate`.
    ///
    /// The cycle check walks the referrer chain upward from `referrer`. The
    /// walk is O(depth) per insertion and is never skipped: a long chain is
    /// exactly the input where a missed cycle would corrupt every downstream
    /// traversal.
    pub fn add_referral(
        &mut self,
        referrer: impl Into<CandidateId>,
        candidate: impl Into<CandidateId>,
    ) -> Result<()> {
        let referrer = referrer.into();
        let candidate = candidate.into();

        if referrer == candidate {
            return Err(RefNetError::SelfReferral { candidate });
        }
        if let Some(existing) = self.referrer_of.get(&candidate) {
            return Err(RefNetError::AlreadyReferred {
                candidate,
                referrer: existing.clone(),
            });
        }
        // Would the edge make `candidate` its own ancestor?
        let mut current = &referrer;
        while let Some(parent) = self.referrer_of.get(current) {
            if *parent == candidate {
                return Err(RefNetError::Cycle {
                    referrer,
                    candidate,
                });
            }
            current = parent;
        }

        self.referrer_of
            .insert(candidate.clone(), referrer.clone());
        self.children_of
            .entry(referrer.clone())
            .or_default()
            .insert(candidate.clone());
        self.candidates.insert(referrer.clone());
        self.candidates.insert(candidate.clone());
        self.reach.invalidate_all();
        debug!(%referrer, %candidate, "referral recorded");
        Ok(())
    }

    /// Direct referrer, if the candidate has one. Absence means root.
    pub fn referrer_of(&self, candidate: &CandidateId) -> Option<&CandidateId> {
        self.referrer_of.get(candidate)
    }

    /// Candidates whose referrer is exactly `candidate`, ascending.
    pub fn direct_referrals_of(&self, candidate: &CandidateId) -> Vec<CandidateId> {
        self.children_of
            .get(candidate)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every strict descendant, direct and indirect, in depth-first order.
    pub fn all_referrals_of(&self, candidate: &CandidateId) -> Vec<CandidateId> {
        self.descendants(candidate).cloned().collect()
    }

    /// True when `ancestor` appears on the referrer chain starting at
    /// `descendant` (excluding `descendant` itself).
    pub fn is_ancestor(&self, ancestor: &CandidateId, descendant: &CandidateId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Referrer chain from the direct referrer up to the root.
    pub fn ancestors_of(&self, candidate: &CandidateId) -> Vec<CandidateId> {
        self.ancestors(candidate).cloned().collect()
    }

    /// Every id observed so far, as referrer or candidate, ascending.
    pub fn all_candidates(&self) -> Vec<CandidateId> {
        self.candidates.iter().cloned().collect()
    }

    /// Candidates with no referrer (direct signups).
    pub fn roots(&self) -> Vec<CandidateId> {
        self.candidates
            .iter()
            .filter(|id| !self.referrer_of.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn contains(&self, candidate: &CandidateId) -> bool {
        self.candidates.contains(candidate)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// All edges, ordered by candidate id.
    pub fn edges(&self) -> Vec<ReferralEdge> {
        self.candidates
            .iter()
            .filter_map(|candidate| {
                self.referrer_of
                    .get(candidate)
                    .map(|referrer| ReferralEdge::new(referrer.clone(), candidate.clone()))
            })
            .collect()
    }

    /// Number of strict descendants. Memoized; every mutation invalidates the
    /// memo and the size is recomputed lazily on the next query.
    pub fn subtree_size(&self, candidate: &CandidateId) -> usize {
        if let Some(size) = self.reach.get(candidate) {
            return size;
        }
        let size = self.descendants(candidate).count();
        self.reach.insert(candidate.clone(), size);
        size
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.reach.stats()
    }

    pub(crate) fn children_set(&self, candidate: &CandidateId) -> Option<&BTreeSet<CandidateId>> {
        self.children_of.get(candidate)
    }
}

impl Clone for ReferralGraph {
    fn clone(&self) -> Self {
        Self {
            referrer_of: self.referrer_of.clone(),
            children_of: self.children_of.clone(),
            candidates: self.candidates.clone(),
            reach: ReachCache::default(),
        }
    }
}

impl PartialEq for ReferralGraph {
    fn eq(&self, other: &Self) -> bool {
        self.referrer_of == other.referrer_of
            && self.children_of == other.children_of
            && self.candidates == other.candidates
    }
}

impl NetworkView for ReferralGraph {
    fn contains(&self, candidate: &CandidateId) -> bool {
        ReferralGraph::contains(self, candidate)
    }

    fn referrer_of(&self, candidate: &CandidateId) -> Option<&CandidateId> {
        ReferralGraph::referrer_of(self, candidate)
    }

    fn direct_referrals_of(&self, candidate: &CandidateId) -> Vec<CandidateId> {
        ReferralGraph::direct_referrals_of(self, candidate)
    }

    fn all_candidates(&self) -> Vec<CandidateId> {
        ReferralGraph::all_candidates(self)
    }

    fn roots(&self) -> Vec<CandidateId> {
        ReferralGraph::roots(self)
    }

    fn candidate_count(&self) -> usize {
        ReferralGraph::candidate_count(self)
    }

    fn subtree_size(&self, candidate: &CandidateId) -> usize {
        ReferralGraph::subtree_size(self, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CandidateId {
        CandidateId::from(s)
    }

    #[test]
    fn basic_add_records_edge() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        assert_eq!(graph.direct_referrals_of(&id("A")), vec![id("B")]);
        assert_eq!(graph.referrer_of(&id("B")), Some(&id("A")));
        assert_eq!(graph.candidate_count(), 2);
    }

    #[test]
    fn chain_links_each_level() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("B", "C").unwrap();
        graph.add_referral("C", "D").unwrap();
        assert_eq!(graph.direct_referrals_of(&id("A")), vec![id("B")]);
        assert_eq!(graph.direct_referrals_of(&id("B")), vec![id("C")]);
        assert_eq!(graph.direct_referrals_of(&id("C")), vec![id("D")]);
    }

    #[test]
    fn multiple_children_under_one_referrer() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("A", "C").unwrap();
        graph.add_referral("A", "D").unwrap();
        assert_eq!(
            graph.direct_referrals_of(&id("A")),
            vec![id("B"), id("C"), id("D")]
        );
    }

    #[test]
    fn self_referral_rejected() {
        let mut graph = ReferralGraph::new();
        let err = graph.add_referral("A", "A").unwrap_err();
        assert!(matches!(err, RefNetError::SelfReferral { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn second_referrer_rejected() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        let err = graph.add_referral("C", "B").unwrap_err();
        match err {
            RefNetError::AlreadyReferred {
                candidate,
                referrer,
            } => {
                assert_eq!(candidate, id("B"));
                assert_eq!(referrer, id("A"));
            }
            other => panic!("expected AlreadyReferred, got {other:?}"),
        }
    }

    #[test]
    fn direct_cycle_rejected() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        let err = graph.add_referral("B", "A").unwrap_err();
        assert!(matches!(err, RefNetError::Cycle { .. }));
    }

    #[test]
    fn long_cycle_rejected() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("B", "C").unwrap();
        graph.add_referral("C", "D").unwrap();
        let err = graph.add_referral("D", "A").unwrap_err();
        assert!(matches!(err, RefNetError::Cycle { .. }));
    }

    #[test]
    fn failed_insertion_leaves_graph_unchanged() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        let snapshot = graph.clone();

        assert!(graph.add_referral("B", "A").is_err());
        assert!(graph.add_referral("C", "B").is_err());
        assert!(graph.add_referral("B", "B").is_err());

        assert_eq!(graph, snapshot);
        assert_eq!(graph.direct_referrals_of(&id("B")), Vec::<CandidateId>::new());
    }

    #[test]
    fn cross_tree_edge_merges_forests() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("X", "Y").unwrap();
        graph.add_referral("B", "X").unwrap();
        assert_eq!(
            graph.all_referrals_of(&id("A")),
            vec![id("B"), id("X"), id("Y")]
        );
        assert_eq!(graph.roots(), vec![id("A")]);
    }

    #[test]
    fn ancestor_queries_walk_the_chain() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("B", "C").unwrap();

        assert!(graph.is_ancestor(&id("A"), &id("C")));
        assert!(graph.is_ancestor(&id("B"), &id("C")));
        assert!(!graph.is_ancestor(&id("C"), &id("A")));
        assert!(!graph.is_ancestor(&id("C"), &id("C")));
        assert_eq!(graph.ancestors_of(&id("C")), vec![id("B"), id("A")]);
        assert_eq!(graph.ancestors_of(&id("A")), Vec::<CandidateId>::new());
    }

    #[test]
    fn subtree_size_counts_strict_descendants() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();
        graph.add_referral("A", "C").unwrap();
        graph.add_referral("B", "D").unwrap();

        assert_eq!(graph.subtree_size(&id("A")), 3);
        assert_eq!(graph.subtree_size(&id("B")), 1);
        assert_eq!(graph.subtree_size(&id("C")), 0);
        assert_eq!(graph.subtree_size(&id("unknown")), 0);
    }

    #[test]
    fn subtree_memo_hits_until_mutation() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "B").unwrap();

        assert_eq!(graph.subtree_size(&id("A")), 1);
        let warm = graph.cache_stats();
        assert_eq!(graph.subtree_size(&id("A")), 1);
        assert!(graph.cache_stats().hits > warm.hits);

        graph.add_referral("B", "C").unwrap();
        assert_eq!(graph.subtree_size(&id("A")), 2);
    }

    #[test]
    fn edges_ordered_by_candidate() {
        let mut graph = ReferralGraph::new();
        graph.add_referral("A", "C").unwrap();
        graph.add_referral("A", "B").unwrap();
        let edges = graph.edges();
        assert_eq!(
            edges,
            vec![ReferralEdge::new("A", "B"), ReferralEdge::new("A", "C")]
        );
    }

    #[test]
    fn randomized_insertions_preserve_forest_invariants() {
        fastrand::seed(7);
        let mut graph = ReferralGraph::new();
        let pool: Vec<CandidateId> = (0..64).map(|i| CandidateId::new(format!("c{i}"))).collect();

        for _ in 0..2_000 {
            let referrer = pool[fastrand::usize(..pool.len())].clone();
            let candidate = pool[fastrand::usize(..pool.len())].clone();
            let _ = graph.add_referral(referrer, candidate);
        }

        for candidate in graph.all_candidates() {
            // Finite chain to a root; more hops than nodes would mean a cycle.
            assert!(graph.ancestors_of(&candidate).len() < graph.candidate_count());
            for child in graph.direct_referrals_of(&candidate) {
                assert_eq!(graph.referrer_of(&child), Some(&candidate));
            }
        }
    }
}
