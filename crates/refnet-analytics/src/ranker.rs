use refnet_core::{CandidateId, NetworkView};
use serde::Serialize;
use std::cmp::Ordering;

/// One row of a ranked influence listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    pub candidate: CandidateId,
    pub score: u64,
}

/// Influence scores computed over a read-only network view.
///
/// All methods are pure reads; the view is immutable for the lifetime of the
/// ranker, so repeated queries hit the graph's subtree memo.
pub struct InfluenceRanker<'a, G: NetworkView> {
    network: &'a G,
}

impl<'a, G: NetworkView> InfluenceRanker<'a, G> {
    pub fn new(network: &'a G) -> Self {
        Self { network }
    }

    /// Total candidates reachable by following referral edges downward,
    /// direct and indirect.
    pub fn reach_of(&self, candidate: &CandidateId) -> u64 {
        self.network.subtree_size(candidate) as u64
    }

    /// Count of unordered (inside, outside) pairs whose unique referral path
    /// crosses `candidate`: in a forest this is reach * (N - 1 - reach).
    ///
    /// A lone root and a leaf both score zero.
    pub fn flow_centrality_of(&self, candidate: &CandidateId) -> u64 {
        let n = self.network.candidate_count() as u64;
        if n == 0 {
            return 0;
        }
        let reach = self.reach_of(candidate);
        reach * (n - 1).saturating_sub(reach)
    }

    /// The k candidates with highest reach, descending; ties broken by
    /// ascending candidate id.
    pub fn top_k_by_reach(&self, k: usize) -> Vec<RankedCandidate> {
        self.ranked(k, |id| self.reach_of(id))
    }

    /// Same ranking discipline as reach, scored by flow centrality.
    pub fn top_k_by_flow_centrality(&self, k: usize) -> Vec<RankedCandidate> {
        self.ranked(k, |id| self.flow_centrality_of(id))
    }

    fn ranked<F>(&self, k: usize, score_of: F) -> Vec<RankedCandidate>
    where
        F: Fn(&CandidateId) -> u64,
    {
        let mut rows: Vec<RankedCandidate> = self
            .network
            .all_candidates()
            .into_iter()
            .map(|candidate| {
                let score = score_of(&candidate);
                RankedCandidate { candidate, score }
            })
            .collect();
        rows.sort_by(|a, b| match b.score.cmp(&a.score) {
            Ordering::Equal => a.candidate.cmp(&b.candidate),
            unequal => unequal,
        });
        rows.truncate(k);
        rows
    }
}
