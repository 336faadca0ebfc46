use crate::CandidateId;

/// Read-only view of a referral network.
///
/// The analysis components hold a shared reference through this trait and
/// never mutate the underlying graph; the network is built fully before any
/// view is handed out.
pub trait NetworkView {
    fn contains(&self, candidate: &CandidateId) -> bool;

    /// Direct referrer, if the candidate has one. Absence means root.
    fn referrer_of(&self, candidate: &CandidateId) -> Option<&CandidateId>;

    /// Candidates whose referrer is exactly `candidate`, in ascending order.
    fn direct_referrals_of(&self, candidate: &CandidateId) -> Vec<CandidateId>;

    /// Every id observed so far, as referrer or candidate, in ascending order.
    fn all_candidates(&self) -> Vec<CandidateId>;

    /// Candidates with no referrer (direct signups).
    fn roots(&self) -> Vec<CandidateId>;

    fn candidate_count(&self) -> usize;

    /// Number of strict descendants reachable along referral edges.
    fn subtree_size(&self, candidate: &CandidateId) -> usize;
}
