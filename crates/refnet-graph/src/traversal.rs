use crate::ReferralGraph;
use refnet_core::CandidateId;

/// Depth-first walk over a candidate's strict descendants.
///
/// The forest invariant makes a visited set unnecessary: no node can be
/// reached twice.
pub struct DescendantsIter<'a> {
    graph: &'a ReferralGraph,
    stack: Vec<&'a CandidateId>,
}

impl<'a> DescendantsIter<'a> {
    pub(crate) fn new(graph: &'a ReferralGraph, start: &CandidateId) -> Self {
        let stack = graph
            .children_set(start)
            .map(|children| children.iter().rev().collect())
            .unwrap_or_default();
        Self { graph, stack }
    }
}

impl<'a> Iterator for DescendantsIter<'a> {
    type Item = &'a CandidateId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(children) = self.graph.children_set(current) {
            // Reversed so ascending ids pop first, keeping the order stable.
            self.stack.extend(children.iter().rev());
        }
        Some(current)
    }
}

/// Walk up the referrer chain, from direct referrer to root.
pub struct AncestorsIter<'a> {
    graph: &'a ReferralGraph,
    current: Option<&'a CandidateId>,
}

impl<'a> AncestorsIter<'a> {
    pub(crate) fn new(graph: &'a ReferralGraph, start: &CandidateId) -> Self {
        Self {
            graph,
            current: graph.referrer_of(start),
        }
    }
}

impl<'a> Iterator for AncestorsIter<'a> {
    type Item = &'a CandidateId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = self.graph.referrer_of(current);
        Some(current)
    }
}

impl ReferralGraph {
    /// Depth-first iterator over strict descendants of `start`.
    pub fn descendants(&self, start: &CandidateId) -> DescendantsIter<'_> {
        DescendantsIter::new(self, start)
    }

    /// Iterator over the referrer chain of `start`, nearest first.
    pub fn ancestors(&self, start: &CandidateId) -> AncestorsIter<'_> {
        AncestorsIter::new(self, start)
    }
}
