use dashmap::DashMap;
use refnet_core::CandidateId;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Memoized subtree size, stamped with the graph generation it was computed at.
#[derive(Debug, Clone)]
struct CacheEntry {
    size: usize,
    generation: u64,
}

/// Lazily invalidated memo for subtree sizes.
///
/// Every mutation bumps the generation; entries stamped with an older
/// generation are treated as absent and overwritten on the next lookup.
#[derive(Debug, Default)]
pub(crate) struct ReachCache {
    entries: DashMap<CandidateId, CacheEntry>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReachCache {
    pub(crate) fn get(&self, key: &CandidateId) -> Option<usize> {
        let generation = self.generation.load(Ordering::Acquire);
        match self.entries.get(key) {
            Some(entry) if entry.generation == generation => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.size)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub(crate) fn insert(&self, key: CandidateId, size: usize) {
        let generation = self.generation.load(Ordering::Acquire);
        self.entries.insert(key, CacheEntry { size, generation });
    }

    pub(crate) fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Counters for the subtree-size memo.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
