// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// A distance cache owned by the caller for the length of one analysis session.
//
// Entries are keyed by metric, cutoff and the exact ordered list of sequences,
// so a hit returns edges whose indices refer to the same positions.

use crate::engine::{DistanceEdge, DistanceEngine};
use crate::error::DistanceError;
use fxhash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    metric: String,
    cutoff: u32,
    n: usize,
    fingerprint: u64,
}

#[derive(Debug)]
struct CachedEdges {
    sequences: Vec<Vec<u8>>,
    edges: Arc<Vec<DistanceEdge>>,
}

#[derive(Debug, Default)]
pub struct DistanceCache {
    entries: FxHashMap<CacheKey, Vec<CachedEdges>>,
    hits: usize,
    misses: usize,
}

fn key<S: AsRef<[u8]>>(engine: &DistanceEngine, seqs: &[S]) -> CacheKey {
    let mut h = FxHasher::default();
    for s in seqs {
        s.as_ref().hash(&mut h);
    }
    CacheKey {
        metric: engine.metric().name(),
        cutoff: engine.cutoff(),
        n: seqs.len(),
        fingerprint: h.finish(),
    }
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the edges previously stored for this engine setting and sequence list.
    pub fn get<S: AsRef<[u8]>>(
        &mut self,
        engine: &DistanceEngine,
        seqs: &[S],
    ) -> Option<Arc<Vec<DistanceEdge>>> {
        let found = self.entries.get(&key(engine, seqs)).and_then(|bin| {
            bin.iter()
                .find(|c| {
                    c.sequences
                        .iter()
                        .zip(seqs)
                        .all(|(x, y)| x.as_slice() == y.as_ref())
                })
                .map(|c| Arc::clone(&c.edges))
        });
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert<S: AsRef<[u8]>>(
        &mut self,
        engine: &DistanceEngine,
        seqs: &[S],
        edges: Arc<Vec<DistanceEdge>>,
    ) {
        let bin = self.entries.entry(key(engine, seqs)).or_default();
        let sequences: Vec<Vec<u8>> = seqs.iter().map(|s| s.as_ref().to_vec()).collect();
        if !bin.iter().any(|c| c.sequences == sequences) {
            bin.push(CachedEdges { sequences, edges });
        }
    }

    /// Look up the edges, computing and storing them on a miss.
    pub fn compute<S: AsRef<[u8]> + Sync>(
        &mut self,
        engine: &DistanceEngine,
        seqs: &[S],
    ) -> Result<Arc<Vec<DistanceEdge>>, DistanceError> {
        if let Some(edges) = self.get(engine, seqs) {
            return Ok(edges);
        }
        let edges = Arc::new(engine.compute(seqs)?);
        self.insert(engine, seqs, Arc::clone(&edges));
        Ok(edges)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Number of stored edge sets.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricSpec;

    #[test]
    fn test_cache_hit_and_miss() {
        let mut cache = DistanceCache::new();
        let lev1 = DistanceEngine::new(&MetricSpec::Levenshtein, 1).unwrap();
        let lev2 = DistanceEngine::new(&MetricSpec::Levenshtein, 2).unwrap();
        let seqs = ["CASSL", "CASSI", "CASRI"];

        let first = cache.compute(&lev1, &seqs).unwrap();
        let second = cache.compute(&lev1, &seqs).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        let wider = cache.compute(&lev2, &seqs).unwrap();
        assert_eq!(wider.len(), 3);
        assert_eq!(first.len(), 2);

        // Same multiset in another order is a different catalog.
        let reordered = ["CASSI", "CASSL", "CASRI"];
        assert!(cache.get(&lev1, &reordered).is_none());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
