// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Sparse pairwise distances over a list of unique junctions.
//
// Sequences are grouped into buckets of equal length.  Two buckets are compared
// only if their length difference fits the metric's length window.  Each bucket
// pair is cut into blocks of at most block_size rows, and blocks are evaluated
// independently on the rayon pool, each into its own edge vector.  The vectors
// are concatenated and sorted once all blocks are done.

use crate::error::DistanceError;
use crate::metric::{Composition, JunctionMetric, MetricSpec};
use itertools::Itertools;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Distance between entries i and j of a sequence list, with i < j.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DistanceEdge {
    pub i: u32,
    pub j: u32,
    pub distance: u32,
}

impl DistanceEdge {
    /// Create an edge, ordering the endpoints.
    pub fn new(a: u32, b: u32, distance: u32) -> Self {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        DistanceEdge { i, j, distance }
    }
}

pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Sequences of one length, by ascending index.
struct LengthBucket {
    len: usize,
    members: Vec<u32>,
}

/// Rows start..end of bucket `row`, compared against all of bucket `col`.
/// When row == col only pairs above the diagonal are visited.
#[derive(Debug, Clone, Copy)]
struct Block {
    row: usize,
    col: usize,
    start: usize,
    end: usize,
}

pub struct DistanceEngine {
    metric: Box<dyn JunctionMetric>,
    cutoff: u32,
    block_size: usize,
    pair_ceiling: Option<u64>,
}

impl DistanceEngine {
    /// Create an engine for one of the built-in metrics.  The identity metric
    /// always runs with cutoff 0.
    pub fn new(spec: &MetricSpec, cutoff: i64) -> Result<Self, DistanceError> {
        spec.validate()?;
        let mut engine = Self::with_metric(spec.build(), cutoff)?;
        if *spec == MetricSpec::Identity && engine.cutoff != 0 {
            warn!(
                "the identity metric ignores the cutoff of {}, using 0",
                engine.cutoff
            );
            engine.cutoff = 0;
        }
        Ok(engine)
    }

    /// Create an engine for an externally supplied metric.
    pub fn with_metric(metric: Box<dyn JunctionMetric>, cutoff: i64) -> Result<Self, DistanceError> {
        if cutoff < 0 {
            return Err(DistanceError::NegativeCutoff(cutoff));
        }
        Ok(DistanceEngine {
            metric,
            cutoff: u32::try_from(cutoff).unwrap_or(u32::MAX),
            block_size: DEFAULT_BLOCK_SIZE,
            pair_ceiling: None,
        })
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Refuse to run when more candidate pairs than this would be evaluated.
    pub fn pair_ceiling(mut self, ceiling: Option<u64>) -> Self {
        self.pair_ceiling = ceiling;
        self
    }

    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }

    pub fn metric(&self) -> &dyn JunctionMetric {
        self.metric.as_ref()
    }

    /// Number of candidate pairs left after length pruning.
    pub fn estimate_pairs<S: AsRef<[u8]>>(&self, seqs: &[S]) -> u64 {
        let buckets = length_buckets(seqs);
        self.bucket_pairs(&buckets)
            .map(|(r, c)| {
                let (nr, nc) = (
                    buckets[r].members.len() as u64,
                    buckets[c].members.len() as u64,
                );
                if r == c {
                    nr * nr.saturating_sub(1) / 2
                } else {
                    nr * nc
                }
            })
            .sum()
    }

    /// Fail if the candidate pair count is above the ceiling.  Return the count.
    pub fn check_scale<S: AsRef<[u8]>>(&self, seqs: &[S]) -> Result<u64, DistanceError> {
        let estimated = self.estimate_pairs(seqs);
        match self.pair_ceiling {
            Some(ceiling) if estimated > ceiling => Err(DistanceError::PairCeilingExceeded {
                estimated,
                ceiling,
            }),
            _ => Ok(estimated),
        }
    }

    /// Compute every edge with distance at most the cutoff, sorted by (i, j).
    pub fn compute<S: AsRef<[u8]> + Sync>(
        &self,
        seqs: &[S],
    ) -> Result<Vec<DistanceEdge>, DistanceError> {
        self.check_scale(seqs)?;
        let buckets = length_buckets(seqs);
        let blocks = self.plan_blocks(&buckets);
        debug!(
            "{}: {} sequences in {} length buckets, {} blocks",
            self.metric.name(),
            seqs.len(),
            buckets.len(),
            blocks.len()
        );
        let profiles: Option<Vec<Composition>> = self
            .metric
            .composition_bound()
            .then(|| seqs.iter().map(|s| Composition::of(s.as_ref())).collect());

        let mut edges: Vec<DistanceEdge> = blocks
            .par_iter()
            .map(|block| self.eval_block(block, &buckets, seqs, profiles.as_deref()))
            .flatten_iter()
            .collect();
        edges.par_sort_unstable();
        Ok(edges)
    }

    fn bucket_pairs<'a>(
        &'a self,
        buckets: &'a [LengthBucket],
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        let window = self.metric.length_window(self.cutoff);
        (0..buckets.len()).flat_map(move |r| {
            (r..buckets.len())
                .take_while(move |&c| {
                    window.map_or(true, |w| buckets[c].len - buckets[r].len <= w)
                })
                .map(move |c| (r, c))
        })
    }

    fn plan_blocks(&self, buckets: &[LengthBucket]) -> Vec<Block> {
        self.bucket_pairs(buckets)
            .flat_map(|(row, col)| {
                let n = buckets[row].members.len();
                (0..n)
                    .step_by(self.block_size)
                    .map(move |start| Block {
                        row,
                        col,
                        start,
                        end: (start + self.block_size).min(n),
                    })
                    .collect_vec()
            })
            .collect()
    }

    fn eval_block<S: AsRef<[u8]>>(
        &self,
        block: &Block,
        buckets: &[LengthBucket],
        seqs: &[S],
        profiles: Option<&[Composition]>,
    ) -> Vec<DistanceEdge> {
        let rows = &buckets[block.row].members;
        let cols = &buckets[block.col].members;
        let mut edges = Vec::new();
        for p in block.start..block.end {
            let i = rows[p];
            let first_col = if block.row == block.col { p + 1 } else { 0 };
            for &j in &cols[first_col..] {
                if let Some(profiles) = profiles {
                    let bound = profiles[i as usize].edit_lower_bound(&profiles[j as usize]);
                    if bound > self.cutoff {
                        continue;
                    }
                }
                let (a, b) = (seqs[i as usize].as_ref(), seqs[j as usize].as_ref());
                if let Some(d) = self.metric.distance(a, b, self.cutoff) {
                    edges.push(DistanceEdge::new(i, j, d));
                }
            }
        }
        edges
    }
}

fn length_buckets<S: AsRef<[u8]>>(seqs: &[S]) -> Vec<LengthBucket> {
    let mut by_len = (0..seqs.len() as u32)
        .map(|i| (seqs[i as usize].as_ref().len(), i))
        .collect_vec();
    by_len.sort_unstable();
    by_len
        .into_iter()
        .group_by(|(len, _)| *len)
        .into_iter()
        .map(|(len, group)| LengthBucket {
            len,
            members: group.map(|(_, i)| i).collect(),
        })
        .collect()
}

/// Evaluate every pair without pruning.  Quadratic; meant for validating the
/// engine on small inputs.
pub fn exhaustive_edges<S: AsRef<[u8]>>(
    metric: &dyn JunctionMetric,
    seqs: &[S],
    cutoff: u32,
) -> Vec<DistanceEdge> {
    let mut edges = Vec::new();
    for i in 0..seqs.len() {
        for j in i + 1..seqs.len() {
            if let Some(d) = metric.distance(seqs[i].as_ref(), seqs[j].as_ref(), cutoff) {
                edges.push(DistanceEdge::new(i as u32, j as u32, d));
            }
        }
    }
    edges
}
