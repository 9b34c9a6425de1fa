//! junction_dist
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Sparse pairwise distances between junction sequences.
//!
//! Only pairs within the cutoff are ever materialized.  Candidate pairs are
//! pruned by length and, for edit distances, by residue composition; the
//! survivors are evaluated exactly, so pruning never loses an edge.

mod cache;
mod engine;
mod error;
mod metric;

pub use cache::DistanceCache;
pub use engine::{exhaustive_edges, DistanceEdge, DistanceEngine, DEFAULT_BLOCK_SIZE};
pub use error::DistanceError;
pub use metric::{
    AlignmentDistance, Composition, Hamming, Identity, JunctionMetric, Levenshtein, MetricSpec,
    DEFAULT_GAP_EXTEND, DEFAULT_GAP_OPEN,
};
