// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Distance metrics between junction sequences.
//
// Every metric must be symmetric and non-negative.  A metric that can bound its
// distance from below by the length difference of the two sequences reports the
// largest admissible length difference through `length_window`; the engine then
// never compares sequences whose lengths are further apart.  Metrics for which no
// such bound holds return None and get exhaustive comparison.

use crate::error::DistanceError;
use bio::alignment::pairwise::Aligner;
use bio::scores::blosum62;
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::fmt;
use std::str::FromStr;

/// A distance between two junctions, evaluated under a cutoff.
pub trait JunctionMetric: Send + Sync {
    /// Name of the metric, including any parameters.  Used as a cache key.
    fn name(&self) -> String;

    /// Return the distance between a and b, or None if it exceeds cutoff.
    fn distance(&self, a: &[u8], b: &[u8], cutoff: u32) -> Option<u32>;

    /// Return the largest length difference that a pair within cutoff can have,
    /// or None if the metric admits no such bound.
    fn length_window(&self, cutoff: u32) -> Option<usize>;

    /// True if the residue composition of two sequences bounds their distance
    /// from below, as it does for edit distances.
    fn composition_bound(&self) -> bool {
        false
    }
}

/// Selector for the built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSpec {
    /// Exact string equality.
    Identity,
    /// Levenshtein edit distance.
    Levenshtein,
    /// Hamming distance between sequences of equal length.
    Hamming,
    /// BLOSUM62 global alignment, scored against the weaker self alignment.
    Alignment { gap_open: i32, gap_extend: i32 },
}

/// Each gap position costs 11, with no separate opening charge.
pub const DEFAULT_GAP_OPEN: i32 = 0;
pub const DEFAULT_GAP_EXTEND: i32 = -11;

impl MetricSpec {
    /// Return the cutoff used when none is given.
    pub fn default_cutoff(&self) -> u32 {
        match self {
            MetricSpec::Identity => 0,
            MetricSpec::Levenshtein | MetricSpec::Hamming => 2,
            MetricSpec::Alignment { .. } => 10,
        }
    }

    /// Check parameters that would make the metric ill defined.
    pub fn validate(&self) -> Result<(), DistanceError> {
        match *self {
            MetricSpec::Alignment {
                gap_open,
                gap_extend,
            } if gap_open > 0 || gap_extend > 0 => Err(DistanceError::InvalidGapPenalty {
                gap_open,
                gap_extend,
            }),
            _ => Ok(()),
        }
    }

    /// Instantiate the metric.
    pub fn build(&self) -> Box<dyn JunctionMetric> {
        match *self {
            MetricSpec::Identity => Box::new(Identity),
            MetricSpec::Levenshtein => Box::new(Levenshtein),
            MetricSpec::Hamming => Box::new(Hamming),
            MetricSpec::Alignment {
                gap_open,
                gap_extend,
            } => Box::new(AlignmentDistance::new(gap_open, gap_extend)),
        }
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSpec::Identity => write!(f, "identity"),
            MetricSpec::Levenshtein => write!(f, "levenshtein"),
            MetricSpec::Hamming => write!(f, "hamming"),
            MetricSpec::Alignment { .. } => write!(f, "alignment"),
        }
    }
}

impl FromStr for MetricSpec {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(MetricSpec::Identity),
            "levenshtein" => Ok(MetricSpec::Levenshtein),
            "hamming" => Ok(MetricSpec::Hamming),
            "alignment" => Ok(MetricSpec::Alignment {
                gap_open: DEFAULT_GAP_OPEN,
                gap_extend: DEFAULT_GAP_EXTEND,
            }),
            unknown => Err(DistanceError::UnsupportedMetric(unknown.to_string())),
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// BUILT-IN METRICS
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Distance 0 for equal sequences; everything else is out of range.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl JunctionMetric for Identity {
    fn name(&self) -> String {
        "identity".to_string()
    }

    fn distance(&self, a: &[u8], b: &[u8], _cutoff: u32) -> Option<u32> {
        (a == b).then_some(0)
    }

    fn length_window(&self, _cutoff: u32) -> Option<usize> {
        Some(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl JunctionMetric for Levenshtein {
    fn name(&self) -> String {
        "levenshtein".to_string()
    }

    fn distance(&self, a: &[u8], b: &[u8], cutoff: u32) -> Option<u32> {
        if a.len().abs_diff(b.len()) > cutoff as usize {
            return None;
        }
        let d = triple_accel::levenshtein_exp(a, b);
        (d <= cutoff).then_some(d)
    }

    fn length_window(&self, cutoff: u32) -> Option<usize> {
        Some(cutoff as usize)
    }

    fn composition_bound(&self) -> bool {
        true
    }
}

/// Number of mismatched positions.  Sequences of unequal length are never
/// within any cutoff.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hamming;

impl JunctionMetric for Hamming {
    fn name(&self) -> String {
        "hamming".to_string()
    }

    fn distance(&self, a: &[u8], b: &[u8], cutoff: u32) -> Option<u32> {
        if a.len() != b.len() {
            return None;
        }
        let d = triple_accel::hamming(a, b);
        (d <= cutoff).then_some(d)
    }

    fn length_window(&self, _cutoff: u32) -> Option<usize> {
        Some(0)
    }

    fn composition_bound(&self) -> bool {
        true
    }
}

/// Global BLOSUM62 alignment turned into a distance:
///
/// d(a, b) = max(0, min(S(a, a), S(b, b)) - S(a, b))
///
/// where S is the alignment score.  A higher score means a smaller distance, and
/// identical sequences are at distance 0.  Gaps may absorb any length difference,
/// so there is no length window.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentDistance {
    gap_open: i32,
    gap_extend: i32,
}

impl Default for AlignmentDistance {
    fn default() -> Self {
        AlignmentDistance::new(DEFAULT_GAP_OPEN, DEFAULT_GAP_EXTEND)
    }
}

impl AlignmentDistance {
    pub fn new(gap_open: i32, gap_extend: i32) -> Self {
        AlignmentDistance {
            gap_open,
            gap_extend,
        }
    }

    /// Score of aligning a sequence to itself.
    pub fn self_score(seq: &[u8]) -> i32 {
        seq.iter().map(|&c| blosum62(c, c)).sum()
    }

    /// Global alignment score of a against b.
    pub fn score(&self, a: &[u8], b: &[u8]) -> i32 {
        let mut aligner =
            Aligner::with_capacity(a.len(), b.len(), self.gap_open, self.gap_extend, blosum62);
        aligner.global(a, b).score
    }
}

impl JunctionMetric for AlignmentDistance {
    fn name(&self) -> String {
        format!("alignment(open={},extend={})", self.gap_open, self.gap_extend)
    }

    fn distance(&self, a: &[u8], b: &[u8], cutoff: u32) -> Option<u32> {
        let best = min(Self::self_score(a), Self::self_score(b));
        let d = (best - self.score(a, b)).max(0) as u32;
        (d <= cutoff).then_some(d)
    }

    fn length_window(&self, _cutoff: u32) -> Option<usize> {
        None
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// RESIDUE COMPOSITION
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

// Bytes are binned by their low five bits, which separates all amino acid codes.
// Binning distinct bytes together only weakens the bound, it never breaks it.

const N_BINS: usize = 32;

/// Residue counts of one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition([u16; N_BINS]);

impl Composition {
    pub fn of(seq: &[u8]) -> Self {
        let mut counts = [0u16; N_BINS];
        for &c in seq {
            let bin = &mut counts[(c & 31) as usize];
            *bin = bin.saturating_add(1);
        }
        Composition(counts)
    }

    /// Lower bound on the edit distance between the two sequences.  Each edit
    /// changes the surplus of at most one residue on each side by one.
    pub fn edit_lower_bound(&self, other: &Composition) -> u32 {
        let (mut surplus, mut deficit) = (0u32, 0u32);
        for (x, y) in self.0.iter().zip(other.0.iter()) {
            if x > y {
                surplus += u32::from(x - y);
            } else {
                deficit += u32::from(y - x);
            }
        }
        surplus.max(deficit)
    }
}
