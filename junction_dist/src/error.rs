// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

/// Errors raised before any distance is computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistanceError {
    #[error(
        "Unsupported distance metric '{0}'. Supported metrics are: \
         [identity, levenshtein, hamming, alignment]"
    )]
    UnsupportedMetric(String),

    #[error("The distance cutoff must be non-negative, got {0}.")]
    NegativeCutoff(i64),

    #[error(
        "Alignment gap penalties must not be positive, got gap_open={gap_open} \
         and gap_extend={gap_extend}."
    )]
    InvalidGapPenalty { gap_open: i32, gap_extend: i32 },

    #[error(
        "The distance computation would evaluate an estimated {estimated} candidate \
         pairs, which exceeds the ceiling of {ceiling}."
    )]
    PairCeilingExceeded { estimated: u64, ceiling: u64 },
}

impl DistanceError {
    /// True for errors caused by the size of the input rather than the settings.
    pub fn is_scale(&self) -> bool {
        matches!(self, DistanceError::PairCeilingExceeded { .. })
    }
}
