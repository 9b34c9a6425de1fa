// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use junction_dist::DistanceError;
use serde::Serialize;
use vdj_types::Locus;

/// What is wrong with an input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum RecordErrorKind {
    #[error("the cell id is empty")]
    MissingCellId,

    #[error("invalid amino acid '{residue}' at position {position} of the junction")]
    InvalidJunction { position: usize, residue: char },

    #[error("chain rank {rank} is beyond the maximum of {max_chains} chains per locus")]
    RankExceedsMaximum { rank: u8, max_chains: u8 },

    #[error("chain rank {rank} occurs more than once")]
    DuplicateRank { rank: u8 },
}

/// A rejected input record, with enough context to decide whether to drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("record {record} (cell '{cell_id}', locus {locus}): {kind}")]
pub struct RecordError {
    /// Position of the record in the input.
    pub record: usize,
    pub cell_id: String,
    pub locus: Locus,
    pub kind: RecordErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum ClonotypeError {
    /// Bad settings.  Raised before any work is done.
    #[error("Invalid clonotyping configuration: {0}")]
    Config(String),

    /// Bad input data.
    #[error("Invalid input data: {0}")]
    Data(#[from] RecordError),

    /// The input is too large for the declared ceiling.  Raised before any
    /// distance is computed.
    #[error(
        "Distance computation would evaluate an estimated {estimated} candidate pairs, \
         exceeding the ceiling of {ceiling}."
    )]
    Scale { estimated: u64, ceiling: u64 },
}

impl From<DistanceError> for ClonotypeError {
    fn from(err: DistanceError) -> Self {
        match err {
            DistanceError::PairCeilingExceeded { estimated, ceiling } => {
                ClonotypeError::Scale { estimated, ceiling }
            }
            other => ClonotypeError::Config(other.to_string()),
        }
    }
}

impl ClonotypeError {
    pub fn is_config(&self) -> bool {
        matches!(self, ClonotypeError::Config(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, ClonotypeError::Data(_))
    }

    pub fn is_scale(&self) -> bool {
        matches!(self, ClonotypeError::Scale { .. })
    }
}
