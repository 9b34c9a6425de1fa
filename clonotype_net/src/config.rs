// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use crate::error::ClonotypeError;
use junction_dist::{DistanceEngine, MetricSpec, DEFAULT_BLOCK_SIZE};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vdj_types::Locus;

/// How chains of two cells must agree for the cells to share a clonotype.
///
/// There is no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceptorArms {
    /// Every chain present on both cells, rank by rank, must fall in the same cluster.
    All,
    /// A single chain in the same cluster on both cells suffices.
    Any,
}

/// Whether a cell lacking a locus can match a cell that has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocusPolicy {
    /// Missing loci are ignored; only loci present on both cells are compared.
    Partial,
    /// Both cells must carry chains on exactly the same loci.
    Strict,
}

/// What to do with malformed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// The first malformed record aborts the run.
    #[default]
    Strict,
    /// Cells with malformed records are excluded and reported.
    Permissive,
}

impl FromStr for ReceptorArms {
    type Err = ClonotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReceptorArms::All),
            "any" => Ok(ReceptorArms::Any),
            other => Err(ClonotypeError::Config(format!(
                "unsupported receptor_arms '{other}', expected one of [all, any]"
            ))),
        }
    }
}

impl FromStr for LocusPolicy {
    type Err = ClonotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partial" => Ok(LocusPolicy::Partial),
            "strict" => Ok(LocusPolicy::Strict),
            other => Err(ClonotypeError::Config(format!(
                "unsupported locus_policy '{other}', expected one of [partial, strict]"
            ))),
        }
    }
}

fn default_max_chains() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

/// Clonotyping parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClonotypeConfig {
    /// Junction distance metric.
    pub metric: MetricSpec,
    /// Largest distance at which two junctions are connected.  None selects
    /// the metric's default.
    #[serde(default)]
    pub cutoff: Option<i64>,
    pub receptor_arms: ReceptorArms,
    pub locus_policy: LocusPolicy,
    /// Loci to clonotype on, in canonical order.  Empty means every locus
    /// present in the input, in `Locus` order.
    #[serde(default)]
    pub loci: Vec<Locus>,
    #[serde(default = "default_max_chains")]
    pub max_chains_per_locus: u8,
    /// Require matching chains to also share their V gene.
    #[serde(default)]
    pub same_v_gene: bool,
    /// Also compute clonotype clusters.
    #[serde(default = "default_true")]
    pub clonotype_clusters: bool,
    #[serde(default)]
    pub error_mode: ErrorMode,
    /// Upper limit on the estimated number of candidate junction pairs, summed
    /// over loci.
    #[serde(default)]
    pub pair_ceiling: Option<u64>,
    /// Rows per parallel distance block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Number of threads for this run.  None uses the current rayon pool.
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl ClonotypeConfig {
    pub fn new(metric: MetricSpec, receptor_arms: ReceptorArms, locus_policy: LocusPolicy) -> Self {
        ClonotypeConfig {
            metric,
            cutoff: None,
            receptor_arms,
            locus_policy,
            loci: Vec::new(),
            max_chains_per_locus: default_max_chains(),
            same_v_gene: false,
            clonotype_clusters: true,
            error_mode: ErrorMode::default(),
            pair_ceiling: None,
            block_size: DEFAULT_BLOCK_SIZE,
            max_threads: None,
        }
    }

    pub fn with_cutoff(mut self, cutoff: i64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_loci(mut self, loci: &[Locus]) -> Self {
        self.loci = loci.to_vec();
        self
    }

    /// The cutoff in effect, before the identity metric forces it to 0.
    pub fn effective_cutoff(&self) -> i64 {
        self.cutoff
            .unwrap_or_else(|| i64::from(self.metric.default_cutoff()))
    }

    /// Check the settings without touching any data.
    pub fn validate(&self) -> Result<(), ClonotypeError> {
        self.metric.validate()?;
        if self.effective_cutoff() < 0 {
            return Err(ClonotypeError::Config(format!(
                "the distance cutoff must be non-negative, got {}",
                self.effective_cutoff()
            )));
        }
        if self.max_chains_per_locus == 0 {
            return Err(ClonotypeError::Config(
                "max_chains_per_locus must be at least 1".to_string(),
            ));
        }
        let mut loci = self.loci.clone();
        loci.sort_unstable();
        if let Some(dup) = loci.windows(2).find(|w| w[0] == w[1]) {
            return Err(ClonotypeError::Config(format!(
                "locus {} is listed more than once",
                dup[0]
            )));
        }
        if self.block_size == 0 {
            return Err(ClonotypeError::Config("block_size must be positive".to_string()));
        }
        if self.max_threads == Some(0) {
            return Err(ClonotypeError::Config("max_threads must be positive".to_string()));
        }
        Ok(())
    }

    /// Build the distance engine these settings describe.
    pub fn engine(&self) -> Result<DistanceEngine, ClonotypeError> {
        Ok(DistanceEngine::new(&self.metric, self.effective_cutoff())?.block_size(self.block_size))
    }
}
