// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Clonotype networks from single-cell immune receptor chains.
//!
//! Junction sequences are deduplicated per locus, linked when their distance is
//! within a cutoff, and clustered by connected components.  Cells are then
//! grouped into clonotypes by comparing the clusters of their chains under an
//! explicit pairing policy.
//!
//! ```no_run
//! use clonotype_net::{build_clonotype_network, ClonotypeConfig, LocusPolicy, ReceptorArms};
//! use junction_dist::MetricSpec;
//! use vdj_types::{ChainRecord, Locus};
//!
//! let records = vec![
//!     ChainRecord::new("cell1", Locus::TRB, 0, "CASSLGQAYEQYF"),
//!     ChainRecord::new("cell2", Locus::TRB, 0, "CASSLGQAYEQFF"),
//! ];
//! let config =
//!     ClonotypeConfig::new(MetricSpec::Levenshtein, ReceptorArms::All, LocusPolicy::Partial)
//!         .with_cutoff(1);
//! let network = build_clonotype_network(&records, &config).unwrap();
//! assert_eq!(network.table.n_clonotypes, 1);
//! ```

mod config;
mod error;
mod graph;
mod index;
mod pipeline;
mod resolver;

pub use config::{ClonotypeConfig, ErrorMode, LocusPolicy, ReceptorArms};
pub use error::{ClonotypeError, RecordError, RecordErrorKind};
pub use graph::{ClusterAssignment, LocusGraph};
pub use index::{
    CatalogEntry, CellIdx, ChainRef, IndexedCell, IndexedChain, LocusCatalog, SequenceIndex,
};
pub use pipeline::{
    build_clonotype_network, build_with_cache, ClonotypeNetwork, LocusSummary, RunSummary,
};
pub use resolver::{resolve_clonotypes, ChainKey, CloneIdentity, CloneTable, LocusClusters};
