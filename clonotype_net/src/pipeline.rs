// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// End to end clonotyping run: index, distances, per-locus graphs, resolution.

use crate::config::ClonotypeConfig;
use crate::error::{ClonotypeError, RecordError};
use crate::graph::{ClusterAssignment, LocusGraph};
use crate::index::SequenceIndex;
use crate::resolver::{resolve_clonotypes, CloneTable};
use junction_dist::{DistanceCache, DistanceEdge, DistanceEngine};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use vdj_types::{ChainRecord, Locus};

/// Counts for one locus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocusSummary {
    pub locus: Locus,
    /// Unique junctions in the catalog.
    pub n_entries: usize,
    /// Cells listing this locus without a usable junction.
    pub n_no_chain_cells: usize,
    /// Junction pairs left to evaluate after pruning.
    pub n_candidate_pairs: u64,
    pub n_edges: usize,
    pub n_clusters: u32,
    pub n_singletons: usize,
}

/// Counts for a whole run.  Everything here is determined by the input and the
/// settings, except the cache counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub n_records: usize,
    pub n_cells: usize,
    /// Records rejected in permissive mode.
    pub rejected: Vec<RecordError>,
    pub loci: Vec<LocusSummary>,
    pub n_cells_with_clonotype: usize,
    pub n_cells_without_clonotype: usize,
    pub n_clonotypes: u32,
    pub n_clonotype_clusters: u32,
    /// Clonotype size to number of clonotypes of that size.
    pub clonotype_size_histogram: BTreeMap<usize, usize>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// Everything computed by a run.
#[derive(Debug, Clone)]
pub struct ClonotypeNetwork {
    pub index: SequenceIndex,
    pub graphs: BTreeMap<Locus, LocusGraph>,
    pub clusters: BTreeMap<Locus, ClusterAssignment>,
    pub table: CloneTable,
    pub summary: RunSummary,
}

impl ClonotypeNetwork {
    pub fn graph(&self, locus: Locus) -> Option<&LocusGraph> {
        self.graphs.get(&locus)
    }

    pub fn clusters(&self, locus: Locus) -> Option<&ClusterAssignment> {
        self.clusters.get(&locus)
    }
}

/// Assign clonotypes to the cells described by `records`.
pub fn build_clonotype_network(
    records: &[ChainRecord],
    config: &ClonotypeConfig,
) -> Result<ClonotypeNetwork, ClonotypeError> {
    build_with_cache(records, config, &mut DistanceCache::new())
}

/// As `build_clonotype_network`, reusing edges from `cache` for any locus whose
/// catalog was already computed with the same metric and cutoff.
pub fn build_with_cache(
    records: &[ChainRecord],
    config: &ClonotypeConfig,
    cache: &mut DistanceCache,
) -> Result<ClonotypeNetwork, ClonotypeError> {
    config.validate()?;
    let engine = config.engine()?;
    match config.max_threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    ClonotypeError::Config(format!("could not start {threads} threads: {e}"))
                })?;
            pool.install(|| run(records, config, &engine, cache))
        }
        None => run(records, config, &engine, cache),
    }
}

fn run(
    records: &[ChainRecord],
    config: &ClonotypeConfig,
    engine: &DistanceEngine,
    cache: &mut DistanceCache,
) -> Result<ClonotypeNetwork, ClonotypeError> {
    let (hits, misses) = (cache.hits(), cache.misses());

    let index = SequenceIndex::build(records, config.max_chains_per_locus, config.error_mode)?;
    let loci = if config.loci.is_empty() {
        index.loci()
    } else {
        config.loci.clone()
    };
    let catalogs: Vec<_> = loci.iter().filter_map(|&l| index.catalog(l)).collect();
    info!(
        "clonotyping {} cells from {} records on {} loci with {} at cutoff {}",
        index.cells().len(),
        records.len(),
        catalogs.len(),
        engine.metric().name(),
        engine.cutoff()
    );

    // Refuse oversized inputs before computing anything.

    let junctions: Vec<Vec<&[u8]>> = catalogs.iter().map(|c| c.junctions()).collect();
    let candidate_pairs: Vec<u64> = junctions.iter().map(|j| engine.estimate_pairs(j)).collect();
    let estimated: u64 = candidate_pairs.iter().sum();
    if let Some(ceiling) = config.pair_ceiling {
        if estimated > ceiling {
            return Err(ClonotypeError::Scale { estimated, ceiling });
        }
    }

    // Distances, from the cache where possible.

    let mut edges: Vec<Option<Arc<Vec<DistanceEdge>>>> =
        junctions.iter().map(|j| cache.get(engine, j)).collect();
    let missing: Vec<usize> = (0..edges.len()).filter(|&k| edges[k].is_none()).collect();
    let computed: Vec<(usize, Vec<DistanceEdge>)> = missing
        .par_iter()
        .map(|&k| -> Result<_, ClonotypeError> { Ok((k, engine.compute(&junctions[k])?)) })
        .collect::<Result<_, ClonotypeError>>()?;
    for (k, e) in computed {
        let e = Arc::new(e);
        cache.insert(engine, &junctions[k], Arc::clone(&e));
        edges[k] = Some(e);
    }

    // Per-locus graphs and clusters.

    let networks: Vec<(LocusGraph, ClusterAssignment)> = catalogs
        .par_iter()
        .zip(edges)
        .map(|(catalog, e)| {
            let graph = LocusGraph::new(catalog.locus(), catalog.len(), e.unwrap_or_default());
            let clusters = graph.components();
            debug!(
                "{}: {} junctions, {} edges, {} clusters",
                catalog.locus(),
                catalog.len(),
                graph.edges().len(),
                clusters.n_clusters()
            );
            (graph, clusters)
        })
        .collect();
    let locus_summaries: Vec<LocusSummary> = catalogs
        .iter()
        .zip(&networks)
        .zip(&candidate_pairs)
        .map(|((catalog, (graph, clusters)), &n_candidate_pairs)| LocusSummary {
            locus: catalog.locus(),
            n_entries: catalog.len(),
            n_no_chain_cells: catalog.no_chain_cells().len(),
            n_candidate_pairs,
            n_edges: graph.edges().len(),
            n_clusters: clusters.n_clusters(),
            n_singletons: clusters.n_singletons(),
        })
        .collect();
    let (graphs, clusters): (BTreeMap<_, _>, BTreeMap<_, _>) = networks
        .into_iter()
        .map(|(g, c)| ((g.locus(), g), (c.locus(), c)))
        .unzip();

    // Cell-level calls.

    let table = resolve_clonotypes(&index, &clusters, config);
    let n_without = table.n_without_clonotype();
    let summary = RunSummary {
        n_records: index.n_records(),
        n_cells: table.cells().len(),
        rejected: index.rejected().to_vec(),
        loci: locus_summaries,
        n_cells_with_clonotype: table.cells().len() - n_without,
        n_cells_without_clonotype: n_without,
        n_clonotypes: table.n_clonotypes,
        n_clonotype_clusters: table.n_clonotype_clusters,
        clonotype_size_histogram: table.size_histogram(),
        cache_hits: cache.hits() - hits,
        cache_misses: cache.misses() - misses,
    };
    info!(
        "{} clonotypes over {} cells, {} cells without clonotype",
        summary.n_clonotypes, summary.n_cells_with_clonotype, summary.n_cells_without_clonotype
    );
    Ok(ClonotypeNetwork {
        index,
        graphs,
        clusters,
        table,
        summary,
    })
}
