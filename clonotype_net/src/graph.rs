// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Graph builder: per-locus junction graph and its connected components.
//
// Clusters are single linkage: two entries share a cluster iff a path of edges
// within the cutoff joins them.  Edge weights play no part in membership.

use equiv::EquivRel;
use junction_dist::DistanceEdge;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::sync::Arc;
use vdj_types::Locus;

/// Cluster id of every catalog entry of one locus.  Ids are dense and numbered
/// by the smallest catalog index in each cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    locus: Locus,
    labels: Vec<u32>,
    n_clusters: u32,
}

impl ClusterAssignment {
    /// Cluster n entries connected by the given edges.
    pub fn from_edges(locus: Locus, n: usize, edges: &[DistanceEdge]) -> Self {
        let mut eq = EquivRel::new(n as u32);
        for e in edges {
            eq.join(e.i as usize, e.j as usize);
        }
        let labels = eq.dense_labels();
        let n_clusters = labels.iter().max().map_or(0, |m| m + 1);
        ClusterAssignment {
            locus,
            labels,
            n_clusters,
        }
    }

    pub fn locus(&self) -> Locus {
        self.locus
    }

    /// Number of catalog entries covered.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_clusters(&self) -> u32 {
        self.n_clusters
    }

    pub fn cluster_of(&self, entry: u32) -> u32 {
        self.labels[entry as usize]
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Members of each cluster, by cluster id, members ascending.
    pub fn clusters(&self) -> Vec<Vec<u32>> {
        let mut clusters = vec![Vec::new(); self.n_clusters as usize];
        for (entry, &c) in self.labels.iter().enumerate() {
            clusters[c as usize].push(entry as u32);
        }
        clusters
    }

    /// Number of clusters with a single entry.
    pub fn n_singletons(&self) -> usize {
        let mut sizes = vec![0usize; self.n_clusters as usize];
        for &c in &self.labels {
            sizes[c as usize] += 1;
        }
        sizes.into_iter().filter(|&s| s == 1).count()
    }
}

/// Junction graph of one locus: catalog entries as nodes, retained distances as
/// weighted edges.
#[derive(Debug, Clone)]
pub struct LocusGraph {
    locus: Locus,
    n_nodes: usize,
    edges: Arc<Vec<DistanceEdge>>,
}

impl LocusGraph {
    pub fn new(locus: Locus, n_nodes: usize, edges: Arc<Vec<DistanceEdge>>) -> Self {
        debug_assert!(edges.iter().all(|e| e.i < e.j && (e.j as usize) < n_nodes));
        LocusGraph {
            locus,
            n_nodes,
            edges,
        }
    }

    pub fn locus(&self) -> Locus {
        self.locus
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn edges(&self) -> &[DistanceEdge] {
        &self.edges
    }

    pub fn components(&self) -> ClusterAssignment {
        ClusterAssignment::from_edges(self.locus, self.n_nodes, &self.edges)
    }

    /// Export as a petgraph graph.  Node weights are catalog indices and edge
    /// weights distances.
    pub fn to_petgraph(&self) -> UnGraph<u32, u32> {
        let mut g = UnGraph::with_capacity(self.n_nodes, self.edges.len());
        for v in 0..self.n_nodes {
            g.add_node(v as u32);
        }
        for e in self.edges.iter() {
            g.add_edge(
                NodeIndex::new(e.i as usize),
                NodeIndex::new(e.j as usize),
                e.distance,
            );
        }
        g
    }
}
