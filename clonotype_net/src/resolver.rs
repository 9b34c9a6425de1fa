// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Chain resolver: combine per-locus cluster ids into cell-level clonotypes.
//
// Each cell is reduced to a receptor profile, the list of its qualifying chains
// as (locus, rank, chain key) in canonical locus order.  Cells with equal
// profiles always share a clonotype.  Distinct profiles are joined when they
// match under the pairing policy; clonotypes are the connected components of
// that relation.  Clonotype clusters are a second pass that joins clonotypes
// sharing any chain key on the same locus.
//
// All ids are dense and numbered in order of first occurrence along the cell
// order of the sequence index.  Hash maps are used only for lookup.

use crate::config::{ClonotypeConfig, LocusPolicy, ReceptorArms};
use crate::graph::ClusterAssignment;
use crate::index::SequenceIndex;
use equiv::EquivRel;
use fxhash::FxHashMap;
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use vdj_types::Locus;

/// What a chain is compared by.  The V gene takes part only when chains are
/// required to share their V gene; it is then an interned id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChainKey {
    pub cluster: u32,
    pub v_gene: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ProfileChain {
    /// Position of the locus in the canonical ordering.
    slot: u8,
    rank: u8,
    key: ChainKey,
}

type Profile = Vec<ProfileChain>;

/// Per-locus cluster ids of one cell, ordered by rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocusClusters {
    pub locus: Locus,
    /// (rank, cluster id) pairs.
    pub clusters: Vec<(u8, u32)>,
}

/// Clonotype call for one cell.  Both ids are None for cells without a
/// qualifying chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneIdentity {
    pub cell_id: String,
    pub receptor: Vec<LocusClusters>,
    pub clonotype_id: Option<u32>,
    pub clonotype_cluster_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneTable {
    /// One row per cell, in the cell order of the sequence index.
    cells: Vec<CloneIdentity>,
    #[serde(skip)]
    row_of: FxHashMap<String, u32>,
    pub n_clonotypes: u32,
    pub n_clonotype_clusters: u32,
}

impl CloneTable {
    fn new(cells: Vec<CloneIdentity>, n_clonotypes: u32, n_clonotype_clusters: u32) -> Self {
        let row_of = cells
            .iter()
            .enumerate()
            .map(|(row, c)| (c.cell_id.clone(), row as u32))
            .collect();
        CloneTable {
            cells,
            row_of,
            n_clonotypes,
            n_clonotype_clusters,
        }
    }

    pub fn cells(&self) -> &[CloneIdentity] {
        &self.cells
    }

    /// Look up a cell by id.
    pub fn get(&self, cell_id: &str) -> Option<&CloneIdentity> {
        self.row_of.get(cell_id).map(|&row| &self.cells[row as usize])
    }

    /// Clonotype id of a cell, None if the cell is unknown or has no clonotype.
    pub fn clonotype_of(&self, cell_id: &str) -> Option<u32> {
        self.get(cell_id).and_then(|c| c.clonotype_id)
    }

    pub fn clonotype_cluster_of(&self, cell_id: &str) -> Option<u32> {
        self.get(cell_id).and_then(|c| c.clonotype_cluster_id)
    }

    /// Number of cells in each clonotype, by clonotype id.
    pub fn clonotype_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clonotypes as usize];
        for id in self.cells.iter().filter_map(|c| c.clonotype_id) {
            sizes[id as usize] += 1;
        }
        sizes
    }

    /// Map from clonotype size to the number of clonotypes of that size.
    pub fn size_histogram(&self) -> BTreeMap<usize, usize> {
        self.clonotype_sizes().into_iter().counts().into_iter().collect()
    }

    pub fn n_without_clonotype(&self) -> usize {
        self.cells.iter().filter(|c| c.clonotype_id.is_none()).count()
    }
}

/// Items listed under each key, in item order.
fn postings<K, I>(items: I) -> BTreeMap<K, Vec<u32>>
where
    K: Ord,
    I: IntoIterator<Item = (u32, K)>,
{
    let mut post = BTreeMap::<K, Vec<u32>>::new();
    for (item, key) in items {
        let list = post.entry(key).or_default();
        if list.last() != Some(&item) {
            list.push(item);
        }
    }
    post
}

fn join_lists<'a>(eq: &mut EquivRel, lists: impl IntoIterator<Item = &'a Vec<u32>>) {
    for list in lists {
        for w in list.windows(2) {
            eq.join(w[0] as usize, w[1] as usize);
        }
    }
}

/// Join the distinct profiles that match under the pairing policy.
fn join_matching(distinct: &[&Profile], arms: ReceptorArms, policy: LocusPolicy) -> EquivRel {
    let mut eq = EquivRel::new(distinct.len() as u32);
    match (arms, policy) {
        // Only equal profiles match, and those are already collapsed.
        (ReceptorArms::All, LocusPolicy::Strict) => {}
        (ReceptorArms::Any, _) => join_sharing_a_key(distinct, policy, &mut eq),
        (ReceptorArms::All, LocusPolicy::Partial) => join_agreeing_ranks(distinct, &mut eq),
    }
    eq
}

/// Profiles match when they share a chain key on a locus.  Under a strict
/// locus policy they must also carry the same set of loci.
fn join_sharing_a_key(distinct: &[&Profile], policy: LocusPolicy, eq: &mut EquivRel) {
    let mut locus_sets = FxHashMap::<Vec<u8>, u32>::default();
    let buckets = postings(distinct.iter().enumerate().flat_map(|(i, profile)| {
        let set = match policy {
            LocusPolicy::Strict => {
                let slots = profile.iter().map(|c| c.slot).dedup().collect_vec();
                let next = locus_sets.len() as u32;
                *locus_sets.entry(slots).or_insert(next)
            }
            LocusPolicy::Partial => 0,
        };
        profile.iter().map(move |c| (i as u32, (set, c.slot, c.key)))
    }));
    join_lists(eq, buckets.values());
}

/// Profiles match when they agree on every (locus, rank) position both carry,
/// and carry at least one in common.
///
/// Profiles with the same positions match only if equal, so joins happen
/// between position classes.  For a pair of classes, members are bucketed by
/// their keys on the shared positions and every bucket seen from both sides is
/// joined.
fn join_agreeing_ranks(distinct: &[&Profile], eq: &mut EquivRel) {
    let mut classes = BTreeMap::<Vec<(u8, u8)>, Vec<u32>>::new();
    for (i, profile) in distinct.iter().enumerate() {
        let positions = profile.iter().map(|c| (c.slot, c.rank)).collect_vec();
        classes.entry(positions).or_default().push(i as u32);
    }
    let classes = classes.into_iter().collect_vec();
    debug!("{} receptor position classes", classes.len());

    for (x, (positions_x, members_x)) in classes.iter().enumerate() {
        for (positions_y, members_y) in &classes[x + 1..] {
            let shared = positions_x
                .iter()
                .filter(|p| positions_y.binary_search(p).is_ok())
                .copied()
                .collect_vec();
            if shared.is_empty() {
                continue;
            }
            let restrict = |p: u32| {
                distinct[p as usize]
                    .iter()
                    .filter(|c| shared.binary_search(&(c.slot, c.rank)).is_ok())
                    .map(|c| c.key)
                    .collect_vec()
            };
            let mut buckets = FxHashMap::<Vec<ChainKey>, (Vec<u32>, bool)>::default();
            for &p in members_x {
                buckets.entry(restrict(p)).or_default().0.push(p);
            }
            for &q in members_y {
                if let Some((xs, hit)) = buckets.get_mut(&restrict(q)) {
                    eq.join(xs[0] as usize, q as usize);
                    *hit = true;
                }
            }
            join_lists(eq, buckets.values().filter(|(_, hit)| *hit).map(|(xs, _)| xs));
        }
    }
}

/// Assign clonotypes and clonotype clusters to every cell of the index.
///
/// `clusters` must hold the assignment of every locus to clonotype on.  Loci
/// outside the configured set are ignored.
pub fn resolve_clonotypes(
    index: &SequenceIndex,
    clusters: &BTreeMap<Locus, ClusterAssignment>,
    config: &ClonotypeConfig,
) -> CloneTable {
    let loci = if config.loci.is_empty() {
        index.loci()
    } else {
        config.loci.clone()
    };
    let slot_of: FxHashMap<Locus, u8> = loci
        .iter()
        .enumerate()
        .map(|(slot, &locus)| (locus, slot as u8))
        .collect();

    // Reduce cells to profiles.

    let mut v_ids = FxHashMap::<&str, u32>::default();
    let mut profiles = Vec::<Option<Profile>>::with_capacity(index.cells().len());
    for cell in index.cells() {
        let mut profile = Profile::new();
        for chain in &cell.chains {
            let (Some(entry), Some(&slot)) = (chain.entry, slot_of.get(&chain.locus)) else {
                continue;
            };
            let Some(assignment) = clusters.get(&chain.locus) else {
                continue;
            };
            let v_gene = if config.same_v_gene {
                chain.v_gene.as_deref().map(|v| {
                    let next = v_ids.len() as u32;
                    *v_ids.entry(v).or_insert(next)
                })
            } else {
                None
            };
            profile.push(ProfileChain {
                slot,
                rank: chain.rank,
                key: ChainKey {
                    cluster: assignment.cluster_of(entry),
                    v_gene,
                },
            });
        }
        profile.sort_unstable();
        profiles.push((!profile.is_empty()).then_some(profile));
    }

    // Collapse equal profiles.  Distinct profiles are numbered by first cell.

    let mut profile_ids = FxHashMap::<&Profile, u32>::default();
    let mut distinct = Vec::<&Profile>::new();
    let cell_profile: Vec<Option<u32>> = profiles
        .iter()
        .map(|p| {
            p.as_ref().map(|p| {
                *profile_ids.entry(p).or_insert_with(|| {
                    distinct.push(p);
                    (distinct.len() - 1) as u32
                })
            })
        })
        .collect();

    let clonotypes = join_matching(&distinct, config.receptor_arms, config.locus_policy);
    let clonotype_of_profile = clonotypes.dense_labels();
    let n_clonotypes = clonotypes.n_sets() as u32;

    // Join clonotypes sharing a chain key.

    let (cluster_of_clonotype, n_clonotype_clusters) = if config.clonotype_clusters {
        let mut eq = EquivRel::new(n_clonotypes);
        let by_clonotype = postings(distinct.iter().enumerate().flat_map(|(i, p)| {
            let clonotype = clonotype_of_profile[i];
            p.iter().map(move |c| (clonotype, (c.slot, c.key)))
        }));
        join_lists(&mut eq, by_clonotype.values());
        (Some(eq.dense_labels()), eq.n_sets() as u32)
    } else {
        (None, 0)
    };
    debug!(
        "{} distinct receptor profiles, {} clonotypes, {} clonotype clusters",
        distinct.len(),
        n_clonotypes,
        n_clonotype_clusters
    );

    // Write the table.

    let cells = index
        .cells()
        .iter()
        .zip(cell_profile)
        .zip(&profiles)
        .map(|((cell, profile_id), profile)| {
            let clonotype_id = profile_id.map(|p| clonotype_of_profile[p as usize]);
            let clonotype_cluster_id = clonotype_id
                .zip(cluster_of_clonotype.as_ref())
                .map(|(c, labels)| labels[c as usize]);
            let receptor = profile
                .iter()
                .flatten()
                .group_by(|c| c.slot)
                .into_iter()
                .map(|(slot, chains)| LocusClusters {
                    locus: loci[slot as usize],
                    clusters: chains.map(|c| (c.rank, c.key.cluster)).collect(),
                })
                .collect();
            CloneIdentity {
                cell_id: cell.cell_id.clone(),
                receptor,
                clonotype_id,
                clonotype_cluster_id,
            }
        })
        .collect();
    let table = CloneTable::new(cells, n_clonotypes, n_clonotype_clusters);
    info!(
        "assigned {} clonotypes and {} clonotype clusters to {} cells, {} cells without clonotype",
        table.n_clonotypes,
        table.n_clonotype_clusters,
        table.cells().len(),
        table.n_without_clonotype()
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SequenceIndex;
    use junction_dist::MetricSpec;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use vdj_types::ChainRecord;

    fn rec(cell: &str, locus: Locus, rank: u8, junction: &str) -> ChainRecord {
        ChainRecord::new(cell, locus, rank, junction)
    }

    fn config(arms: ReceptorArms, policy: LocusPolicy) -> ClonotypeConfig {
        ClonotypeConfig::new(MetricSpec::Identity, arms, policy)
    }

    fn resolve(records: &[ChainRecord], config: &ClonotypeConfig) -> CloneTable {
        let index =
            SequenceIndex::build(records, config.max_chains_per_locus, config.error_mode).unwrap();
        let engine = config.engine().unwrap();
        let clusters = index
            .catalogs()
            .map(|c| {
                let edges = engine.compute(&c.junctions()).unwrap();
                (c.locus(), ClusterAssignment::from_edges(c.locus(), c.len(), &edges))
            })
            .collect();
        resolve_clonotypes(&index, &clusters, config)
    }

    fn clonotypes(table: &CloneTable) -> Vec<Option<u32>> {
        table.cells().iter().map(|c| c.clonotype_id).collect()
    }

    #[test]
    fn test_partial_vs_strict() {
        let records = vec![
            rec("A", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRA, 0, "CAVRD"),
        ];
        for arms in [ReceptorArms::All, ReceptorArms::Any] {
            let partial = resolve(&records, &config(arms, LocusPolicy::Partial));
            assert_eq!(clonotypes(&partial), vec![Some(0), Some(0)]);
            let strict = resolve(&records, &config(arms, LocusPolicy::Strict));
            assert_eq!(clonotypes(&strict), vec![Some(0), Some(1)]);
        }
    }

    #[test]
    fn test_any_vs_all() {
        let records = vec![
            rec("A", Locus::TRA, 0, "CAVRD"),
            rec("A", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRA, 0, "CAVRD"),
            rec("B", Locus::TRB, 0, "CWWWW"),
        ];
        let any = resolve(&records, &config(ReceptorArms::Any, LocusPolicy::Strict));
        assert_eq!(clonotypes(&any), vec![Some(0), Some(0)]);
        let all = resolve(&records, &config(ReceptorArms::All, LocusPolicy::Partial));
        assert_eq!(clonotypes(&all), vec![Some(0), Some(1)]);
        assert_eq!(all.n_clonotypes, 2);
    }

    #[test]
    fn test_all_compares_rank_by_rank() {
        // Same two alpha junctions, swapped ranks.
        let records = vec![
            rec("A", Locus::TRA, 0, "CAVRD"),
            rec("A", Locus::TRA, 1, "CAMSG"),
            rec("B", Locus::TRA, 0, "CAMSG"),
            rec("B", Locus::TRA, 1, "CAVRD"),
            rec("C", Locus::TRA, 0, "CAVRD"),
        ];
        let all = resolve(&records, &config(ReceptorArms::All, LocusPolicy::Partial));
        // C agrees with A on rank 0 and has no rank 1 to disagree on.
        assert_eq!(clonotypes(&all), vec![Some(0), Some(1), Some(0)]);
        let strict = resolve(&records, &config(ReceptorArms::All, LocusPolicy::Strict));
        assert_eq!(clonotypes(&strict), vec![Some(0), Some(1), Some(2)]);
        assert_eq!(
            strict.get("A").unwrap().receptor,
            vec![LocusClusters {
                locus: Locus::TRA,
                clusters: vec![(0, 0), (1, 1)],
            }]
        );
    }

    #[test]
    fn test_cells_without_chains() {
        let records = vec![
            rec("A", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRB, 0, ""),
            rec("C", Locus::IGH, 0, "CARDY"),
        ];
        let cfg = config(ReceptorArms::Any, LocusPolicy::Partial).with_loci(&[Locus::TRB]);
        let table = resolve(&records, &cfg);
        assert_eq!(clonotypes(&table), vec![Some(0), None, None]);
        assert_eq!(table.clonotype_cluster_of("B"), None);
        assert!(table.get("C").unwrap().receptor.is_empty());
        assert_eq!(table.n_without_clonotype(), 2);
        assert_eq!(table.clonotype_of("nobody"), None);
    }

    #[test]
    fn test_clonotype_clusters() {
        let records = vec![
            rec("A", Locus::TRA, 0, "CAVRD"),
            rec("A", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRA, 0, "CAVRD"),
            rec("B", Locus::TRB, 0, "CWWWW"),
            rec("C", Locus::TRA, 0, "CAAAA"),
            rec("C", Locus::TRB, 0, "CQQQQ"),
            rec("D", Locus::TRA, 0, "CAVRD"),
            rec("D", Locus::TRB, 0, "CASSL"),
        ];
        let cfg = config(ReceptorArms::All, LocusPolicy::Strict);
        let table = resolve(&records, &cfg);
        assert_eq!(clonotypes(&table), vec![Some(0), Some(1), Some(2), Some(0)]);
        let clusters: Vec<_> = table.cells().iter().map(|c| c.clonotype_cluster_id).collect();
        assert_eq!(clusters, vec![Some(0), Some(0), Some(1), Some(0)]);
        assert_eq!(table.n_clonotype_clusters, 2);
        assert_eq!(table.clonotype_sizes(), vec![2, 1, 1]);
        assert_eq!(table.size_histogram(), BTreeMap::from([(1, 2), (2, 1)]));

        let off = ClonotypeConfig {
            clonotype_clusters: false,
            ..cfg
        };
        let table = resolve(&records, &off);
        assert_eq!(table.n_clonotype_clusters, 0);
        assert!(table.cells().iter().all(|c| c.clonotype_cluster_id.is_none()));
    }

    #[test]
    fn test_same_v_gene() {
        let records = vec![
            rec("A", Locus::TRB, 0, "CASSL").with_v_gene("TRBV5-1"),
            rec("B", Locus::TRB, 0, "CASSL").with_v_gene("TRBV7-2"),
            rec("C", Locus::TRB, 0, "CASSL"),
            rec("D", Locus::TRB, 0, "CASSL"),
        ];
        let cfg = config(ReceptorArms::Any, LocusPolicy::Partial);
        let table = resolve(&records, &cfg);
        assert_eq!(table.n_clonotypes, 1);
        let cfg = ClonotypeConfig {
            same_v_gene: true,
            ..cfg
        };
        let table = resolve(&records, &cfg);
        assert_eq!(clonotypes(&table), vec![Some(0), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn test_single_linkage_and_numbering() {
        let records = vec![
            rec("X", Locus::TRB, 0, "CQQQQ"),
            rec("A", Locus::TRA, 0, "CAVRD"),
            rec("B", Locus::TRA, 0, "CAVRD"),
            rec("B", Locus::TRB, 0, "CASSL"),
            rec("C", Locus::TRB, 0, "CASSL"),
        ];
        let cfg = config(ReceptorArms::Any, LocusPolicy::Partial);
        let table = resolve(&records, &cfg);
        // A and C share no chain but are linked through B.
        assert_eq!(clonotypes(&table), vec![Some(0), Some(1), Some(1), Some(1)]);
        assert_eq!(table, resolve(&records, &cfg));
    }

    #[test]
    fn test_levenshtein_clusters_feed_clonotypes() {
        let records = vec![
            rec("A", Locus::TRB, 0, "CASSL"),
            rec("B", Locus::TRB, 0, "CASSI"),
            rec("C", Locus::TRB, 0, "CWWWW"),
        ];
        let cfg =
            ClonotypeConfig::new(MetricSpec::Levenshtein, ReceptorArms::All, LocusPolicy::Strict)
                .with_cutoff(1);
        let table = resolve(&records, &cfg);
        assert_eq!(clonotypes(&table), vec![Some(0), Some(0), Some(1)]);
        assert_eq!(table.get("B").unwrap().receptor[0].clusters, vec![(0, 0)]);
    }

    /// Pairwise match decision, used as a reference for the bucketed joins.
    fn profiles_match(
        a: &[ProfileChain],
        b: &[ProfileChain],
        arms: ReceptorArms,
        policy: LocusPolicy,
    ) -> bool {
        let slots = |p: &[ProfileChain]| p.iter().map(|c| c.slot).dedup().collect_vec();
        if policy == LocusPolicy::Strict && slots(a) != slots(b) {
            return false;
        }
        let at = |p: &[ProfileChain], x: &ProfileChain| {
            p.iter()
                .find(|y| y.slot == x.slot && y.rank == x.rank)
                .map(|y| y.key)
        };
        match arms {
            ReceptorArms::Any => a
                .iter()
                .any(|x| b.iter().any(|y| x.slot == y.slot && x.key == y.key)),
            ReceptorArms::All => {
                if policy == LocusPolicy::Strict
                    && (a.iter().any(|x| at(b, x).is_none())
                        || b.iter().any(|y| at(a, y).is_none()))
                {
                    return false;
                }
                let shared = a.iter().filter_map(|x| at(b, x).map(|k| (x.key, k)));
                let mut compared = 0;
                for (ka, kb) in shared {
                    if ka != kb {
                        return false;
                    }
                    compared += 1;
                }
                compared > 0
            }
        }
    }

    fn arb_profile() -> impl Strategy<Value = Profile> {
        prop::collection::btree_map(
            (0u8..3, 0u8..2),
            (0u32..3, prop::option::of(0u32..2)),
            1..5,
        )
        .prop_map(|chains| {
            chains
                .into_iter()
                .map(|((slot, rank), (cluster, v_gene))| ProfileChain {
                    slot,
                    rank,
                    key: ChainKey { cluster, v_gene },
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]
        #[test]
        fn prop_joins_agree_with_pairwise_matching(
            profiles in prop::collection::vec(arb_profile(), 0..40)
        ) {
            let distinct = profiles.iter().unique().collect_vec();
            for arms in [ReceptorArms::All, ReceptorArms::Any] {
                for policy in [LocusPolicy::Partial, LocusPolicy::Strict] {
                    let mut pairwise = EquivRel::new(distinct.len() as u32);
                    for (i, a) in distinct.iter().enumerate() {
                        for (j, b) in distinct.iter().enumerate().skip(i + 1) {
                            if profiles_match(a, b, arms, policy) {
                                pairwise.join(i, j);
                            }
                        }
                    }
                    let bucketed = join_matching(&distinct, arms, policy);
                    prop_assert_eq!(bucketed.dense_labels(), pairwise.dense_labels());
                }
            }
        }
    }

    /// A junction unique to `i`.
    fn unique_junction(mut i: usize) -> String {
        const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
        let mut junction = String::from("CA");
        loop {
            junction.push(RESIDUES[i % RESIDUES.len()] as char);
            i /= RESIDUES.len();
            if i == 0 {
                break;
            }
        }
        junction.push('F');
        junction
    }

    #[test]
    fn test_many_cells_sharing_one_chain() {
        let n = 2000;
        let mut records = Vec::new();
        for i in 0..n {
            let cell = format!("cell{i}");
            records.push(rec(&cell, Locus::TRA, 0, &unique_junction(i)));
            records.push(rec(&cell, Locus::TRB, 0, "CASSLGQAYEQYF"));
        }
        let cfg = config(ReceptorArms::All, LocusPolicy::Partial);
        // Shared beta but different alpha: no two cells agree.
        let table = resolve(&records, &cfg);
        assert_eq!(table.n_clonotypes, n as u32);
        assert_eq!(table.n_clonotype_clusters, 1);

        // A beta-only cell agrees with each of them.
        records.push(rec("beta_only", Locus::TRB, 0, "CASSLGQAYEQYF"));
        let table = resolve(&records, &cfg);
        assert_eq!(table.n_clonotypes, 1);
        assert_eq!(table.clonotype_sizes(), vec![n + 1]);

        let any = resolve(&records, &config(ReceptorArms::Any, LocusPolicy::Strict));
        assert_eq!(any.n_clonotypes, 2);
        assert_eq!(any.clonotype_of("beta_only"), Some(1));
    }

    #[test]
    fn test_lookup_by_cell_id() {
        let records = (0..300)
            .map(|i| rec(&format!("c{i}"), Locus::TRB, 0, &unique_junction(i % 7)))
            .collect_vec();
        let table = resolve(&records, &config(ReceptorArms::Any, LocusPolicy::Partial));
        assert_eq!(table.cells().len(), 300);
        for (row, cell) in table.cells().iter().enumerate() {
            assert_eq!(table.get(&format!("c{row}")), Some(cell));
            assert_eq!(cell.clonotype_id, Some((row % 7) as u32));
        }
        assert_eq!(table.get("c300"), None);
    }
}
