// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Sequence index: per-locus catalogs of unique junctions.
//
// Catalog indices are assigned in input record order, so they are stable for a
// given input.  Cells are numbered by first occurrence of their id.  A chain whose
// junction is missing or empty does not enter the catalog; its cell is listed as a
// no-chain cell of that locus instead.

use crate::config::ErrorMode;
use crate::error::{ClonotypeError, RecordError, RecordErrorKind};
use fxhash::FxHashMap;
use itertools::Itertools;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use vdj_types::{first_non_amino_acid, ChainRecord, Locus};

/// Dense index of a cell in a `SequenceIndex`.
pub type CellIdx = u32;

/// One chain carrying a catalogued junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainRef {
    pub cell: CellIdx,
    pub rank: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub junction: String,
    /// Chains with this junction, in input order.
    pub chains: Vec<ChainRef>,
}

/// Unique junctions of one locus.
#[derive(Debug, Clone, Serialize)]
pub struct LocusCatalog {
    locus: Locus,
    entries: Vec<CatalogEntry>,
    #[serde(skip)]
    lookup: FxHashMap<String, u32>,
    no_chain_cells: Vec<CellIdx>,
}

impl LocusCatalog {
    fn new(locus: Locus) -> Self {
        LocusCatalog {
            locus,
            entries: Vec::new(),
            lookup: FxHashMap::default(),
            no_chain_cells: Vec::new(),
        }
    }

    fn insert(&mut self, junction: &str, chain: ChainRef) -> u32 {
        let next = self.entries.len() as u32;
        let index = *self.lookup.entry(junction.to_string()).or_insert(next);
        if index == next {
            self.entries.push(CatalogEntry {
                junction: junction.to_string(),
                chains: Vec::new(),
            });
        }
        self.entries[index as usize].chains.push(chain);
        index
    }

    /// Cells must be marked in ascending order, each at most once.
    fn mark_no_chain(&mut self, cell: CellIdx) {
        debug_assert!(self.no_chain_cells.last().map_or(true, |&last| last < cell));
        self.no_chain_cells.push(cell);
    }

    pub fn locus(&self) -> Locus {
        self.locus
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, index: u32) -> &CatalogEntry {
        &self.entries[index as usize]
    }

    /// Junctions in catalog order.
    pub fn junctions(&self) -> Vec<&[u8]> {
        self.entries.iter().map(|e| e.junction.as_bytes()).collect()
    }

    /// Cells with a chain of this locus but no usable junction, in cell order.
    pub fn no_chain_cells(&self) -> &[CellIdx] {
        &self.no_chain_cells
    }
}

/// A chain of one cell, resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedChain {
    pub locus: Locus,
    pub rank: u8,
    /// Catalog index of the junction, None if the junction is missing.
    pub entry: Option<u32>,
    pub v_gene: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedCell {
    pub cell_id: String,
    /// Chains sorted by locus, then rank.
    pub chains: Vec<IndexedChain>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceIndex {
    cells: Vec<IndexedCell>,
    catalogs: BTreeMap<Locus, LocusCatalog>,
    rejected: Vec<RecordError>,
    n_records: usize,
}

fn check_record(
    pos: usize,
    rec: &ChainRecord,
    max_chains: u8,
    seen: &mut Vec<(Locus, u8)>,
) -> Option<RecordError> {
    let fail = |kind| {
        Some(RecordError {
            record: pos,
            cell_id: rec.cell_id.clone(),
            locus: rec.locus,
            kind,
        })
    };
    if rec.cell_id.is_empty() {
        return fail(RecordErrorKind::MissingCellId);
    }
    if rec.chain_rank >= max_chains {
        return fail(RecordErrorKind::RankExceedsMaximum {
            rank: rec.chain_rank,
            max_chains,
        });
    }
    if seen.contains(&(rec.locus, rec.chain_rank)) {
        return fail(RecordErrorKind::DuplicateRank {
            rank: rec.chain_rank,
        });
    }
    seen.push((rec.locus, rec.chain_rank));
    if let Some(junction) = rec.junction() {
        if let Some(position) = first_non_amino_acid(junction.as_bytes()) {
            return fail(RecordErrorKind::InvalidJunction {
                position,
                residue: junction[position..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            });
        }
    }
    None
}

impl SequenceIndex {
    /// Validate the records and catalog their junctions.
    ///
    /// In strict mode the malformed record that comes first in the input is
    /// returned as an error.  In permissive mode every cell with a malformed
    /// record is dropped as a whole and the errors are kept for reporting.
    pub fn build(
        records: &[ChainRecord],
        max_chains: u8,
        mode: ErrorMode,
    ) -> Result<SequenceIndex, ClonotypeError> {
        // Group records by cell and validate each cell.

        let mut cell_of_id = FxHashMap::<&str, usize>::default();
        let mut groups = Vec::<Vec<usize>>::new();
        let mut rejected = Vec::<RecordError>::new();
        for (pos, rec) in records.iter().enumerate() {
            if rec.cell_id.is_empty() {
                rejected.extend(check_record(pos, rec, max_chains, &mut Vec::new()));
                continue;
            }
            let g = *cell_of_id.entry(rec.cell_id.as_str()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(pos);
        }
        let mut bad_group = vec![false; groups.len()];
        for (g, members) in groups.iter().enumerate() {
            let mut seen = Vec::new();
            for &pos in members {
                if let Some(err) = check_record(pos, &records[pos], max_chains, &mut seen) {
                    rejected.push(err);
                    bad_group[g] = true;
                }
            }
        }
        rejected.sort_by_key(|e| e.record);
        if let Some(first) = rejected.first() {
            match mode {
                ErrorMode::Strict => return Err(first.clone().into()),
                ErrorMode::Permissive => warn!(
                    "excluding {} cells with {} malformed records",
                    bad_group.iter().filter(|b| **b).count(),
                    rejected.len()
                ),
            }
        }

        // Catalog the good cells, in record order.

        let mut cell_idx = vec![None; groups.len()];
        let mut cells = Vec::<IndexedCell>::new();
        let mut catalogs = BTreeMap::<Locus, LocusCatalog>::new();
        for rec in records {
            let Some(&g) = cell_of_id.get(rec.cell_id.as_str()) else {
                continue;
            };
            if bad_group[g] {
                continue;
            }
            let cell = *cell_idx[g].get_or_insert_with(|| {
                cells.push(IndexedCell {
                    cell_id: rec.cell_id.clone(),
                    chains: Vec::new(),
                });
                (cells.len() - 1) as CellIdx
            });
            let catalog = catalogs
                .entry(rec.locus)
                .or_insert_with(|| LocusCatalog::new(rec.locus));
            let entry = rec.junction().map(|junction| {
                catalog.insert(
                    junction,
                    ChainRef {
                        cell,
                        rank: rec.chain_rank,
                    },
                )
            });
            cells[cell as usize].chains.push(IndexedChain {
                locus: rec.locus,
                rank: rec.chain_rank,
                entry,
                v_gene: rec.v_gene.clone(),
            });
        }
        for cell in &mut cells {
            cell.chains.sort_by_key(|c| (c.locus, c.rank));
        }

        // A cell is a no-chain cell of a locus when none of its chains there has a
        // junction.

        for (cell, indexed) in cells.iter().enumerate() {
            for (locus, mut chains) in &indexed.chains.iter().group_by(|c| c.locus) {
                if chains.all(|c| c.entry.is_none()) {
                    if let Some(catalog) = catalogs.get_mut(&locus) {
                        catalog.mark_no_chain(cell as CellIdx);
                    }
                }
            }
        }

        Ok(SequenceIndex {
            cells,
            catalogs,
            rejected,
            n_records: records.len(),
        })
    }

    pub fn cells(&self) -> &[IndexedCell] {
        &self.cells
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Catalog of a locus, if any record carried it.
    pub fn catalog(&self, locus: Locus) -> Option<&LocusCatalog> {
        self.catalogs.get(&locus)
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &LocusCatalog> {
        self.catalogs.values()
    }

    /// Loci seen in the input, in `Locus` order.
    pub fn loci(&self) -> Vec<Locus> {
        self.catalogs.keys().copied().collect()
    }

    /// Records rejected in permissive mode, in input order.
    pub fn rejected(&self) -> &[RecordError] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(cell: &str, locus: Locus, rank: u8, junction: &str) -> ChainRecord {
        ChainRecord::new(cell, locus, rank, junction)
    }

    #[test]
    fn test_dedup_per_locus() {
        let records = vec![
            rec("c1", Locus::TRB, 0, "CASSL"),
            rec("c2", Locus::TRB, 0, "CASSI"),
            rec("c2", Locus::TRA, 0, "CASSL"),
            rec("c3", Locus::TRB, 0, "CASSL"),
        ];
        let index = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap();
        let trb = index.catalog(Locus::TRB).unwrap();
        assert_eq!(trb.junctions(), vec![b"CASSL".as_slice(), b"CASSI".as_slice()]);
        assert_eq!(
            trb.entry(0).chains,
            vec![ChainRef { cell: 0, rank: 0 }, ChainRef { cell: 2, rank: 0 }]
        );
        // Same string on another locus gets its own index space.
        let tra = index.catalog(Locus::TRA).unwrap();
        assert_eq!(tra.junctions(), vec![b"CASSL".as_slice()]);
        assert_eq!(index.loci(), vec![Locus::TRA, Locus::TRB]);
        assert_eq!(index.cells().len(), 3);
        assert_eq!(index.cells()[1].chains[0].locus, Locus::TRA);
    }

    #[test]
    fn test_no_chain_cells() {
        let mut missing = rec("c2", Locus::TRA, 0, "");
        missing.junction_aa = None;
        let records = vec![
            rec("c1", Locus::TRA, 0, "CAVRD"),
            missing,
            rec("c2", Locus::TRA, 1, ""),
            rec("c2", Locus::TRB, 0, "CASSL"),
        ];
        let index = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap();
        let tra = index.catalog(Locus::TRA).unwrap();
        assert_eq!(tra.len(), 1);
        assert_eq!(tra.no_chain_cells(), &[1]);
        assert_eq!(index.cells()[1].chains[0].entry, None);
        assert_eq!(index.cells()[1].chains[2].entry, Some(0));
    }

    #[test]
    fn test_no_chain_needs_every_chain_missing() {
        let mut empty_second = rec("c1", Locus::TRA, 1, "");
        empty_second.junction_aa = None;
        let mut only_empty = rec("c2", Locus::TRA, 0, "");
        only_empty.junction_aa = None;
        let records = vec![
            rec("c1", Locus::TRA, 0, "CAVRD"),
            empty_second,
            rec("c1", Locus::TRB, 0, "CASSL"),
            only_empty,
        ];
        let index = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap();
        // c1 has a TRA junction at rank 0, so an empty rank 1 does not count.
        assert_eq!(index.catalog(Locus::TRA).unwrap().no_chain_cells(), &[1]);
        assert!(index.catalog(Locus::TRB).unwrap().no_chain_cells().is_empty());
    }

    #[test]
    fn test_many_no_chain_cells_listed_once_in_order() {
        let mut records = vec![rec("anchor", Locus::TRB, 0, "CASSL")];
        for i in 0..500 {
            for rank in 0..2 {
                let mut r = rec(&format!("c{i}"), Locus::TRB, rank, "");
                r.junction_aa = None;
                records.push(r);
            }
        }
        let index = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap();
        let no_chain = index.catalog(Locus::TRB).unwrap().no_chain_cells();
        assert_eq!(no_chain, (1..=500).collect::<Vec<CellIdx>>().as_slice());
    }

    #[test]
    fn test_invalid_residue_is_a_whole_character() {
        let records = vec![rec("c1", Locus::TRB, 0, "CASÉL")];
        let err = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap_err();
        match err {
            ClonotypeError::Data(e) => assert_eq!(
                e.kind,
                RecordErrorKind::InvalidJunction {
                    position: 3,
                    residue: 'É'
                }
            ),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_strict_reports_first_error() {
        let records = vec![
            rec("c1", Locus::TRB, 0, "CASSL"),
            rec("c2", Locus::TRB, 3, "CASSL"),
            rec("c1", Locus::TRB, 0, "CASSI"),
        ];
        let err = SequenceIndex::build(&records, 2, ErrorMode::Strict).unwrap_err();
        match err {
            ClonotypeError::Data(e) => {
                assert_eq!(e.record, 1);
                assert_eq!(e.cell_id, "c2");
                assert_eq!(
                    e.kind,
                    RecordErrorKind::RankExceedsMaximum {
                        rank: 3,
                        max_chains: 2
                    }
                );
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_permissive_excludes_cells() {
        let records = vec![
            rec("c1", Locus::TRB, 0, "CASSL"),
            rec("c2", Locus::TRB, 0, "CAS5L"),
            rec("c2", Locus::TRA, 0, "CAVRD"),
            rec("", Locus::TRA, 0, "CAVRD"),
            rec("c3", Locus::TRB, 0, "CASSL"),
            rec("c3", Locus::TRB, 0, "CASSQ"),
            rec("c4", Locus::TRB, 1, "CASSQ"),
        ];
        let index = SequenceIndex::build(&records, 2, ErrorMode::Permissive).unwrap();
        let kinds: Vec<_> = index.rejected().iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                RecordErrorKind::InvalidJunction {
                    position: 3,
                    residue: '5'
                },
                RecordErrorKind::MissingCellId,
                RecordErrorKind::DuplicateRank { rank: 0 },
            ]
        );
        let ids: Vec<_> = index.cells().iter().map(|c| c.cell_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c4"]);
        // The excluded cells left nothing behind in the catalogs.
        assert!(index.catalog(Locus::TRA).is_none());
        assert_eq!(index.catalog(Locus::TRB).unwrap().junctions().len(), 2);
        assert_eq!(index.n_records(), 7);
    }
}
