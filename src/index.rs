// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Per-structure auxiliary lookup tables, built once and reused across
//! arbitrarily many rows.

use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use itertools::Itertools;

use crate::structure::{Structure, StructureId};

/// Residues of one chain ordered by a sequence-number column, with the
/// parallel sorted values enabling binary search. Residues lacking the
/// column value are excluded from the ordering, not given a sentinel.
#[derive(Debug, Clone, Default)]
pub(crate) struct SortedResidues {
    /// Residue positions sorted by (value, position).
    positions: Vec<usize>,
    /// Parallel sorted values.
    values: Vec<i32>,
}

impl SortedResidues {
    fn build(span: Range<usize>, column: &[Option<i32>]) -> Self {
        let mut pairs: Vec<(i32, usize)> = span
            .filter_map(|residue| column[residue].map(|value| (value, residue)))
            .collect();
        pairs.sort_unstable();
        Self {
            values: pairs.iter().map(|&(value, _)| value).collect(),
            positions: pairs.into_iter().map(|(_, residue)| residue).collect(),
        }
    }

    /// Residue positions whose value equals `value`, ascending.
    pub(crate) fn equal_range(&self, value: i32) -> &[usize] {
        let lo = self.values.partition_point(|&v| v < value);
        let hi = self.values.partition_point(|&v| v <= value);
        &self.positions[lo..hi]
    }

    /// Residue positions whose value lies within the inclusive bounds; an
    /// absent bound is unbounded on that side.
    pub(crate) fn bounded_range(&self, beg: Option<i32>, end: Option<i32>) -> &[usize] {
        let lo = beg.map_or(0, |b| self.values.partition_point(|&v| v < b));
        let hi = end.map_or(self.values.len(), |e| self.values.partition_point(|&v| v <= e));
        if lo >= hi {
            &[]
        } else {
            &self.positions[lo..hi]
        }
    }
}

/// Residues of one chain grouped by insertion code.
#[derive(Debug, Clone, Default)]
struct InsCodeGroups {
    coded: HashMap<String, Vec<usize>>,
    none: Vec<usize>,
}

/// Auxiliary lookup tables for one structure.
///
/// Construction is O(chains + residues·log(residues) + atoms); build it at
/// most once per structure via [`IndexCache`] and reuse it for every row.
#[derive(Debug)]
pub struct StructuralIndex {
    chains_by_entity: HashMap<String, Vec<usize>>,
    chains_by_asym: HashMap<String, Vec<usize>>,
    chains_by_auth_asym: HashMap<String, Vec<usize>>,
    by_seq: Vec<SortedResidues>,
    by_auth_seq: Vec<SortedResidues>,
    by_ins_code: Vec<InsCodeGroups>,
    atoms_by_id: HashMap<i64, usize>,
    atoms_by_source: HashMap<usize, usize>,
}

impl StructuralIndex {
    /// Build the index for a structure.
    #[must_use]
    pub fn new(structure: &Structure) -> Self {
        let chains = structure.chains();
        let chain_range = 0..structure.chain_count();

        let chains_by_entity = chain_range
            .clone()
            .map(|c| (chains.entity_id()[c].clone(), c))
            .into_group_map();
        let chains_by_asym = chain_range
            .clone()
            .map(|c| (chains.asym_id()[c].clone(), c))
            .into_group_map();
        let chains_by_auth_asym = chain_range
            .clone()
            .map(|c| (chains.auth_asym_id()[c].clone(), c))
            .into_group_map();

        let residues = structure.residues();
        let mut by_seq = Vec::with_capacity(structure.chain_count());
        let mut by_auth_seq = Vec::with_capacity(structure.chain_count());
        let mut by_ins_code = Vec::with_capacity(structure.chain_count());
        for chain in 0..structure.chain_count() {
            let span = structure.chain_residues(chain);
            by_seq.push(SortedResidues::build(span.clone(), residues.seq_id()));
            by_auth_seq.push(SortedResidues::build(span.clone(), residues.auth_seq_id()));

            let mut groups = InsCodeGroups::default();
            for residue in span {
                match &residues.ins_code()[residue] {
                    Some(code) => groups.coded.entry(code.clone()).or_default().push(residue),
                    None => groups.none.push(residue),
                }
            }
            by_ins_code.push(groups);
        }

        let atoms = structure.atoms();
        let mut atoms_by_id = HashMap::with_capacity(structure.atom_count());
        let mut atoms_by_source = HashMap::with_capacity(structure.atom_count());
        for atom in 0..structure.atom_count() {
            atoms_by_id.insert(atoms.id()[atom], atom);
            atoms_by_source.insert(atoms.source_index()[atom], atom);
        }

        Self {
            chains_by_entity,
            chains_by_asym,
            chains_by_auth_asym,
            by_seq,
            by_auth_seq,
            by_ins_code,
            atoms_by_id,
            atoms_by_source,
        }
    }

    /// Chain positions sharing an entity id, ascending.
    #[must_use]
    pub fn chains_by_entity(&self, value: &str) -> &[usize] {
        self.chains_by_entity.get(value).map_or(&[], Vec::as_slice)
    }

    /// Chain positions sharing a primary asym id, ascending.
    #[must_use]
    pub fn chains_by_asym(&self, value: &str) -> &[usize] {
        self.chains_by_asym.get(value).map_or(&[], Vec::as_slice)
    }

    /// Chain positions sharing an author asym id, ascending.
    #[must_use]
    pub fn chains_by_auth_asym(&self, value: &str) -> &[usize] {
        self.chains_by_auth_asym.get(value).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn seq_ordering(&self, chain: usize) -> &SortedResidues {
        &self.by_seq[chain]
    }

    pub(crate) fn auth_seq_ordering(&self, chain: usize) -> &SortedResidues {
        &self.by_auth_seq[chain]
    }

    /// Residue positions of a chain with the given insertion code
    /// (`None` = no insertion code), ascending.
    #[must_use]
    pub fn residues_with_ins_code(&self, chain: usize, code: Option<&str>) -> &[usize] {
        let groups = &self.by_ins_code[chain];
        match code {
            Some(code) => groups.coded.get(code).map_or(&[], Vec::as_slice),
            None => &groups.none,
        }
    }

    /// Atom position by unique atom id.
    #[must_use]
    pub fn atom_by_id(&self, id: i64) -> Option<usize> {
        self.atoms_by_id.get(&id).copied()
    }

    /// Atom position by 0-based source-file index.
    #[must_use]
    pub fn atom_by_source(&self, source_index: usize) -> Option<usize> {
        self.atoms_by_source.get(&source_index).copied()
    }
}

/// Caller-owned cache of structural indices, keyed by structure identity.
///
/// Values are computed on first access and never invalidated automatically;
/// a caller that replaces a structure model gets a fresh identity and thus a
/// fresh index, while in-place mutation behind the same identity would
/// observe stale entries. Eviction is explicit via [`IndexCache::remove`].
#[derive(Debug, Default)]
pub struct IndexCache {
    entries: HashMap<StructureId, Rc<StructuralIndex>>,
}

impl IndexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached index for the structure, building it on first access.
    pub fn get_or_build(&mut self, structure: &Structure) -> Rc<StructuralIndex> {
        let entry = self.entries.entry(structure.id()).or_insert_with(|| {
            log::debug!("building structural index for {:?}", structure.id());
            Rc::new(StructuralIndex::new(structure))
        });
        Rc::clone(entry)
    }

    /// Drop the cached index for a structure, if any.
    pub fn remove(&mut self, id: StructureId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
