// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Immutable columnar structure model: atoms grouped into residues grouped
//! into chains.
//!
//! All per-level fields are random-access columns; the atom-to-residue and
//! residue-to-chain relations are ascending offset arrays (segment
//! boundaries), not back-pointers. Sequence numbers and insertion codes may
//! be explicitly absent (`None`), which is distinct from a value of `0` or
//! an empty string.
//!
//! # Examples
//! ~~~
//! use annomol::Structure;
//!
//! let mut builder = Structure::builder();
//! builder.chain("1", "A", "A");
//! builder.residue(Some(1), Some(1), None);
//! builder.atom("N", "N", "N");
//! builder.atom("CA", "CA", "C");
//! let structure = builder.build().unwrap();
//!
//! assert_eq!(structure.atom_count(), 2);
//! assert_eq!(structure.chain_atoms(0), 0..2);
//! ~~~

use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use derive_getters::Getters;

static NEXT_STRUCTURE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a structure model.
///
/// Caches are keyed by identity, not content. Two structures built from the
/// same data get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructureId(u64);

impl StructureId {
    fn fresh() -> Self {
        Self(NEXT_STRUCTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-chain identifier columns and residue segmentation.
#[derive(Debug, Clone, Getters)]
pub struct ChainTable {
    /// Entity identifier of each chain.
    entity_id: Vec<String>,
    /// Primary asymmetric-unit identifier of each chain.
    asym_id: Vec<String>,
    /// Author-assigned asymmetric-unit identifier of each chain.
    auth_asym_id: Vec<String>,
    /// Chain `c` owns residues `residue_offsets[c]..residue_offsets[c + 1]`.
    residue_offsets: Vec<usize>,
}

/// Per-residue identifier columns and atom segmentation.
#[derive(Debug, Clone, Getters)]
pub struct ResidueTable {
    /// Primary sequence number, if assigned.
    seq_id: Vec<Option<i32>>,
    /// Author sequence number, if assigned.
    auth_seq_id: Vec<Option<i32>>,
    /// Insertion code, if assigned.
    ins_code: Vec<Option<String>>,
    /// Residue `r` owns atoms `atom_offsets[r]..atom_offsets[r + 1]`.
    atom_offsets: Vec<usize>,
}

/// Per-atom identifier columns.
#[derive(Debug, Clone, Getters)]
pub struct AtomTable {
    /// Primary atom name.
    name: Vec<String>,
    /// Author atom name.
    auth_name: Vec<String>,
    /// Element symbol.
    element: Vec<String>,
    /// Unique numeric atom id.
    id: Vec<i64>,
    /// 0-based index of the atom in its source file.
    source_index: Vec<usize>,
}

/// Hierarchical structure model, immutable once built.
#[derive(Debug)]
pub struct Structure {
    id: StructureId,
    chains: ChainTable,
    residues: ResidueTable,
    atoms: AtomTable,
}

impl Structure {
    /// Start building a structure.
    #[must_use]
    pub fn builder() -> StructureBuilder {
        StructureBuilder::default()
    }

    /// Process-unique identity used as cache key.
    #[inline(always)]
    pub fn id(&self) -> StructureId {
        self.id
    }

    #[inline(always)]
    pub fn chains(&self) -> &ChainTable {
        &self.chains
    }

    #[inline(always)]
    pub fn residues(&self) -> &ResidueTable {
        &self.residues
    }

    #[inline(always)]
    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn chain_count(&self) -> usize {
        self.chains.entity_id.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.seq_id.len()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.id.len()
    }

    /// Residue positions owned by a chain.
    pub fn chain_residues(&self, chain: usize) -> Range<usize> {
        self.chains.residue_offsets[chain]..self.chains.residue_offsets[chain + 1]
    }

    /// Atom positions owned by a residue.
    pub fn residue_atoms(&self, residue: usize) -> Range<usize> {
        self.residues.atom_offsets[residue]..self.residues.atom_offsets[residue + 1]
    }

    /// Atom positions owned by a chain.
    pub fn chain_atoms(&self, chain: usize) -> Range<usize> {
        let residues = self.chain_residues(chain);
        self.residues.atom_offsets[residues.start]..self.residues.atom_offsets[residues.end]
    }

    /// Position of the residue owning an atom, by binary search on the
    /// segment boundaries.
    pub fn residue_of_atom(&self, atom: usize) -> usize {
        self.residues.atom_offsets.partition_point(|&o| o <= atom) - 1
    }

    /// Position of the chain owning a residue.
    pub fn chain_of_residue(&self, residue: usize) -> usize {
        self.chains.residue_offsets.partition_point(|&o| o <= residue) - 1
    }

    /// Position of the chain owning an atom.
    pub fn chain_of_atom(&self, atom: usize) -> usize {
        self.chain_of_residue(self.residue_of_atom(atom))
    }
}

/// Incremental builder for [`Structure`].
///
/// Chains, residues, and atoms are appended in order; each residue belongs to
/// the most recently added chain and each atom to the most recently added
/// residue. Atom ids default to 1-based sequential and source indices to
/// 0-based sequential; both can be set explicitly with
/// [`StructureBuilder::atom_with_ids`].
#[derive(Debug, Default)]
pub struct StructureBuilder {
    entity_id: Vec<String>,
    asym_id: Vec<String>,
    auth_asym_id: Vec<String>,
    residue_starts: Vec<usize>,
    seq_id: Vec<Option<i32>>,
    auth_seq_id: Vec<Option<i32>>,
    ins_code: Vec<Option<String>>,
    atom_starts: Vec<usize>,
    name: Vec<String>,
    auth_name: Vec<String>,
    element: Vec<String>,
    id: Vec<i64>,
    source_index: Vec<usize>,
    orphan: bool,
}

impl StructureBuilder {
    /// Append a chain.
    pub fn chain(&mut self, entity_id: &str, asym_id: &str, auth_asym_id: &str) -> &mut Self {
        self.residue_starts.push(self.seq_id.len());
        self.entity_id.push(entity_id.to_string());
        self.asym_id.push(asym_id.to_string());
        self.auth_asym_id.push(auth_asym_id.to_string());
        self
    }

    /// Append a residue to the current chain.
    pub fn residue(
        &mut self,
        seq_id: Option<i32>,
        auth_seq_id: Option<i32>,
        ins_code: Option<&str>,
    ) -> &mut Self {
        if self.residue_starts.is_empty() {
            self.orphan = true;
        }
        self.atom_starts.push(self.id.len());
        self.seq_id.push(seq_id);
        self.auth_seq_id.push(auth_seq_id);
        self.ins_code.push(ins_code.map(str::to_string));
        self
    }

    /// Append an atom to the current residue with sequential id and source index.
    pub fn atom(&mut self, name: &str, auth_name: &str, element: &str) -> &mut Self {
        let id = self.id.len() as i64 + 1;
        let source_index = self.source_index.len();
        self.atom_with_ids(name, auth_name, element, id, source_index)
    }

    /// Append an atom to the current residue with explicit id and source index.
    pub fn atom_with_ids(
        &mut self,
        name: &str,
        auth_name: &str,
        element: &str,
        id: i64,
        source_index: usize,
    ) -> &mut Self {
        if self.atom_starts.is_empty() {
            self.orphan = true;
        }
        self.name.push(name.to_string());
        self.auth_name.push(auth_name.to_string());
        self.element.push(element.to_string());
        self.id.push(id);
        self.source_index.push(source_index);
        self
    }

    /// Finish building, validating the segmentation and id uniqueness.
    pub fn build(self) -> anyhow::Result<Structure> {
        if self.orphan {
            anyhow::bail!("residue added before any chain, or atom added before any residue");
        }
        let mut seen_ids = HashSet::new();
        if let Some(id) = self.id.iter().find(|id| !seen_ids.insert(**id)) {
            anyhow::bail!("duplicate atom id {id}");
        }
        let mut seen_sources = HashSet::new();
        if let Some(idx) = self.source_index.iter().find(|i| !seen_sources.insert(**i)) {
            anyhow::bail!("duplicate atom source index {idx}");
        }

        let mut residue_offsets = self.residue_starts;
        residue_offsets.push(self.seq_id.len());
        let mut atom_offsets = self.atom_starts;
        atom_offsets.push(self.id.len());

        Ok(Structure {
            id: StructureId::fresh(),
            chains: ChainTable {
                entity_id: self.entity_id,
                asym_id: self.asym_id,
                auth_asym_id: self.auth_asym_id,
                residue_offsets,
            },
            residues: ResidueTable {
                seq_id: self.seq_id,
                auth_seq_id: self.auth_seq_id,
                ins_code: self.ins_code,
                atom_offsets,
            },
            atoms: AtomTable {
                name: self.name,
                auth_name: self.auth_name,
                element: self.element,
                id: self.id,
                source_index: self.source_index,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_chains() -> Structure {
        let mut builder = Structure::builder();
        builder.chain("1", "A", "A");
        builder.residue(Some(1), Some(1), None);
        builder.atom("N", "N", "N");
        builder.atom("CA", "CA", "C");
        builder.residue(Some(2), Some(2), None);
        builder.atom("CA", "CA", "C");
        builder.chain("1", "B", "B");
        builder.residue(Some(1), Some(5), Some("A"));
        builder.atom("CA", "CA", "C");
        builder.build().unwrap()
    }

    #[test]
    fn segmentation() {
        let s = two_chains();
        assert_eq!(s.chain_count(), 2);
        assert_eq!(s.residue_count(), 3);
        assert_eq!(s.atom_count(), 4);
        assert_eq!(s.chain_residues(0), 0..2);
        assert_eq!(s.chain_residues(1), 2..3);
        assert_eq!(s.chain_atoms(0), 0..3);
        assert_eq!(s.chain_atoms(1), 3..4);
        assert_eq!(s.residue_atoms(1), 2..3);
    }

    #[test]
    fn reverse_lookup() {
        let s = two_chains();
        assert_eq!(s.residue_of_atom(0), 0);
        assert_eq!(s.residue_of_atom(2), 1);
        assert_eq!(s.residue_of_atom(3), 2);
        assert_eq!(s.chain_of_residue(1), 0);
        assert_eq!(s.chain_of_atom(3), 1);
    }

    #[test]
    fn sequential_ids() {
        let s = two_chains();
        assert_eq!(s.atoms().id(), &[1, 2, 3, 4]);
        assert_eq!(s.atoms().source_index(), &[0, 1, 2, 3]);
    }

    #[test]
    fn absent_fields_are_tracked() {
        let mut builder = Structure::builder();
        builder.chain("1", "A", "A");
        builder.residue(Some(0), None, None);
        builder.atom("CA", "CA", "C");
        let s = builder.build().unwrap();
        assert_eq!(s.residues().seq_id()[0], Some(0));
        assert_eq!(s.residues().auth_seq_id()[0], None);
        assert_eq!(s.residues().ins_code()[0], None);
    }

    #[test]
    fn orphan_residue_rejected() {
        let mut builder = Structure::builder();
        builder.residue(Some(1), Some(1), None);
        assert!(builder.build().is_err());
    }

    #[test]
    fn duplicate_atom_id_rejected() {
        let mut builder = Structure::builder();
        builder.chain("1", "A", "A");
        builder.residue(Some(1), Some(1), None);
        builder.atom_with_ids("N", "N", "N", 7, 0);
        builder.atom_with_ids("CA", "CA", "C", 7, 1);
        assert!(builder.build().is_err());
    }

    #[test]
    fn fresh_identity_per_build() {
        let a = two_chains();
        let b = two_chains();
        assert_ne!(a.id(), b.id());
    }
}
