// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Cascading row matching: one annotation row against one structure.
//!
//! The cascade descends from coarse to fine (chain → residue → atom) and
//! short-circuits as soon as no finer constraint is present, so a row that
//! constrains only chains never pays residue- or atom-level cost. Range
//! emission is always in ascending atom order, satisfying the
//! [`RangeSet`](crate::RangeSet) append invariant.

use crate::index::StructuralIndex;
use crate::rangeset::RangeSet;
use crate::row::Row;
use crate::structure::Structure;

/// How deep the cascade descended for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// No selector field at all: the row covers the whole structure.
    NoFilter,
    /// Only chain-level fields: one range per candidate chain.
    Chain,
    /// Residue-level fields, no atom names: one range per candidate residue.
    Residue,
    /// Atom names or direct atom lookup: per-atom ranges.
    Atom,
}

/// Result of matching one row: the covered ranges and how far the cascade
/// went to produce them.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSelection {
    pub granularity: Granularity,
    pub ranges: RangeSet,
}

/// Atom ranges covered by a row. Thin wrapper over [`match_row`] for callers
/// that do not care about the descent depth.
#[must_use]
pub fn selector_match(row: &Row, structure: &Structure, index: &StructuralIndex) -> RangeSet {
    match_row(row, structure, index).ranges
}

/// Match one row against a structure, cascading from coarse to fine.
#[must_use]
pub fn match_row(row: &Row, structure: &Structure, index: &StructuralIndex) -> RowSelection {
    let present = row.present_fields();

    if present.any_direct() {
        return RowSelection {
            granularity: Granularity::Atom,
            ranges: direct_atom(row, structure, index),
        };
    }

    if present.is_empty() {
        let mut ranges = RangeSet::new();
        ranges.push(0..structure.atom_count());
        return RowSelection {
            granularity: Granularity::NoFilter,
            ranges,
        };
    }

    let chains = chain_candidates(row, structure, index);

    if !present.any_residue() && !present.any_atom_name() {
        let mut ranges = RangeSet::new();
        for chain in chains {
            ranges.push(structure.chain_atoms(chain));
        }
        return RowSelection {
            granularity: Granularity::Chain,
            ranges,
        };
    }

    let mut residues = Vec::new();
    for chain in chains {
        residue_candidates(row, structure, index, chain, &mut residues);
    }

    if !present.any_atom_name() {
        let mut ranges = RangeSet::new();
        for residue in residues {
            ranges.push(structure.residue_atoms(residue));
        }
        return RowSelection {
            granularity: Granularity::Residue,
            ranges,
        };
    }

    let mut ranges = RangeSet::new();
    for residue in residues {
        for atom in structure.residue_atoms(residue) {
            if atom_fields_match(row, structure, atom) {
                ranges.push(atom..atom + 1);
            }
        }
    }
    RowSelection {
        granularity: Granularity::Atom,
        ranges,
    }
}

/// Resolve a row carrying `atom_id` and/or `atom_index` via the atom lookups.
///
/// When both are given they must resolve to the identical atom, otherwise the
/// row matches nothing (a tolerated data inconsistency, not an error). The
/// resolved atom is re-verified against every other field on the row, so the
/// id shortcut cannot silently skip constraints.
///
/// # Panics
/// Panics if neither field is set; [`match_row`] only enters this path when
/// one of them is.
fn direct_atom(row: &Row, structure: &Structure, index: &StructuralIndex) -> RangeSet {
    let by_id = row.atom_id.map(|id| index.atom_by_id(id));
    let by_source = row.atom_index.map(|i| index.atom_by_source(i));
    let atom = match (by_id, by_source) {
        (Some(a), Some(b)) => {
            if a == b {
                a
            } else {
                log::debug!("atom_id and atom_index resolve to different atoms; row matches nothing");
                None
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => panic!("direct atom resolution requires atom_id or atom_index"),
    };
    match atom {
        Some(atom) if row_matches_atom(row, structure, atom) => RangeSet::single(atom..atom + 1),
        _ => RangeSet::new(),
    }
}

/// Candidate chains after intersecting every chain-level grouping present on
/// the row; all chains when no chain field is present. Ascending.
fn chain_candidates(row: &Row, structure: &Structure, index: &StructuralIndex) -> Vec<usize> {
    let mut candidates: Option<Vec<usize>> = None;
    if let Some(entity) = row.entity_id.as_deref() {
        narrow(&mut candidates, index.chains_by_entity(entity));
    }
    if let Some(asym) = row.asym_id.as_deref() {
        narrow(&mut candidates, index.chains_by_asym(asym));
    }
    if let Some(asym) = row.auth_asym_id.as_deref() {
        narrow(&mut candidates, index.chains_by_auth_asym(asym));
    }
    candidates.unwrap_or_else(|| (0..structure.chain_count()).collect())
}

/// Candidate residues of one chain, appended ascending to `out`; the full
/// residue span when no residue field is present.
fn residue_candidates(
    row: &Row,
    structure: &Structure,
    index: &StructuralIndex,
    chain: usize,
    out: &mut Vec<usize>,
) {
    let mut candidates: Option<Vec<usize>> = None;
    if let Some(seq) = row.seq_id {
        narrow(&mut candidates, index.seq_ordering(chain).equal_range(seq));
    }
    if let Some(seq) = row.auth_seq_id {
        narrow(&mut candidates, index.auth_seq_ordering(chain).equal_range(seq));
    }
    if let Some(code) = row.ins_code.as_deref() {
        narrow(&mut candidates, index.residues_with_ins_code(chain, Some(code)));
    }
    if row.beg_seq_id.is_some() || row.end_seq_id.is_some() {
        narrow(
            &mut candidates,
            index.seq_ordering(chain).bounded_range(row.beg_seq_id, row.end_seq_id),
        );
    }
    if row.beg_auth_seq_id.is_some() || row.end_auth_seq_id.is_some() {
        narrow(
            &mut candidates,
            index
                .auth_seq_ordering(chain)
                .bounded_range(row.beg_auth_seq_id, row.end_auth_seq_id),
        );
    }
    match candidates {
        Some(narrowed) => out.extend(narrowed),
        None => out.extend(structure.chain_residues(chain)),
    }
}

/// Intersect a candidate list with a grouping, or seed it from the first
/// applicable grouping. Candidates stay sorted ascending.
fn narrow(candidates: &mut Option<Vec<usize>>, grouping: &[usize]) {
    let mut sorted = grouping.to_vec();
    sorted.sort_unstable();
    match candidates {
        None => *candidates = Some(sorted),
        Some(current) => current.retain(|pos| sorted.binary_search(pos).is_ok()),
    }
}

/// Exact match of the atom-name-level fields against one atom.
fn atom_fields_match(row: &Row, structure: &Structure, atom: usize) -> bool {
    let atoms = structure.atoms();
    row.atom_name.as_deref().is_none_or(|n| atoms.name()[atom] == n)
        && row
            .auth_atom_name
            .as_deref()
            .is_none_or(|n| atoms.auth_name()[atom] == n)
        && row.element.as_deref().is_none_or(|e| atoms.element()[atom] == e)
}

/// Slow per-field check: does every field on the row hold for this atom?
///
/// This is the reference oracle behind the fast cascade; it also backs the
/// re-verification step of the direct-atom shortcut and the naive resolver.
#[must_use]
pub fn row_matches_atom(row: &Row, structure: &Structure, atom: usize) -> bool {
    let residue = structure.residue_of_atom(atom);
    let chain = structure.chain_of_residue(residue);
    let chains = structure.chains();
    let residues = structure.residues();
    let atoms = structure.atoms();

    let seq = residues.seq_id()[residue];
    let auth_seq = residues.auth_seq_id()[residue];

    row.entity_id
        .as_deref()
        .is_none_or(|v| chains.entity_id()[chain] == v)
        && row.asym_id.as_deref().is_none_or(|v| chains.asym_id()[chain] == v)
        && row
            .auth_asym_id
            .as_deref()
            .is_none_or(|v| chains.auth_asym_id()[chain] == v)
        && row.seq_id.is_none_or(|v| seq == Some(v))
        && row.auth_seq_id.is_none_or(|v| auth_seq == Some(v))
        && row
            .ins_code
            .as_deref()
            .is_none_or(|v| residues.ins_code()[residue].as_deref() == Some(v))
        && row.beg_seq_id.is_none_or(|lo| seq.is_some_and(|v| v >= lo))
        && row.end_seq_id.is_none_or(|hi| seq.is_some_and(|v| v <= hi))
        && row
            .beg_auth_seq_id
            .is_none_or(|lo| auth_seq.is_some_and(|v| v >= lo))
        && row
            .end_auth_seq_id
            .is_none_or(|hi| auth_seq.is_some_and(|v| v <= hi))
        && atom_fields_match(row, structure, atom)
        && row.atom_id.is_none_or(|v| atoms.id()[atom] == v)
        && row.atom_index.is_none_or(|v| atoms.source_index()[atom] == v)
}
