// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Row resolution: turn an ordered row list into a dense per-atom lookup
//! table.
//!
//! The single load-bearing priority rule of the engine lives here: rows are
//! painted in source order, so wherever coverage overlaps the **last row in
//! source order wins**.

use std::collections::HashMap;
use std::rc::Rc;

use crate::index::StructuralIndex;
use crate::rangeset::RangeSet;
use crate::row::{Row, RowList, RowListId};
use crate::select::{row_matches_atom, selector_match};
use crate::structure::{Structure, StructureId};

/// Dense per-atom table: each entry is the position of the last matching row
/// in its row list, or none. Lookup is O(1) after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTable {
    // u32 keeps the table at 8 bytes per atom for million-atom structures
    entries: Vec<Option<u32>>,
}

impl ResolutionTable {
    /// Position of the resolved row for an atom, if any.
    #[must_use]
    pub fn row_index(&self, atom: usize) -> Option<usize> {
        self.entries[atom].map(|i| i as usize)
    }

    /// Resolved row for an atom, if any.
    #[must_use]
    pub fn lookup<'a>(&self, rows: &'a RowList, atom: usize) -> Option<&'a Row> {
        self.row_index(atom).and_then(|i| rows.get(i))
    }

    /// Number of atoms the table covers.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.entries.len()
    }
}

/// Build the per-atom table by painting each row's ranges in source order.
#[must_use]
pub fn resolve_rows(
    rows: &RowList,
    structure: &Structure,
    index: &StructuralIndex,
) -> ResolutionTable {
    let mut entries = vec![None; structure.atom_count()];
    for (position, row) in rows.iter().enumerate() {
        let ranges = selector_match(row, structure, index);
        for range in &ranges {
            entries[range.clone()].fill(Some(position as u32));
        }
    }
    ResolutionTable { entries }
}

/// Reference implementation of [`resolve_rows`]: for every atom, scan every
/// row with the per-field oracle and keep the last match. O(atoms × rows);
/// exists to validate the fast path, which must always agree with it.
#[must_use]
pub fn resolve_rows_naive(
    rows: &RowList,
    structure: &Structure,
    _index: &StructuralIndex,
) -> ResolutionTable {
    let entries = (0..structure.atom_count())
        .map(|atom| {
            rows.iter()
                .enumerate()
                .filter(|(_, row)| row_matches_atom(row, structure, atom))
                .last()
                .map(|(position, _)| position as u32)
        })
        .collect();
    ResolutionTable { entries }
}

/// Key of one grouped-coverage entry: the explicit group id shared by several
/// rows, or the position of a row that carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Group(i64),
    Single(usize),
}

/// Coverage sets per annotation group, in first-appearance order.
///
/// Rows sharing an explicit `group_id` are merged into one coverage set via
/// range-set union; rows without one each form their own group. Consumers
/// use this for grouped labels spanning several rows.
#[must_use]
pub fn grouped_coverage(
    rows: &RowList,
    structure: &Structure,
    index: &StructuralIndex,
) -> Vec<(GroupKey, RangeSet)> {
    let mut order = Vec::new();
    let mut sets: HashMap<GroupKey, Vec<RangeSet>> = HashMap::new();
    for (position, row) in rows.iter().enumerate() {
        let key = row.group_id.map_or(GroupKey::Single(position), GroupKey::Group);
        if !sets.contains_key(&key) {
            order.push(key);
        }
        sets.entry(key)
            .or_default()
            .push(selector_match(row, structure, index));
    }
    order
        .into_iter()
        .map(|key| {
            let merged = RangeSet::union_all(sets.remove(&key).unwrap_or_default());
            (key, merged)
        })
        .collect()
}

/// Caller-owned cache of resolution tables, keyed by (row list, structure)
/// identity. Compute-once per pairing; never invalidated automatically;
/// eviction is explicit.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<(RowListId, StructureId), Rc<ResolutionTable>>,
}

impl TableCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for the pairing, resolving it on first access.
    pub fn get_or_resolve(
        &mut self,
        rows: &RowList,
        structure: &Structure,
        index: &StructuralIndex,
    ) -> Rc<ResolutionTable> {
        let entry = self
            .entries
            .entry((rows.id(), structure.id()))
            .or_insert_with(|| {
                log::debug!(
                    "resolving {} rows against {:?}",
                    rows.len(),
                    structure.id()
                );
                Rc::new(resolve_rows(rows, structure, index))
            });
        Rc::clone(entry)
    }

    /// Drop the cached table for a pairing, if any.
    pub fn remove(&mut self, rows: RowListId, structure: StructureId) -> bool {
        self.entries.remove(&(rows, structure)).is_some()
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
