// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Annotation rows: partial records over the structure's field vocabulary,
//! plus free-form payload.
//!
//! A field absent from a row means "do not constrain on this field", never
//! "requires empty". Absence is kept distinct from any real value end to end:
//! a residue numbered 0 is still selectable, and a row that does not care
//! about residue numbers does not only match residue 0.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// One selector field of the annotation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    EntityId,
    AsymId,
    AuthAsymId,
    SeqId,
    AuthSeqId,
    InsCode,
    BegSeqId,
    EndSeqId,
    BegAuthSeqId,
    EndAuthSeqId,
    AtomName,
    AuthAtomName,
    Element,
    AtomId,
    AtomIndex,
}

impl Field {
    /// Every selector field, in declaration order.
    pub const ALL: [Field; 15] = [
        Field::EntityId,
        Field::AsymId,
        Field::AuthAsymId,
        Field::SeqId,
        Field::AuthSeqId,
        Field::InsCode,
        Field::BegSeqId,
        Field::EndSeqId,
        Field::BegAuthSeqId,
        Field::EndAuthSeqId,
        Field::AtomName,
        Field::AuthAtomName,
        Field::Element,
        Field::AtomId,
        Field::AtomIndex,
    ];
}

/// Bitset over [`Field`], computed once per row at the start of matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u16);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);

    /// Chain-level fields.
    pub const CHAIN: FieldSet = FieldSet::EMPTY
        .with(Field::EntityId)
        .with(Field::AsymId)
        .with(Field::AuthAsymId);

    /// Residue-level fields, exact and ranged.
    pub const RESIDUE: FieldSet = FieldSet::EMPTY
        .with(Field::SeqId)
        .with(Field::AuthSeqId)
        .with(Field::InsCode)
        .with(Field::BegSeqId)
        .with(Field::EndSeqId)
        .with(Field::BegAuthSeqId)
        .with(Field::EndAuthSeqId);

    /// Atom-name-level fields.
    pub const ATOM_NAME: FieldSet = FieldSet::EMPTY
        .with(Field::AtomName)
        .with(Field::AuthAtomName)
        .with(Field::Element);

    /// Direct atom lookup fields.
    pub const DIRECT: FieldSet = FieldSet::EMPTY.with(Field::AtomId).with(Field::AtomIndex);

    /// The full vocabulary.
    pub const ALL: FieldSet = FieldSet::CHAIN
        .union(FieldSet::RESIDUE)
        .union(FieldSet::ATOM_NAME)
        .union(FieldSet::DIRECT);

    #[must_use]
    pub const fn with(self, field: Field) -> Self {
        Self(self.0 | 1 << field as u16)
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, field: Field) -> bool {
        self.0 & (1 << field as u16) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn any_chain(self) -> bool {
        self.intersects(Self::CHAIN)
    }

    #[must_use]
    pub const fn any_residue(self) -> bool {
        self.intersects(Self::RESIDUE)
    }

    #[must_use]
    pub const fn any_atom_name(self) -> bool {
        self.intersects(Self::ATOM_NAME)
    }

    #[must_use]
    pub const fn any_direct(self) -> bool {
        self.intersects(Self::DIRECT)
    }
}

/// One annotation row. All selector fields are optional; payload fields are
/// carried through untouched by matching.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    pub entity_id: Option<String>,
    pub asym_id: Option<String>,
    pub auth_asym_id: Option<String>,
    pub seq_id: Option<i32>,
    pub auth_seq_id: Option<i32>,
    pub ins_code: Option<String>,
    /// Inclusive lower bound on the primary sequence number.
    pub beg_seq_id: Option<i32>,
    /// Inclusive upper bound on the primary sequence number.
    pub end_seq_id: Option<i32>,
    /// Inclusive lower bound on the author sequence number.
    pub beg_auth_seq_id: Option<i32>,
    /// Inclusive upper bound on the author sequence number.
    pub end_auth_seq_id: Option<i32>,
    pub atom_name: Option<String>,
    pub auth_atom_name: Option<String>,
    pub element: Option<String>,
    pub atom_id: Option<i64>,
    pub atom_index: Option<usize>,
    /// Payload: color string.
    pub color: Option<String>,
    /// Payload: tooltip text.
    pub tooltip: Option<String>,
    /// Payload: free-form label text.
    pub label: Option<String>,
    /// Explicit group id; rows sharing one are merged for grouped coverage.
    pub group_id: Option<i64>,
}

impl Row {
    /// Whether a selector field is set on this row.
    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::EntityId => self.entity_id.is_some(),
            Field::AsymId => self.asym_id.is_some(),
            Field::AuthAsymId => self.auth_asym_id.is_some(),
            Field::SeqId => self.seq_id.is_some(),
            Field::AuthSeqId => self.auth_seq_id.is_some(),
            Field::InsCode => self.ins_code.is_some(),
            Field::BegSeqId => self.beg_seq_id.is_some(),
            Field::EndSeqId => self.end_seq_id.is_some(),
            Field::BegAuthSeqId => self.beg_auth_seq_id.is_some(),
            Field::EndAuthSeqId => self.end_auth_seq_id.is_some(),
            Field::AtomName => self.atom_name.is_some(),
            Field::AuthAtomName => self.auth_atom_name.is_some(),
            Field::Element => self.element.is_some(),
            Field::AtomId => self.atom_id.is_some(),
            Field::AtomIndex => self.atom_index.is_some(),
        }
    }

    /// Clear a selector field.
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::EntityId => self.entity_id = None,
            Field::AsymId => self.asym_id = None,
            Field::AuthAsymId => self.auth_asym_id = None,
            Field::SeqId => self.seq_id = None,
            Field::AuthSeqId => self.auth_seq_id = None,
            Field::InsCode => self.ins_code = None,
            Field::BegSeqId => self.beg_seq_id = None,
            Field::EndSeqId => self.end_seq_id = None,
            Field::BegAuthSeqId => self.beg_auth_seq_id = None,
            Field::EndAuthSeqId => self.end_auth_seq_id = None,
            Field::AtomName => self.atom_name = None,
            Field::AuthAtomName => self.auth_atom_name = None,
            Field::Element => self.element = None,
            Field::AtomId => self.atom_id = None,
            Field::AtomIndex => self.atom_index = None,
        }
    }

    /// Bitset of the selector fields set on this row.
    #[must_use]
    pub fn present_fields(&self) -> FieldSet {
        Field::ALL
            .into_iter()
            .filter(|&field| self.has(field))
            .fold(FieldSet::EMPTY, FieldSet::with)
    }
}

static NEXT_ROW_LIST_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowListId(u64);

/// Ordered list of rows. The order is the priority order: where coverage
/// overlaps, the last row in the list wins.
#[derive(Debug)]
pub struct RowList {
    id: RowListId,
    rows: Vec<Row>,
}

impl RowList {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            id: RowListId(NEXT_ROW_LIST_ID.fetch_add(1, Ordering::Relaxed)),
            rows,
        }
    }

    /// Process-unique identity used as cache key.
    #[inline(always)]
    pub fn id(&self) -> RowListId {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the list, keeping the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Vec<Row>> for RowList {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}
