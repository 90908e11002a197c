// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Schema registry: named subsets of the selector field vocabulary.
//!
//! A schema is applied only when parsing raw rows; selector fields outside
//! the active schema are dropped before a row reaches matching. Payload
//! fields always survive projection.

use serde::{Deserialize, Serialize};

use crate::row::{Field, FieldSet, Row};

/// Named selection-field subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schema {
    WholeStructure,
    Entity,
    Chain,
    AuthChain,
    Residue,
    AuthResidue,
    ResidueRange,
    AuthResidueRange,
    Atom,
    AuthAtom,
    AllAtomic,
}

impl Schema {
    /// Every registered schema.
    pub const ALL: [Schema; 11] = [
        Schema::WholeStructure,
        Schema::Entity,
        Schema::Chain,
        Schema::AuthChain,
        Schema::Residue,
        Schema::AuthResidue,
        Schema::ResidueRange,
        Schema::AuthResidueRange,
        Schema::Atom,
        Schema::AuthAtom,
        Schema::AllAtomic,
    ];

    /// Registry name of the schema.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Schema::WholeStructure => "whole-structure",
            Schema::Entity => "entity",
            Schema::Chain => "chain",
            Schema::AuthChain => "auth-chain",
            Schema::Residue => "residue",
            Schema::AuthResidue => "auth-residue",
            Schema::ResidueRange => "residue-range",
            Schema::AuthResidueRange => "auth-residue-range",
            Schema::Atom => "atom",
            Schema::AuthAtom => "auth-atom",
            Schema::AllAtomic => "all-atomic",
        }
    }

    /// Look up a schema by registry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|schema| schema.name() == name)
    }

    /// Selector fields a row of this schema is allowed to carry.
    #[must_use]
    pub fn allowed_fields(self) -> FieldSet {
        match self {
            Schema::WholeStructure => FieldSet::EMPTY,
            Schema::Entity => FieldSet::EMPTY.with(Field::EntityId),
            Schema::Chain => FieldSet::EMPTY.with(Field::EntityId).with(Field::AsymId),
            Schema::AuthChain => FieldSet::EMPTY.with(Field::AuthAsymId),
            Schema::Residue => Schema::Chain.allowed_fields().with(Field::SeqId),
            Schema::AuthResidue => Schema::AuthChain
                .allowed_fields()
                .with(Field::AuthSeqId)
                .with(Field::InsCode),
            Schema::ResidueRange => Schema::Chain
                .allowed_fields()
                .with(Field::BegSeqId)
                .with(Field::EndSeqId),
            Schema::AuthResidueRange => Schema::AuthChain
                .allowed_fields()
                .with(Field::BegAuthSeqId)
                .with(Field::EndAuthSeqId),
            Schema::Atom => Schema::Residue
                .allowed_fields()
                .with(Field::AtomName)
                .with(Field::Element)
                .with(Field::AtomId)
                .with(Field::AtomIndex),
            Schema::AuthAtom => Schema::AuthResidue
                .allowed_fields()
                .with(Field::AuthAtomName)
                .with(Field::Element)
                .with(Field::AtomId)
                .with(Field::AtomIndex),
            Schema::AllAtomic => FieldSet::ALL,
        }
    }

    /// Copy of a row with every selector field outside this schema dropped.
    /// Payload fields are untouched.
    #[must_use]
    pub fn project(self, row: &Row) -> Row {
        let allowed = self.allowed_fields();
        let mut projected = row.clone();
        for field in Field::ALL {
            if !allowed.contains(field) {
                projected.clear(field);
            }
        }
        projected
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for schema in Schema::ALL {
            assert_eq!(Schema::from_name(schema.name()), Some(schema));
        }
        assert_eq!(Schema::from_name("no-such-schema"), None);
    }

    #[test]
    fn serde_uses_kebab_case_names() {
        let json = serde_json::to_string(&Schema::AuthResidueRange).unwrap();
        assert_eq!(json, "\"auth-residue-range\"");
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Schema::AuthResidueRange);
    }

    #[test]
    fn whole_structure_drops_every_selector_field() {
        let row = Row {
            auth_asym_id: Some("A".to_string()),
            auth_seq_id: Some(7),
            atom_id: Some(3),
            color: Some("red".to_string()),
            ..Default::default()
        };
        let projected = Schema::WholeStructure.project(&row);
        assert!(projected.present_fields().is_empty());
        assert_eq!(projected.color.as_deref(), Some("red"));
    }

    #[test]
    fn auth_residue_keeps_only_its_fields() {
        let row = Row {
            asym_id: Some("A".to_string()),
            auth_asym_id: Some("A".to_string()),
            seq_id: Some(1),
            auth_seq_id: Some(1),
            ins_code: Some("B".to_string()),
            atom_name: Some("CA".to_string()),
            tooltip: Some("t".to_string()),
            ..Default::default()
        };
        let projected = Schema::AuthResidue.project(&row);
        assert_eq!(projected.asym_id, None);
        assert_eq!(projected.seq_id, None);
        assert_eq!(projected.atom_name, None);
        assert_eq!(projected.auth_asym_id.as_deref(), Some("A"));
        assert_eq!(projected.auth_seq_id, Some(1));
        assert_eq!(projected.ins_code.as_deref(), Some("B"));
        assert_eq!(projected.tooltip.as_deref(), Some("t"));
    }

    #[test]
    fn all_atomic_keeps_everything() {
        let row = Row {
            entity_id: Some("1".to_string()),
            atom_index: Some(9),
            ..Default::default()
        };
        assert_eq!(Schema::AllAtomic.project(&row), row);
    }
}
