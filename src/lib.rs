// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Annotation-to-structure mapping engine.
//!
//! Maps declarative, partially specified annotation rows onto atoms of a
//! hierarchical molecular structure (chain → residue → atom) and resolves,
//! for every atom, which row (if any) applies, together with the payload
//! the row carries (a color, a tooltip, a free-form label).
//!
//! The building blocks, leaves first:
//!
//! - [`Structure`] is the immutable columnar structure model.
//! - [`StructuralIndex`] holds per-structure lookup tables, built once per
//!   structure and cached by identity in an [`IndexCache`].
//! - [`RangeSet`] is the disjoint ascending interval collection used to
//!   represent matched atom sets.
//! - [`select::match_row`] is the cascading matcher turning one row into a
//!   [`RangeSet`], short-circuiting at the coarsest sufficient level.
//! - [`resolve_rows`] paints an ordered row list into a dense per-atom
//!   [`ResolutionTable`]; where coverage overlaps, the last row in source
//!   order wins. Tables are cached per (row list, structure) pairing in a
//!   [`TableCache`].
//! - [`source::read_rows`] parses raw row bytes (row-major or columnar JSON,
//!   optionally gzipped) under a named [`Schema`].
//!
//! # Examples
//! ~~~
//! use annomol::{resolve_rows, Row, RowList, Structure, StructuralIndex};
//!
//! // One chain "A" with three single-atom residues.
//! let mut builder = Structure::builder();
//! builder.chain("1", "A", "A");
//! for number in 1..=3 {
//!     builder.residue(Some(number), Some(number), None);
//!     builder.atom("CA", "CA", "C");
//! }
//! let structure = builder.build().unwrap();
//! let index = StructuralIndex::new(&structure);
//!
//! let rows = RowList::new(vec![
//!     Row {
//!         auth_asym_id: Some("A".to_string()),
//!         color: Some("red".to_string()),
//!         ..Default::default()
//!     },
//!     Row {
//!         auth_seq_id: Some(2),
//!         color: Some("blue".to_string()),
//!         ..Default::default()
//!     },
//! ]);
//!
//! let table = resolve_rows(&rows, &structure, &index);
//! assert_eq!(table.lookup(&rows, 0).unwrap().color.as_deref(), Some("red"));
//! // the later row wins where coverage overlaps
//! assert_eq!(table.lookup(&rows, 1).unwrap().color.as_deref(), Some("blue"));
//! assert_eq!(table.lookup(&rows, 2).unwrap().color.as_deref(), Some("red"));
//! ~~~

pub mod index;
pub mod rangeset;
pub mod resolve;
pub mod row;
pub mod schema;
pub mod select;
pub mod source;
pub mod structure;

pub use index::{IndexCache, StructuralIndex};
pub use rangeset::RangeSet;
pub use resolve::{
    grouped_coverage, resolve_rows, resolve_rows_naive, GroupKey, ResolutionTable, TableCache,
};
pub use row::{Field, FieldSet, Row, RowList, RowListId};
pub use schema::Schema;
pub use select::{match_row, row_matches_atom, selector_match, Granularity, RowSelection};
pub use source::{read_rows, read_sources};
pub use structure::{Structure, StructureBuilder, StructureId};
