// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests: row sources through matching to per-atom resolution.

use annomol::{
    grouped_coverage, match_row, read_rows, resolve_rows, resolve_rows_naive, row_matches_atom,
    selector_match, Granularity, IndexCache, RangeSet, Row, RowList, Schema, Structure,
    StructuralIndex, TableCache,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One chain "A" of five residues, one atom each (atoms 0..5).
fn single_chain() -> Structure {
    let mut builder = Structure::builder();
    builder.chain("1", "A", "A");
    for number in 1..=5 {
        builder.residue(Some(number), Some(number), None);
        builder.atom("CA", "CA", "C");
    }
    builder.build().unwrap()
}

#[test]
fn chain_row_covers_the_chain() {
    let structure = single_chain();
    let index = StructuralIndex::new(&structure);
    let row = Row {
        auth_asym_id: Some("A".to_string()),
        ..Default::default()
    };
    assert_eq!(selector_match(&row, &structure, &index).ranges(), &[0..5]);
}

#[test]
fn later_row_wins() {
    let structure = single_chain();
    let index = StructuralIndex::new(&structure);
    let rows = RowList::new(vec![
        Row {
            auth_asym_id: Some("A".to_string()),
            color: Some("red".to_string()),
            ..Default::default()
        },
        Row {
            auth_seq_id: Some(3),
            color: Some("blue".to_string()),
            ..Default::default()
        },
    ]);
    let table = resolve_rows(&rows, &structure, &index);
    for atom in 0..5 {
        let expected = if atom == 2 { "blue" } else { "red" };
        assert_eq!(
            table.lookup(&rows, atom).unwrap().color.as_deref(),
            Some(expected)
        );
    }
}

#[test]
fn disagreeing_direct_atom_fields_match_nothing() {
    let mut builder = Structure::builder();
    builder.chain("1", "A", "A");
    for number in 1..=5 {
        builder.residue(Some(number), Some(number), None);
        // atom ids 5..10, source indices 5..10: id 7 is atom 2, index 9 is atom 4
        builder.atom_with_ids("CA", "CA", "C", number as i64 + 4, number as usize + 4);
    }
    let structure = builder.build().unwrap();
    let index = StructuralIndex::new(&structure);

    let row = Row {
        atom_id: Some(7),
        atom_index: Some(9),
        ..Default::default()
    };
    assert!(selector_match(&row, &structure, &index).is_empty());

    let agreeing = Row {
        atom_id: Some(7),
        atom_index: Some(7),
        ..Default::default()
    };
    assert_eq!(selector_match(&agreeing, &structure, &index).ranges(), &[2..3]);
}

#[test]
fn auth_range_is_inclusive_on_both_ends() {
    let structure = single_chain();
    let index = StructuralIndex::new(&structure);
    let row = Row {
        beg_auth_seq_id: Some(2),
        end_auth_seq_id: Some(4),
        ..Default::default()
    };
    // residues 2, 3, 4 are atoms 1..4
    assert_eq!(selector_match(&row, &structure, &index).ranges(), &[1..4]);
}

#[test]
fn adjacent_range_sets_union_into_one() {
    let merged = RangeSet::union_all([RangeSet::single(0..3), RangeSet::single(3..6)]);
    assert_eq!(merged.ranges(), &[0..6]);
}

#[test]
fn members_intersects_sorted_atom_list() {
    let mut set = RangeSet::new();
    set.push(1..3);
    set.push(4..5);
    assert_eq!(set.members(&[0, 1, 2, 3, 4, 5]), vec![1, 2, 4]);
}

#[test]
fn source_to_resolution_round_trip() {
    let structure = single_chain();
    let mut indices = IndexCache::new();
    let index = indices.get_or_build(&structure);

    let json = br#"[
        {"auth_asym_id": "A", "color": "red"},
        {"auth_asym_id": "A", "auth_seq_id": 3, "color": "blue"}
    ]"#;
    let rows = read_rows(json, Schema::AuthResidue).unwrap();

    let mut tables = TableCache::new();
    let table = tables.get_or_resolve(&rows, &structure, &index);
    assert_eq!(table.lookup(&rows, 2).unwrap().color.as_deref(), Some("blue"));
    assert_eq!(table.lookup(&rows, 4).unwrap().color.as_deref(), Some("red"));
}

#[test]
fn resolution_is_idempotent() {
    let structure = single_chain();
    let index = StructuralIndex::new(&structure);
    let rows = RowList::new(vec![
        Row {
            auth_seq_id: Some(2),
            ..Default::default()
        },
        Row {
            auth_seq_id: Some(2),
            label: Some("again".to_string()),
            ..Default::default()
        },
    ]);
    let first = resolve_rows(&rows, &structure, &index);
    let second = resolve_rows(&rows, &structure, &index);
    assert_eq!(first, second);

    let rebuilt = StructuralIndex::new(&structure);
    assert_eq!(resolve_rows(&rows, &structure, &rebuilt), first);
}

#[test]
fn grouped_labels_span_rows() {
    let structure = single_chain();
    let index = StructuralIndex::new(&structure);
    let rows = RowList::new(vec![
        Row {
            auth_seq_id: Some(1),
            group_id: Some(1),
            label: Some("site".to_string()),
            ..Default::default()
        },
        Row {
            auth_seq_id: Some(2),
            group_id: Some(1),
            label: Some("site".to_string()),
            ..Default::default()
        },
    ]);
    let groups = grouped_coverage(&rows, &structure, &index);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].1.ranges(), &[0..2]);
}

/// A messier structure: shared author chain ids, multi-atom residues, an
/// insertion code, a residue numbered 0, and residues with absent numbers.
fn messy() -> Structure {
    let mut builder = Structure::builder();
    builder.chain("1", "A", "A");
    builder.residue(Some(0), Some(0), None);
    builder.atom("N", "N", "N");
    builder.atom("CA", "CA", "C");
    builder.residue(Some(1), Some(1), None);
    builder.atom("CA", "CA", "C");
    builder.residue(Some(2), Some(2), Some("A"));
    builder.atom("CA", "CB", "C");
    builder.chain("2", "B", "A");
    builder.residue(None, Some(7), None);
    builder.atom("P", "P", "P");
    builder.residue(Some(4), None, None);
    builder.atom("CA", "CA", "C");
    builder.chain("3", "C", "C");
    builder.residue(Some(1), Some(1), Some("B"));
    builder.atom("O", "O", "O");
    builder.build().unwrap()
}

fn random_row(rng: &mut StdRng) -> Row {
    let mut row = Row::default();
    let entities = ["1", "2", "3", "9"];
    let asyms = ["A", "B", "C", "Z"];
    let names = ["N", "CA", "CB", "P", "O"];
    let elements = ["N", "C", "P", "O"];

    if rng.gen_bool(0.3) {
        row.entity_id = Some(entities[rng.gen_range(0..entities.len())].to_string());
    }
    if rng.gen_bool(0.3) {
        row.asym_id = Some(asyms[rng.gen_range(0..asyms.len())].to_string());
    }
    if rng.gen_bool(0.3) {
        row.auth_asym_id = Some(asyms[rng.gen_range(0..asyms.len())].to_string());
    }
    if rng.gen_bool(0.25) {
        row.seq_id = Some(rng.gen_range(-1..5));
    }
    if rng.gen_bool(0.25) {
        row.auth_seq_id = Some(rng.gen_range(-1..8));
    }
    if rng.gen_bool(0.15) {
        let code = if rng.gen_bool(0.5) { "A" } else { "B" };
        row.ins_code = Some(code.to_string());
    }
    if rng.gen_bool(0.2) {
        row.beg_seq_id = Some(rng.gen_range(-1..4));
    }
    if rng.gen_bool(0.2) {
        row.end_seq_id = Some(rng.gen_range(-1..4));
    }
    if rng.gen_bool(0.2) {
        row.beg_auth_seq_id = Some(rng.gen_range(-1..8));
    }
    if rng.gen_bool(0.2) {
        row.end_auth_seq_id = Some(rng.gen_range(-1..8));
    }
    if rng.gen_bool(0.2) {
        row.atom_name = Some(names[rng.gen_range(0..names.len())].to_string());
    }
    if rng.gen_bool(0.2) {
        row.auth_atom_name = Some(names[rng.gen_range(0..names.len())].to_string());
    }
    if rng.gen_bool(0.2) {
        row.element = Some(elements[rng.gen_range(0..elements.len())].to_string());
    }
    if rng.gen_bool(0.1) {
        row.atom_id = Some(rng.gen_range(0..10));
    }
    if rng.gen_bool(0.1) {
        row.atom_index = Some(rng.gen_range(0..10));
    }
    row
}

#[test]
fn random_rows_agree_with_oracle() {
    let structure = messy();
    let index = StructuralIndex::new(&structure);
    let mut rng = StdRng::seed_from_u64(17);

    for _ in 0..500 {
        let row = random_row(&mut rng);
        let selection = match_row(&row, &structure, &index);
        for atom in 0..structure.atom_count() {
            assert_eq!(
                selection.ranges.contains(atom),
                row_matches_atom(&row, &structure, atom),
                "selector disagreement for {row:?} at atom {atom}"
            );
        }
        // the cascade never descends deeper than the fields require
        if row.present_fields().is_empty() {
            assert_eq!(selection.granularity, Granularity::NoFilter);
        }
    }
}

#[test]
fn random_row_lists_resolve_identically_fast_and_naive() {
    let structure = messy();
    let index = StructuralIndex::new(&structure);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let rows = RowList::new((0..rng.gen_range(1..12)).map(|_| random_row(&mut rng)).collect());
        assert_eq!(
            resolve_rows(&rows, &structure, &index),
            resolve_rows_naive(&rows, &structure, &index),
            "fast/naive disagreement for {:?}",
            rows.rows()
        );
    }
}
