// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// SPDX-License-Identifier: Apache-2.0

//! Row sources: parse raw annotation bytes into a [`RowList`] per schema.
//!
//! Accepted shapes are a row-major JSON array of objects and a columnar
//! object-of-arrays; either may be gzip-compressed. Malformed rows are
//! skipped with a warning rather than failing the source, and a failing
//! source does not prevent reading the others.

use std::io::Read;

use anyhow::Context;
use flate2::read::GzDecoder;
use serde_json::Value;

use crate::row::{Row, RowList};
use crate::schema::Schema;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parse one raw row source, projecting every row through the schema.
///
/// Rows that fail to deserialize are skipped with a warning (a bad row must
/// not prevent matching the rest). Errors returned here concern the source
/// as a whole: undecodable bytes or a JSON shape that is neither row-major
/// nor columnar.
pub fn read_rows(bytes: &[u8], schema: Schema) -> anyhow::Result<RowList> {
    let text = decode(bytes)?;
    let value: Value = serde_json::from_str(&text).context("row source is not valid JSON")?;
    let records = match value {
        Value::Array(records) => records,
        Value::Object(columns) => transpose_columns(columns)?,
        other => anyhow::bail!(
            "row source must be a JSON array of rows or a columnar object, got {}",
            json_kind(&other)
        ),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Row>(record) {
            Ok(row) => rows.push(schema.project(&row)),
            Err(error) => log::warn!("skipping malformed row {position}: {error}"),
        }
    }
    Ok(RowList::new(rows))
}

/// Concatenate several sources in order into one row list.
///
/// A source that fails entirely is skipped with a warning; the remaining
/// sources still contribute their rows.
#[must_use]
pub fn read_sources<'a>(
    sources: impl IntoIterator<Item = &'a [u8]>,
    schema: Schema,
) -> RowList {
    let mut rows = Vec::new();
    for (position, source) in sources.into_iter().enumerate() {
        match read_rows(source, schema) {
            Ok(list) => rows.extend(list.into_rows()),
            Err(error) => log::warn!("skipping row source {position}: {error:#}"),
        }
    }
    RowList::new(rows)
}

fn decode(bytes: &[u8]) -> anyhow::Result<String> {
    let mut text = String::new();
    if bytes.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .context("failed to decompress gzip row source")?;
    } else {
        text = std::str::from_utf8(bytes)
            .context("row source is not valid UTF-8")?
            .to_string();
    }
    Ok(text)
}

/// Turn a columnar object-of-arrays into row-major records. A `null` cell
/// means the field is absent for that row, not empty.
fn transpose_columns(columns: serde_json::Map<String, Value>) -> anyhow::Result<Vec<Value>> {
    let mut parsed = Vec::with_capacity(columns.len());
    for (name, value) in columns {
        match value {
            Value::Array(cells) => parsed.push((name, cells)),
            other => anyhow::bail!("column '{name}' is {}, expected an array", json_kind(&other)),
        }
    }

    let rows = parsed.first().map_or(0, |(_, cells)| cells.len());
    if let Some((name, cells)) = parsed.iter().find(|(_, cells)| cells.len() != rows) {
        anyhow::bail!(
            "column '{name}' has {} cells, expected {rows}",
            cells.len()
        );
    }

    let mut records = vec![serde_json::Map::new(); rows];
    for (name, cells) in parsed {
        for (record, cell) in records.iter_mut().zip(cells) {
            if !cell.is_null() {
                record.insert(name.clone(), cell);
            }
        }
    }
    Ok(records.into_iter().map(Value::Object).collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
