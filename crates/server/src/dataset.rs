//! CSV inspection backed by the `csv` reader.
//!
//! The tools need a schema (column to type-name mapping), a row count, and
//! the header. Types are inferred by scanning values: an all-integer column
//! is `Int64`, integers mixed with decimals promote to `Float64`, `true` /
//! `false` columns are `Boolean`, everything else is `String`.

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Column type names reported by `get_csv_schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Boolean,
    String,
}

impl ColumnType {
    fn as_str(self) -> &'static str {
        match self {
            ColumnType::Int64 => "Int64",
            ColumnType::Float64 => "Float64",
            ColumnType::Boolean => "Boolean",
            ColumnType::String => "String",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classify(value: &str) -> ColumnType {
    if value.parse::<i64>().is_ok() {
        ColumnType::Int64
    } else if value.parse::<f64>().is_ok() {
        ColumnType::Float64
    } else if matches!(value, "true" | "false" | "True" | "False") {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn merge(seen: Option<ColumnType>, next: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (seen, next) {
        (None, next) => next,
        (Some(seen), next) if seen == next => seen,
        (Some(Int64), Float64) | (Some(Float64), Int64) => Float64,
        _ => String,
    }
}

/// Ordered column names from the header row.
pub fn columns(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.headers()?.iter().map(String::from).collect())
}

/// Number of data records, excluding the header.
pub fn row_count(path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }
    Ok(count)
}

/// Inferred schema, in column order. Empty values don't participate in
/// inference; an all-empty column reports `String`.
pub fn schema(path: &Path) -> Result<Vec<(String, ColumnType)>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut types: Vec<Option<ColumnType>> = vec![None; headers.len()];

    for record in reader.records() {
        let record = record?;
        for (i, value) in record.iter().enumerate().take(types.len()) {
            if value.is_empty() {
                continue;
            }
            types[i] = Some(merge(types[i], classify(value)));
        }
    }

    Ok(headers
        .into_iter()
        .zip(types)
        .map(|(name, inferred)| (name, inferred.unwrap_or(ColumnType::String)))
        .collect())
}
