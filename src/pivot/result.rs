//! Pivot output shaping.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::QueryResult;
use crate::value::{normalize_cell, sanitize_identifier};

/// One output column: raw header plus its identifier-safe key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotColumn {
    pub id: String,
    pub header: String,
    pub accessor_key: String,
}

impl PivotColumn {
    pub fn from_field(name: &str) -> Self {
        let key = sanitize_identifier(name);
        Self {
            id: key.clone(),
            header: name.to_string(),
            accessor_key: key,
        }
    }
}

/// Pivoted rows plus column descriptors. Row maps are keyed by
/// [`PivotColumn::accessor_key`].
///
/// Keys are unique: a field whose sanitized name is already taken gets a
/// numeric suffix (`a_b`, `a_b_2`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotResult {
    pub rows: Vec<Map<String, Value>>,
    pub columns: Vec<PivotColumn>,
}

impl PivotResult {
    pub fn from_query_result(result: &QueryResult) -> Self {
        let columns = unique_columns(result.schema.names());
        let rows = result
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.accessor_key.clone(), normalize_cell(cell)))
                    .collect()
            })
            .collect();
        Self { rows, columns }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find the first row whose `key` equals `value`.
    pub fn find_row(&self, key: &str, value: &Value) -> Option<&Map<String, Value>> {
        self.rows.iter().find(|r| r.get(key) == Some(value))
    }
}

fn unique_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<PivotColumn> {
    let mut taken = HashSet::new();
    names
        .map(|name| {
            let mut column = PivotColumn::from_field(name);
            if !taken.insert(column.accessor_key.clone()) {
                let base = column.accessor_key.clone();
                let key = (2..)
                    .map(|n| format!("{base}_{n}"))
                    .find(|candidate| !taken.contains(candidate))
                    .unwrap_or_default();
                warn!(field = %name, key = %base, renamed = %key, "pivot column key collides; renamed");
                taken.insert(key.clone());
                column.id = key.clone();
                column.accessor_key = key;
            }
            column
        })
        .collect()
}
