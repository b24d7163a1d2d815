//! Resolution of user field names against the stored columns.

use std::collections::HashMap;

use super::error::PivotError;
use crate::engine::QueryResult;

/// Maps every accepted spelling of a field to its stored column name.
///
/// Each stored column answers to its own name, its dotted form with `.`
/// replaced by `_`, and its underscored form with `_` replaced by `.`.
/// An exact stored name always wins over an alternate spelling of another
/// column.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<String>,
    lookup: HashMap<String, String>,
}

impl ColumnMap {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        let mut lookup: HashMap<String, String> = columns
            .iter()
            .map(|c| (c.clone(), c.clone()))
            .collect();
        for column in &columns {
            for alternate in [column.replace('.', "_"), column.replace('_', ".")] {
                lookup.entry(alternate).or_insert_with(|| column.clone());
            }
        }

        Self { columns, lookup }
    }

    /// Build from the field names of a schema query result.
    pub fn from_result(result: &QueryResult) -> Self {
        Self::new(result.schema.names())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn resolve(&self, field: &str) -> Option<&str> {
        self.lookup.get(field).map(String::as_str)
    }

    /// Resolve every field, failing on the first unknown one.
    pub fn resolve_all(&self, fields: &[String]) -> Result<Vec<String>, PivotError> {
        fields.iter().map(|f| self.resolve_field(f)).collect()
    }

    pub fn resolve_field(&self, field: &str) -> Result<String, PivotError> {
        self.resolve(field)
            .map(str::to_string)
            .ok_or_else(|| PivotError::UnknownField {
                field: field.to_string(),
                available: self.columns.clone(),
            })
    }
}
