//! Inferred column types and the table schema derived from them.

use serde::Serialize;

use crate::sql::{ColumnDef, CreateTable, StorageType};

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
}

/// Inference result for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnTypeInfo {
    pub name: String,
    pub inferred_type: ColumnType,
}

impl ColumnTypeInfo {
    pub fn new(name: impl Into<String>, inferred_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            inferred_type,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        self.inferred_type.into()
    }
}

/// Ordered columns of the working table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnTypeInfo>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnTypeInfo>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnTypeInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// CREATE TABLE statement for this schema.
    pub fn create_table(&self, table: &str) -> CreateTable {
        CreateTable::new(table).columns(
            self.columns
                .iter()
                .map(|c| ColumnDef::new(c.name.clone(), c.storage_type())),
        )
    }
}
