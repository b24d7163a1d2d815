//! SQL-level storage types for DDL generation.
//!
//! Loaded tables only ever hold two kinds of column: numbers parsed from the
//! source rows and everything else as text.

use std::fmt;

use crate::schema::ColumnType;

/// SQL-level column type used in CREATE TABLE and CAST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// 64-bit floating point (`DOUBLE`).
    Double,
    /// Variable-length string (`VARCHAR`).
    Varchar,
}

impl StorageType {
    /// Canonical SQL spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Double => "DOUBLE",
            StorageType::Varchar => "VARCHAR",
        }
    }
}

impl From<ColumnType> for StorageType {
    fn from(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Numeric => StorageType::Double,
            ColumnType::Text => StorageType::Varchar,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
