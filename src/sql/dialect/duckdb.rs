//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible with extensions:
//! - ANSI identifier quoting (`"`)
//! - TRY_CAST for safe casting

use super::helpers;
use super::SqlDialect;
use crate::sql::types::StorageType;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn supports_try_cast(&self) -> bool {
        true
    }

    fn emit_storage_type(&self, ty: StorageType) -> &'static str {
        helpers::emit_storage_type_standard(ty)
    }
}
