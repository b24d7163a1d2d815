//! Shared helper functions for SQL dialect implementations.
//!
//! Reusable building blocks that dialects compose to implement `SqlDialect`.

use crate::sql::types::StorageType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: DuckDB, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: DuckDB
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: SQLite
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Storage Type Emission
// =============================================================================

/// Emit storage type names shared by DuckDB and SQLite.
///
/// SQLite maps `DOUBLE` to REAL affinity and `VARCHAR` to TEXT affinity, so
/// the same spelling works for both engines.
pub fn emit_storage_type_standard(ty: StorageType) -> &'static str {
    match ty {
        StorageType::Double => "DOUBLE",
        StorageType::Varchar => "VARCHAR",
    }
}
