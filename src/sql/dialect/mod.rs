//! SQL Dialect definitions and formatting rules.
//!
//! A trait-based abstraction for the differences between the engines the
//! compilers target:
//!
//! - Boolean literals: true/false vs 1/0
//! - Fallible casts: `TRY_CAST` vs plain `CAST`
//! - Storage type names for `CREATE TABLE`
//!
//! # Usage
//!
//! ```ignore
//! use pivotal::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Sqlite;
//! let quoted = dialect.quote_identifier("region");  // "region"
//! ```

mod duckdb;
pub mod helpers;
mod sqlite;

pub use duckdb::DuckDb;
pub use sqlite::Sqlite;

use super::types::StorageType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal with `''` escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - DuckDB: `true`/`false`
    /// - SQLite: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Casts
    // =========================================================================

    /// Whether `TRY_CAST` exists. When it does not, fallible casts are
    /// emitted as plain `CAST`.
    fn supports_try_cast(&self) -> bool {
        false
    }

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Emit the column type for an inferred storage type.
    fn emit_storage_type(&self, ty: StorageType) -> &'static str;

    /// Whether this dialect supports IF EXISTS for DROP statements.
    fn supports_if_exists(&self) -> bool {
        true
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Sqlite,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
            Dialect::Sqlite => &Sqlite,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn supports_try_cast(&self) -> bool {
        self.dialect().supports_try_cast()
    }

    fn emit_storage_type(&self, ty: StorageType) -> &'static str {
        self.dialect().emit_storage_type(ty)
    }

    fn supports_if_exists(&self) -> bool {
        self.dialect().supports_if_exists()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
