//! SQLite SQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Booleans stored as integers (`1`/`0`)
//! - No TRY_CAST; `CAST` never raises and yields `0` for text that is not
//!   numeric

use super::helpers;
use super::SqlDialect;
use crate::sql::types::StorageType;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_try_cast(&self) -> bool {
        false
    }

    fn emit_storage_type(&self, ty: StorageType) -> &'static str {
        helpers::emit_storage_type_standard(ty)
    }
}
