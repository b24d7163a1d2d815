//! SQL literal formatting for loaded values.

use serde_json::Value;

use crate::sql::{lit_float, Dialect, SqlDialect, StorageType};
use crate::value::{parse_lenient_number, value_to_text};

/// Render one raw value as a SQL literal for a column of type `storage`.
///
/// `DOUBLE` columns take native numbers as-is and parse strings leniently;
/// blank strings, `"-"`, booleans and anything unparsable become `NULL`.
/// `VARCHAR` values are trimmed, lower-cased when `fold_case` is set, and
/// quoted with embedded quotes doubled.
///
/// ```ignore
/// assert_eq!(format_value_for_sql(&json!("$1,234.50"), StorageType::Double, true, Dialect::DuckDb), "1234.5");
/// assert_eq!(format_value_for_sql(&json!("O'Connor"), StorageType::Varchar, true, Dialect::DuckDb), "'o''connor'");
/// ```
pub fn format_value_for_sql(
    value: &Value,
    storage: StorageType,
    fold_case: bool,
    dialect: Dialect,
) -> String {
    if value.is_null() {
        return dialect.format_null().to_string();
    }

    match storage {
        StorageType::Double => match numeric_literal(value) {
            Some(f) => lit_float(f).to_sql(dialect),
            None => dialect.format_null().to_string(),
        },
        StorageType::Varchar => {
            let text = value_to_text(value);
            let text = text.trim();
            if fold_case {
                dialect.quote_string(&text.to_lowercase())
            } else {
                dialect.quote_string(text)
            }
        }
    }
}

fn numeric_literal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "-" {
                return None;
            }
            parse_lenient_number(trimmed)
        }
        _ => None,
    }
}
