//! Value helpers shared by inference, loading and result shaping.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::engine::CellValue;

/// Currency symbols, thousands separators and whitespace.
static NUMERIC_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£¥₹,\s]").expect("valid numeric noise pattern"));

static NON_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid identifier pattern"));

/// Parse a human-formatted number such as `"$1,234.50"` or `" 1e3 "`.
///
/// Returns `None` for blank input, non-numeric text and non-finite results.
pub fn parse_lenient_number(s: &str) -> Option<f64> {
    let cleaned = NUMERIC_NOISE.replace_all(s, "");
    if cleaned.is_empty() {
        return None;
    }
    // Rust accepts "inf"/"nan" spellings; only digit-bearing input counts.
    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// True for null, missing-equivalent and whitespace-only string values.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numeric per inference rules: a JSON number, or a string that parses
/// leniently. Booleans never count.
pub fn is_numeric_value(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => parse_lenient_number(s).is_some(),
        _ => false,
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_identifier(s: &str) -> String {
    NON_IDENT.replace_all(s, "_").into_owned()
}

/// Text form of a raw value, as used for SQL text columns.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON number from an `f64`, emitting integers without a fraction.
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Normalize one result cell for display.
///
/// Integers (including 128-bit) become JSON numbers and strings that hold a
/// plain number become numbers. Everything else is passed through.
pub fn normalize_cell(cell: &CellValue) -> Value {
    match cell {
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() && !s.trim().is_empty() => number_value(f),
            _ => Value::String(s.clone()),
        },
        other => other.to_json(),
    }
}
