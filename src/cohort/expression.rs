//! Cohort grouping expressions.

use std::fmt;

use crate::sql::{col, raw_sql, Dialect, Expr, ExprExt};

/// A parsed `cohort_on` setting.
///
/// | Input              | Form                          |
/// |--------------------|-------------------------------|
/// | `?{upper(region)}` | raw SQL, used verbatim        |
/// | `column(region)`   | quoted column reference       |
/// | `'x'` or `"x"`     | literal, passed through as-is |
/// | `region`           | bare column name, quoted      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CohortExpression {
    RawSql(String),
    ColumnRef(String),
    Literal(String),
    Identifier(String),
}

impl CohortExpression {
    /// Parse an expression string. Blank input means no grouping.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(inner) = s.strip_prefix("?{").and_then(|r| r.strip_suffix('}')) {
            return Some(Self::RawSql(inner.trim().to_string()));
        }
        if let Some(inner) = s.strip_prefix("column(").and_then(|r| r.strip_suffix(')')) {
            return Some(Self::ColumnRef(inner.trim().to_string()));
        }
        if is_quoted(s) {
            return Some(Self::Literal(s.to_string()));
        }
        Some(Self::Identifier(s.to_string()))
    }

    /// SQL expression for this cohort key.
    pub fn to_expr(&self) -> Expr {
        match self {
            Self::RawSql(sql) => raw_sql(sql).paren(),
            Self::ColumnRef(name) | Self::Identifier(name) => col(name),
            Self::Literal(text) => raw_sql(text),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_expr().to_sql(dialect)
    }
}

impl fmt::Display for CohortExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawSql(sql) => write!(f, "?{{{sql}}}"),
            Self::ColumnRef(name) => write!(f, "column({name})"),
            Self::Literal(text) | Self::Identifier(text) => f.write_str(text),
        }
    }
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')))
}
