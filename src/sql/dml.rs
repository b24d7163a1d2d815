//! DML (Data Manipulation Language) support.
//!
//! Multi-row INSERT builder used for chunked loading.
//!
//! # Examples
//!
//! ```ignore
//! use pivotal::sql::dml::Insert;
//! use pivotal::sql::expr::{lit_str, lit_float};
//!
//! let insert = Insert::into("pivot_data")
//!     .columns(["region", "sales"])
//!     .values([lit_str("north"), lit_float(10.5)]);
//! ```

use super::dialect::Dialect;
use super::expr::Expr;
use super::token::{Token, TokenStream};

// ============================================================================
// INSERT
// ============================================================================

/// INSERT statement.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Set the target column list.
    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Add a single row of values.
    pub fn values(mut self, vals: impl IntoIterator<Item = impl Into<Expr>>) -> Self {
        self.values
            .push(vals.into_iter().map(|v| v.into()).collect());
        self
    }

    /// Add multiple rows of values.
    pub fn values_many(mut self, rows: impl IntoIterator<Item = Vec<Expr>>) -> Self {
        self.values.extend(rows);
        self
    }

    /// Number of value rows.
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        // INSERT INTO
        ts.push(Token::Insert).space().push(Token::Into).space();
        ts.push(Token::Ident(self.table.clone()));

        // Columns
        if !self.columns.is_empty() {
            ts.space().lparen();
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.push(Token::Ident(col.clone()));
            }
            ts.rparen();
        }

        // VALUES
        if !self.values.is_empty() {
            ts.space().push(Token::Values);
            for (row_idx, row) in self.values.iter().enumerate() {
                if row_idx > 0 {
                    ts.comma();
                }
                ts.space().lparen();
                for (i, val) in row.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&val.to_tokens());
                }
                ts.rparen();
            }
        }

        ts
    }
}
