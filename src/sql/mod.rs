//! SQL generation module.
//!
//! A type-safe SQL builder for the statements the loader and the compilers
//! send to the engine:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`ddl`] - CREATE TABLE / DROP TABLE
//! - [`dml`] - multi-row INSERT
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;


// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_when, coalesce, col, count_star, func, lit_float, lit_int, lit_null, lit_str, raw_sql,
    star, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};
pub use types::StorageType;

pub use ddl::{ColumnDef, CreateTable, DropTable};
pub use dml::Insert;
