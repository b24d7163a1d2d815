//! Pivot compiler error types.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors raised while compiling or running a pivot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    /// The engine refused a connection.
    #[error("failed to connect to engine: {0}")]
    Connection(#[source] EngineError),

    /// A requested field matches no column of the working table.
    #[error("unknown field '{field}' (available: {})", available.join(", "))]
    UnknownField {
        field: String,
        available: Vec<String>,
    },

    /// The schema query, distinct query or aggregation query failed.
    #[error("pivot query failed: {0}")]
    Query(#[source] EngineError),

    /// The aggregate name is not one of SUM, AVG, MIN, MAX, COUNT.
    #[error("unknown aggregate function '{0}'")]
    UnknownAggregate(String),
}
