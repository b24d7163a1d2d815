//! Loader error types.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that abort a load, or that a caller asks for explicitly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Another load on the same loader has not finished yet.
    #[error("a load is already in progress")]
    LoadInProgress,

    /// The engine refused a connection.
    #[error("failed to connect to engine: {0}")]
    Connection(#[source] EngineError),

    /// The working table could not be created.
    #[error("failed to create table '{table}': {source}")]
    CreateTable {
        table: String,
        #[source]
        source: EngineError,
    },

    /// Some chunks failed to insert. Only produced by
    /// [`LoadSummary::ensure_complete`](super::LoadSummary::ensure_complete).
    #[error("{failed} of {total} rows failed to insert")]
    PartialInsertFailure { failed: usize, total: usize },
}

impl LoadError {
    /// Check if calling `load` again may succeed without other changes.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::LoadInProgress => true,
            Self::Connection(err) => err.is_retriable(),
            Self::CreateTable { .. } | Self::PartialInsertFailure { .. } => false,
        }
    }
}
