//! Cohort grouping error types.

use thiserror::Error;

use crate::engine::EngineError;
use crate::loader::LoadError;

/// Why a cohort grouping fell back to ungrouped rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CohortError {
    /// No engine handle is available.
    #[error("no engine available for cohort grouping")]
    NoEngine,

    /// Loading the raw rows into the cohort table failed.
    #[error("failed to load cohort rows: {0}")]
    Load(#[from] LoadError),

    /// The engine refused a connection.
    #[error("failed to connect to engine: {0}")]
    Connection(#[source] EngineError),

    /// The grouping query failed.
    #[error("cohort query failed: {0}")]
    Query(#[source] EngineError),
}
