//! Engine-specific error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while starting, talking to, or stopping the embedded engine.
///
/// `Clone` so one failed initialization can be handed to every caller
/// waiting on the same attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No engine bundle could be chosen for this host.
    #[error("failed to select engine bundle: {0}")]
    BundleSelection(String),

    /// The execution context (worker) could not be created.
    #[error("failed to create execution context: {0}")]
    ContextCreation(String),

    /// The engine failed to instantiate from its bundle.
    #[error("failed to instantiate engine: {0}")]
    Instantiation(String),

    /// Instantiation did not settle within the configured window.
    #[error("engine initialization timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Opening a connection failed.
    #[error("engine connection failed: {0}")]
    ConnectionFailed(String),

    /// A statement was rejected by the engine.
    #[error("query failed: {message}")]
    QueryFailed {
        /// Engine error text.
        message: String,
        /// Statement that failed.
        sql: String,
    },

    /// The connection was used after `close`.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The engine was used after `terminate`.
    #[error("engine has been terminated")]
    Terminated,
}

impl EngineError {
    /// Create a query error.
    pub fn query(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Check if this error came from the initialization sequence.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            Self::BundleSelection(_)
                | Self::ContextCreation(_)
                | Self::Instantiation(_)
                | Self::Timeout(_)
        )
    }

    /// Check if this error is retriable.
    ///
    /// Failed initializations are discarded by the manager, so a fresh
    /// `initialize` call may succeed.
    pub fn is_retriable(&self) -> bool {
        self.is_initialization() || matches!(self, Self::ConnectionFailed(_))
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        Self::QueryFailed {
            message: err.to_string(),
            sql: String::new(),
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::ConnectionFailed(format!("engine task failed: {err}"))
    }
}
