//! Embedded analytical engine: collaborator traits, result types, and the
//! lifecycle manager that owns the singleton handle.
//!
//! The engine itself is external. Everything here talks to it through three
//! seams:
//!
//! - [`EngineProvider`] selects a bundle, creates an execution context and
//!   instantiates the engine (the slow, timed part).
//! - [`AnalyticalEngine`] hands out connections and can be terminated.
//! - [`EngineConnection`] runs one SQL statement at a time.
//!
//! [`SqliteProvider`] is the bundled backend: an in-process SQLite database
//! shared between connections.

pub mod error;
pub mod manager;
pub mod sqlite;
pub mod status;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dataset::Record;
use crate::sql::Dialect;

pub use error::{EngineError, EngineResult};
pub use manager::{listener, EngineManager, StatusListener};
pub use sqlite::{SqliteEngine, SqliteProvider};
pub use status::{download_progress, EngineState, EngineStatus};

/// Shared handle to a running engine.
pub type EngineHandle = Arc<dyn AnalyticalEngine>;

/// A running analytical engine.
#[async_trait]
pub trait AnalyticalEngine: Send + Sync {
    /// Open a new connection.
    async fn connect(&self) -> EngineResult<Box<dyn EngineConnection>>;

    /// Release the engine. Connections opened afterwards fail.
    async fn terminate(&self) -> EngineResult<()>;

    /// SQL dialect the engine accepts.
    fn dialect(&self) -> Dialect;
}

/// One open connection to the engine.
#[async_trait]
pub trait EngineConnection: Send {
    /// Execute one statement and materialize its result.
    ///
    /// Statements without a result set return an empty [`QueryResult`].
    async fn query(&mut self, sql: &str) -> EngineResult<QueryResult>;

    /// Close the connection. Further queries fail with
    /// [`EngineError::ConnectionClosed`].
    async fn close(&mut self) -> EngineResult<()>;
}

/// Bundle chosen for this host during initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBundle {
    pub name: String,
    pub version: String,
}

/// Download progress callback handed to [`EngineProvider::instantiate`].
///
/// Called with bytes loaded and, when known, bytes total.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<dyn Fn(u64, Option<u64>) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new(f: impl Fn(u64, Option<u64>) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// A reporter that discards every update.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    pub fn report(&self, loaded: u64, total: Option<u64>) {
        (self.inner)(loaded, total)
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressReporter")
    }
}

impl fmt::Debug for dyn AnalyticalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnalyticalEngine")
    }
}

/// Source of engine instances, driven by [`EngineManager`].
#[async_trait]
pub trait EngineProvider: Send + Sync {
    async fn select_bundle(&self) -> EngineResult<EngineBundle>;

    async fn create_context(&self, bundle: &EngineBundle) -> EngineResult<()>;

    async fn instantiate(
        &self,
        bundle: &EngineBundle,
        progress: ProgressReporter,
    ) -> EngineResult<EngineHandle>;
}

// =============================================================================
// Query results
// =============================================================================

/// A single cell as returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    /// 128-bit integers (e.g. DuckDB HUGEINT).
    BigInt(i128),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::BigInt(n) => Some(*n as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to JSON without any coercion of text.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(n) => Value::from(*n),
            CellValue::BigInt(n) => match i64::try_from(*n) {
                Ok(small) => Value::from(small),
                Err(_) => serde_json::Number::from_f64(*n as f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            },
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::BigInt(n) => write!(f, "{n}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Column metadata of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
}

/// Ordered result-set columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSchema {
    pub fields: Vec<Field>,
}

impl ResultSchema {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names
                .into_iter()
                .map(|n| Field { name: n.into() })
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Materialized result of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub schema: ResultSchema,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First cell of the first row.
    pub fn scalar(&self) -> Option<&CellValue> {
        self.rows.first().and_then(|r| r.first())
    }

    /// Rows as JSON objects keyed by field name, in field order.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.schema
                    .names()
                    .zip(row.iter())
                    .map(|(name, cell)| (name.to_string(), cell.to_json()))
                    .collect()
            })
            .collect()
    }
}
