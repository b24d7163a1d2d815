//! # Pivotal
//!
//! Client-side pivoting and cohort grouping over an embedded analytical
//! SQL engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Raw rows (JSON records)                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [inference]
//! ┌─────────────────────────────────────────────────────────┐
//! │           TableSchema (Numeric | Text per column)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [loader]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Working table in the engine (owned by manager)      │
//! └─────────────────────────────────────────────────────────┘
//!                │                           │
//!                ▼ [pivot]                   ▼ [cohort]
//! ┌──────────────────────────┐  ┌──────────────────────────┐
//! │  PivotResult (rows/cols) │  │  CohortResult (traces)   │
//! └──────────────────────────┘  └──────────────────────────┘
//! ```
//!
//! All SQL is built through [`sql`] and rendered per [`Dialect`] at the end.

pub mod cohort;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod inference;
pub mod loader;
pub mod pivot;
pub mod schema;
pub mod session;
pub mod sql;
pub mod value;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cohort::{CohortCompiler, CohortExpression, CohortResult};
    pub use crate::config::Settings;
    pub use crate::dataset::{records_from_json, Dataset, Record};
    pub use crate::engine::{
        listener, EngineHandle, EngineManager, EngineState, EngineStatus, SqliteProvider,
    };
    pub use crate::inference::{SamplingStrategy, TypeSampler};
    pub use crate::loader::{Loader, LoadSummary};
    pub use crate::pivot::{compile_pivot, AggregateFunc, PivotOptions, PivotRequest, PivotResult};
    pub use crate::schema::{ColumnType, TableSchema};
    pub use crate::session::PivotSession;
    pub use crate::sql::Dialect;
}

pub use session::PivotSession;
pub use sql::Dialect;
