//! Schema-aware loading of raw records into the engine's working table.
//!
//! A load drops the working table, infers a [`TableSchema`] from the first
//! record's keys, creates the table and inserts the rows in sequential
//! chunks of one multi-row `INSERT` each. A failing chunk is counted and
//! skipped; it never aborts the load.

mod error;
mod format;

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{InferenceSettings, LoaderSettings};
use crate::dataset::{Dataset, Record};
use crate::engine::{AnalyticalEngine, EngineConnection, EngineHandle};
use crate::inference::TypeSampler;
use crate::schema::TableSchema;
use crate::sql::{count_star, raw_sql, Dialect, DropTable, Expr, Insert, Query, TableRef};

pub use error::{LoadError, LoadResult};
pub use format::format_value_for_sql;

/// Outcome of one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub inserted_rows: usize,
    pub error_rows: usize,
    pub schema: TableSchema,
    /// Row count reported by the verification query, when it ran and
    /// succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_rows: Option<u64>,
}

impl LoadSummary {
    pub fn total_rows(&self) -> usize {
        self.inserted_rows + self.error_rows
    }

    pub fn is_complete(&self) -> bool {
        self.error_rows == 0
    }

    /// Turn a partial load into [`LoadError::PartialInsertFailure`].
    pub fn ensure_complete(self) -> LoadResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(LoadError::PartialInsertFailure {
                failed: self.error_rows,
                total: self.total_rows(),
            })
        }
    }
}

/// Loads records into one named table.
///
/// A loader runs one load at a time; a call made while another is in
/// flight returns [`LoadError::LoadInProgress`] without touching the engine.
#[derive(Debug)]
pub struct Loader {
    table: String,
    batch_size: usize,
    fold_case: bool,
    verify_count: bool,
    sampler: TypeSampler,
    in_progress: AtomicBool,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::from_settings(&LoaderSettings::default(), &InferenceSettings::default())
    }

    pub fn from_settings(loader: &LoaderSettings, inference: &InferenceSettings) -> Self {
        Self {
            table: loader.table_name.clone(),
            batch_size: loader.batch_size.max(1),
            fold_case: loader.fold_case,
            verify_count: loader.verify_count,
            sampler: TypeSampler::from_settings(inference),
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_fold_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn with_verify_count(mut self, verify_count: bool) -> Self {
        self.verify_count = verify_count;
        self
    }

    pub fn with_sampler(mut self, sampler: TypeSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_loading(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Replace the working table's contents with `rows`.
    pub async fn load(&self, engine: &EngineHandle, rows: &[Record]) -> LoadResult<LoadSummary> {
        let _guard = LoadGuard::acquire(&self.in_progress).ok_or(LoadError::LoadInProgress)?;

        if rows.is_empty() {
            debug!(table = %self.table, "no rows to load");
            return Ok(LoadSummary::default());
        }

        let mut conn = engine.connect().await.map_err(LoadError::Connection)?;
        let result = self.load_on(conn.as_mut(), engine.dialect(), rows).await;
        if let Err(err) = conn.close().await {
            warn!(table = %self.table, error = %err, "failed to close loader connection");
        }
        result
    }

    async fn load_on(
        &self,
        conn: &mut dyn EngineConnection,
        dialect: Dialect,
        rows: &[Record],
    ) -> LoadResult<LoadSummary> {
        let drop_sql = DropTable::new(&self.table).if_exists().to_sql(dialect);
        if let Err(err) = conn.query(&drop_sql).await {
            warn!(table = %self.table, error = %err, "failed to drop working table");
        }

        let dataset = Dataset::from_records(rows);
        let schema = self.sampler.infer_schema(&dataset);
        debug!(table = %self.table, columns = schema.len(), "inferred schema");

        let create_sql = schema.create_table(&self.table).to_sql(dialect);
        conn.query(&create_sql)
            .await
            .map_err(|source| LoadError::CreateTable {
                table: self.table.clone(),
                source,
            })?;

        let mut summary = LoadSummary {
            schema,
            ..LoadSummary::default()
        };

        for (index, chunk) in dataset.rows().chunks(self.batch_size).enumerate() {
            let sql = self.insert_chunk(&summary.schema, chunk, dialect).to_sql(dialect);
            match conn.query(&sql).await {
                Ok(_) => summary.inserted_rows += chunk.len(),
                Err(err) => {
                    warn!(
                        table = %self.table,
                        chunk = index,
                        rows = chunk.len(),
                        error = %err,
                        "chunk insert failed"
                    );
                    summary.error_rows += chunk.len();
                }
            }
        }

        if self.verify_count {
            summary.verified_rows = self.count_rows(conn, dialect).await;
        }

        info!(
            table = %self.table,
            inserted = summary.inserted_rows,
            failed = summary.error_rows,
            "load finished"
        );
        Ok(summary)
    }

    fn insert_chunk(
        &self,
        schema: &TableSchema,
        chunk: &[Vec<serde_json::Value>],
        dialect: Dialect,
    ) -> Insert {
        let rows = chunk.iter().map(|row| {
            schema
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| {
                    raw_sql(&format_value_for_sql(
                        value,
                        column.storage_type(),
                        self.fold_case,
                        dialect,
                    ))
                })
                .collect::<Vec<Expr>>()
        });

        Insert::into(&self.table)
            .columns(schema.column_names())
            .values_many(rows)
    }

    async fn count_rows(&self, conn: &mut dyn EngineConnection, dialect: Dialect) -> Option<u64> {
        let sql = Query::new()
            .select(vec![count_star()])
            .from(TableRef::new(&self.table))
            .to_sql(dialect);
        match conn.query(&sql).await {
            Ok(result) => {
                let count = result.scalar().and_then(|c| c.as_f64()).map(|n| n as u64);
                debug!(table = %self.table, ?count, "verified row count");
                count
            }
            Err(err) => {
                warn!(table = %self.table, error = %err, "row count verification failed");
                None
            }
        }
    }
}

/// Holds the loader's in-progress flag; clears it on drop.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
