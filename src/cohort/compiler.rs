//! Grouping raw rows into cohorts through the engine.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::CohortError;
use super::expression::CohortExpression;
use super::result::{Cohort, CohortResult};
use crate::config::{InferenceSettings, LoaderSettings, Settings};
use crate::dataset::Record;
use crate::engine::{AnalyticalEngine, EngineConnection, EngineHandle, QueryResult};
use crate::loader::Loader;
use crate::sql::{
    col, star, Dialect, DropTable, ExprExt, OrderByExpr, Query, SelectExpr, TableRef,
};

/// Alias of the cohort key column in the grouping query.
pub const COHORT_VALUE: &str = "cohort_value";

/// Partitions a trace's rows by a cohort expression.
///
/// Every grouping loads its rows case-preserving into a table of its own,
/// named `<prefix>_<uuid>`, and drops it afterwards. Concurrent groupings
/// never share a table or a load guard, and the pivot working table is
/// never touched.
#[derive(Debug, Clone)]
pub struct CohortCompiler {
    table_prefix: String,
    loader: LoaderSettings,
    inference: InferenceSettings,
}

impl Default for CohortCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl CohortCompiler {
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            table_prefix: settings.cohort.table_name.clone(),
            loader: settings.loader.clone(),
            inference: settings.inference.clone(),
        }
    }

    /// Prefix of the per-grouping table names.
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// A fresh table name for one grouping.
    fn scratch_table(&self) -> String {
        format!("{}_{}", self.table_prefix, Uuid::new_v4().simple())
    }

    fn loader_for(&self, table: &str) -> Loader {
        Loader::from_settings(&self.loader, &self.inference)
            .with_table(table)
            .with_fold_case(false)
            .with_verify_count(false)
    }

    /// Group `rows` by `expression`, falling back to the ungrouped rows on
    /// any failure.
    pub async fn group_by_cohort(
        &self,
        engine: Option<&EngineHandle>,
        rows: &[Record],
        expression: Option<&str>,
    ) -> CohortResult {
        match self.try_group_by_cohort(engine, rows, expression).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "cohort grouping failed; using ungrouped rows");
                CohortResult::Ungrouped(rows.to_vec())
            }
        }
    }

    /// Group `rows` by `expression`, reporting why grouping failed.
    pub async fn try_group_by_cohort(
        &self,
        engine: Option<&EngineHandle>,
        rows: &[Record],
        expression: Option<&str>,
    ) -> Result<CohortResult, CohortError> {
        let Some(expression) = expression.and_then(CohortExpression::parse) else {
            return Ok(CohortResult::Ungrouped(rows.to_vec()));
        };
        if rows.is_empty() {
            return Ok(CohortResult::Ungrouped(Vec::new()));
        }
        let engine = engine.ok_or(CohortError::NoEngine)?;

        let table = self.scratch_table();
        let summary = match self.loader_for(&table).load(engine, rows).await {
            Ok(summary) => summary,
            Err(err) => {
                drop_scratch(engine, &table).await;
                return Err(err.into());
            }
        };
        if !summary.is_complete() {
            warn!(
                table = %table,
                failed = summary.error_rows,
                total = summary.total_rows(),
                "some cohort rows failed to load"
            );
        }

        let dialect = engine.dialect();
        let sql = self.grouping_sql(&table, &expression, dialect);
        debug!(expression = %expression, sql = %sql, "running cohort query");

        let mut conn = match engine.connect().await {
            Ok(conn) => conn,
            Err(err) => {
                drop_scratch(engine, &table).await;
                return Err(CohortError::Connection(err));
            }
        };
        let result = conn.query(&sql).await.map_err(CohortError::Query);
        drop_table_on(conn.as_mut(), &table, dialect).await;
        if let Err(err) = conn.close().await {
            debug!(error = %err, "failed to close cohort connection");
        }

        let cohorts = group_rows(&result?);
        info!(expression = %expression, cohorts = cohorts.len(), "grouped rows into cohorts");
        Ok(CohortResult::Grouped(cohorts))
    }

    /// `SELECT <e> AS cohort_value, * FROM table WHERE <e> IS NOT NULL ORDER BY cohort_value`.
    pub fn grouping_query(&self, table: &str, expression: &CohortExpression) -> Query {
        let key = expression.to_expr();
        Query::new()
            .select(vec![key.clone().alias(COHORT_VALUE), SelectExpr::new(star())])
            .from(TableRef::new(table))
            .filter(key.is_not_null())
            .order_by(vec![OrderByExpr::new(col(COHORT_VALUE))])
    }

    /// Rendered grouping query, for inspection.
    pub fn grouping_sql(
        &self,
        table: &str,
        expression: &CohortExpression,
        dialect: Dialect,
    ) -> String {
        self.grouping_query(table, expression).to_sql(dialect)
    }
}

/// Drop a grouping table over an open connection. Failures are logged.
async fn drop_table_on(conn: &mut dyn EngineConnection, table: &str, dialect: Dialect) {
    let sql = DropTable::new(table).if_exists().to_sql(dialect);
    if let Err(err) = conn.query(&sql).await {
        warn!(table = %table, error = %err, "failed to drop cohort table");
    }
}

/// Drop a grouping table after a failed load, on a connection of its own.
async fn drop_scratch(engine: &EngineHandle, table: &str) {
    match engine.connect().await {
        Ok(mut conn) => {
            drop_table_on(conn.as_mut(), table, engine.dialect()).await;
            if let Err(err) = conn.close().await {
                debug!(error = %err, "failed to close cohort connection");
            }
        }
        Err(err) => debug!(table = %table, error = %err, "cannot reach engine to drop cohort table"),
    }
}

/// Split a grouping result into cohorts keyed by the first column, in
/// first-seen order, with that column stripped and the rest transposed.
fn group_rows(result: &QueryResult) -> Vec<Cohort> {
    let names: Vec<&str> = result.schema.names().skip(1).collect();
    let mut cohorts: Vec<Cohort> = Vec::new();

    for row in &result.rows {
        let Some((key, values)) = row.split_first() else {
            continue;
        };
        let name = key.to_string();
        let index = match cohorts.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                cohorts.push(Cohort {
                    name,
                    columns: names
                        .iter()
                        .map(|n| (n.to_string(), Value::Array(Vec::new())))
                        .collect::<Map<String, Value>>(),
                });
                cohorts.len() - 1
            }
        };

        for (column, cell) in names.iter().zip(values) {
            if let Some(Value::Array(items)) = cohorts[index].columns.get_mut(*column) {
                items.push(cell.to_json());
            }
        }
    }

    cohorts
}
