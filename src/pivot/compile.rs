//! Running a pivot against the engine.

use tracing::{debug, error, info};

use super::column_map::ColumnMap;
use super::error::PivotError;
use super::labels::{label_groups, LabelGroup};
use super::planner::PivotPlanner;
use super::request::{PivotOptions, PivotRequest};
use super::result::PivotResult;
use crate::engine::{AnalyticalEngine, EngineConnection, EngineHandle, QueryResult};
use crate::sql::{Dialect, Query};

/// A resolved pivot, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPlan {
    pub row_fields: Vec<String>,
    pub column_fields: Vec<String>,
    pub value_field: String,
    pub groups: Vec<LabelGroup>,
    pub query: Query,
    pub dialect: Dialect,
}

impl PivotPlan {
    pub fn to_sql(&self) -> String {
        self.query.to_sql(self.dialect)
    }
}

/// Compile and run `request` against the working table.
///
/// Returns `Ok(None)` without touching the engine when there is no engine,
/// no value field or no row field. With no column field a connection is
/// opened and closed and `Ok(None)` is returned. The connection is closed
/// on every path.
pub async fn compile_pivot(
    engine: Option<&EngineHandle>,
    request: &PivotRequest,
    options: &PivotOptions,
) -> Result<Option<PivotResult>, PivotError> {
    let Some(engine) = runnable(engine, request) else {
        return Ok(None);
    };

    let mut conn = engine.connect().await.map_err(|err| {
        error!(error = %err, "pivot could not connect to engine");
        PivotError::Connection(err)
    })?;
    let result = run_pivot(conn.as_mut(), engine.dialect(), request, options).await;
    close_quietly(conn).await;

    match result {
        Ok(Some(pivot)) => {
            info!(
                rows = pivot.row_count(),
                columns = pivot.columns.len(),
                "pivot compiled"
            );
            Ok(Some(pivot))
        }
        Ok(None) => Ok(None),
        Err(err) => {
            error!(error = %err, "pivot failed");
            Err(err)
        }
    }
}

/// Resolve fields and enumerate column combinations without running the
/// aggregation. Same preconditions as [`compile_pivot`].
pub async fn plan_pivot(
    engine: Option<&EngineHandle>,
    request: &PivotRequest,
    options: &PivotOptions,
) -> Result<Option<PivotPlan>, PivotError> {
    let Some(engine) = runnable(engine, request) else {
        return Ok(None);
    };

    let mut conn = engine.connect().await.map_err(PivotError::Connection)?;
    let result = if request.column_fields.is_empty() {
        Ok(None)
    } else {
        plan_on(conn.as_mut(), engine.dialect(), request, options)
            .await
            .map(Some)
    };
    close_quietly(conn).await;
    result
}

fn runnable<'a>(
    engine: Option<&'a EngineHandle>,
    request: &PivotRequest,
) -> Option<&'a EngineHandle> {
    let Some(engine) = engine else {
        debug!("no engine; skipping pivot");
        return None;
    };
    if request.value_field().is_none() || request.row_fields.is_empty() {
        debug!("pivot request has no value or row fields; skipping");
        return None;
    }
    Some(engine)
}

async fn run_pivot(
    conn: &mut dyn EngineConnection,
    dialect: Dialect,
    request: &PivotRequest,
    options: &PivotOptions,
) -> Result<Option<PivotResult>, PivotError> {
    if request.column_fields.is_empty() {
        debug!("pivot request has no column fields; nothing to aggregate");
        return Ok(None);
    }
    let plan = plan_on(conn, dialect, request, options).await?;
    let result = run_query(conn, &plan.query, dialect).await?;
    Ok(Some(PivotResult::from_query_result(&result)))
}

async fn plan_on(
    conn: &mut dyn EngineConnection,
    dialect: Dialect,
    request: &PivotRequest,
    options: &PivotOptions,
) -> Result<PivotPlan, PivotError> {
    let planner = PivotPlanner::new(options);

    let schema = run_query(conn, &planner.schema_query(), dialect).await?;
    let columns = ColumnMap::from_result(&schema);

    let row_fields = columns.resolve_all(&request.row_fields)?;
    let column_fields = columns.resolve_all(&request.column_fields)?;
    let value_field = columns.resolve_field(request.value_field().unwrap_or_default())?;

    let distinct = run_query(conn, &planner.distinct_query(&column_fields), dialect).await?;
    let groups = label_groups(&column_fields, &distinct.rows);
    debug!(
        combinations = distinct.row_count(),
        labels = groups.len(),
        "enumerated pivot columns"
    );

    let query = planner.build_query(&row_fields, &groups, &value_field, request.aggregate);
    Ok(PivotPlan {
        row_fields,
        column_fields,
        value_field,
        groups,
        query,
        dialect,
    })
}

async fn run_query(
    conn: &mut dyn EngineConnection,
    query: &Query,
    dialect: Dialect,
) -> Result<QueryResult, PivotError> {
    let sql = query.to_sql(dialect);
    debug!(sql = %sql, "running pivot statement");
    conn.query(&sql).await.map_err(PivotError::Query)
}

async fn close_quietly(mut conn: Box<dyn EngineConnection>) {
    if let Err(err) = conn.close().await {
        debug!(error = %err, "failed to close pivot connection");
    }
}
