#[path = "../common/mod.rs"]
mod common;

use common::{handle, rows, sales_rows, RecordingEngine, UnreachableEngine};
use pivotal::cohort::{CohortCompiler, CohortError, CohortResult};
use pivotal::engine::{AnalyticalEngine, EngineConnection};
use serde_json::{json, Value};

fn sorted(values: &Value) -> Vec<String> {
    let mut out: Vec<String> = values
        .as_array()
        .map(|a| a.iter().map(|v| v.to_string()).collect())
        .unwrap_or_default();
    out.sort();
    out
}

#[tokio::test]
async fn test_no_expression_returns_rows_unchanged() {
    let data = sales_rows();
    let result = CohortCompiler::new().group_by_cohort(None, &data, None).await;

    assert_eq!(result, CohortResult::Ungrouped(data.clone()));
    assert_eq!(
        result.to_json(),
        json!({"values": [
            {"category": "A", "region": "North", "sales": "$100"},
            {"category": "A", "region": "South", "sales": "50"},
            {"category": "B", "region": "North", "sales": "$75"},
        ]})
    );
}

#[tokio::test]
async fn test_group_by_column() {
    let mut data = sales_rows();
    data.extend(rows(json!([{"category": "C", "region": null, "sales": "1"}])));
    let (_, engine) = handle(RecordingEngine::new());

    let result = CohortCompiler::new()
        .group_by_cohort(Some(&engine), &data, Some("column(region)"))
        .await;

    assert_eq!(result.cohort_names(), vec!["North", "South"]);
    let CohortResult::Grouped(cohorts) = result else {
        panic!("expected grouped rows");
    };
    assert_eq!(cohorts[0].len(), 2);
    assert_eq!(sorted(&cohorts[0].columns["category"]), vec!["\"A\"", "\"B\""]);
    assert_eq!(cohorts[1].columns["category"], json!(["A"]));
    assert_eq!(cohorts[1].columns["sales"], json!([50.0]));
    assert!(!cohorts[0].columns.contains_key("cohort_value"));
}

#[tokio::test]
async fn test_identifier_raw_sql_and_literal_expressions() {
    let data = sales_rows();
    let (_, engine) = handle(RecordingEngine::new());
    let compiler = CohortCompiler::new();

    let by_name = compiler
        .group_by_cohort(Some(&engine), &data, Some("category"))
        .await;
    assert_eq!(by_name.cohort_names(), vec!["A", "B"]);

    let by_sql = compiler
        .group_by_cohort(Some(&engine), &data, Some("?{UPPER(region)}"))
        .await;
    assert_eq!(by_sql.cohort_names(), vec!["NORTH", "SOUTH"]);

    let single = compiler
        .group_by_cohort(Some(&engine), &data, Some("'everyone'"))
        .await;
    assert_eq!(single.cohort_names(), vec!["everyone"]);
}

#[tokio::test]
async fn test_each_grouping_uses_and_drops_its_own_table() {
    let (engine, handle) = handle(RecordingEngine::new());
    let compiler = CohortCompiler::new();
    for _ in 0..2 {
        let result = compiler
            .group_by_cohort(Some(&handle), &sales_rows(), Some("column(region)"))
            .await;
        assert!(result.is_grouped());
    }

    let statements = engine.statements();
    assert!(statements.iter().all(|s| !s.contains("\"pivot_data\"")));

    let created: Vec<String> = engine
        .statements_starting_with("CREATE TABLE \"cohort_data_")
        .iter()
        .filter_map(|s| s.split('"').nth(1).map(str::to_string))
        .collect();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0], created[1]);

    // Each table is dropped after its grouping query ran.
    for table in &created {
        let query_at = statements
            .iter()
            .position(|s| s.contains("\"cohort_value\"") && s.contains(table.as_str()))
            .unwrap();
        let dropped_at = statements
            .iter()
            .rposition(|s| s.starts_with("DROP TABLE") && s.contains(table.as_str()))
            .unwrap();
        assert!(dropped_at > query_at);
    }
    assert_eq!(engine.opened(), engine.closed());

    let mut conn = handle.connect().await.unwrap();
    let tables = conn
        .query("SELECT name FROM sqlite_master WHERE type = 'table'")
        .await
        .unwrap();
    assert_eq!(tables.row_count(), 0);
    conn.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_groupings_are_independent() {
    let (_, engine) = handle(RecordingEngine::new());
    let compiler = CohortCompiler::new();
    let teams = rows(json!([
        {"team": "red", "score": 1},
        {"team": "blue", "score": 2},
        {"team": "red", "score": 3},
    ]));

    for _ in 0..25 {
        let sales = sales_rows();
        let (by_region, by_team) = tokio::join!(
            compiler.try_group_by_cohort(Some(&engine), &sales, Some("column(region)")),
            compiler.try_group_by_cohort(Some(&engine), &teams, Some("column(team)")),
        );
        assert_eq!(by_region.unwrap().cohort_names(), vec!["North", "South"]);
        assert_eq!(by_team.unwrap().cohort_names(), vec!["blue", "red"]);
    }
}

#[tokio::test]
async fn test_failures_fall_back_to_ungrouped_rows() {
    let data = sales_rows();
    let compiler = CohortCompiler::new();

    let no_engine = compiler
        .group_by_cohort(None, &data, Some("column(region)"))
        .await;
    assert_eq!(no_engine, CohortResult::Ungrouped(data.clone()));
    assert_eq!(
        compiler
            .try_group_by_cohort(None, &data, Some("column(region)"))
            .await,
        Err(CohortError::NoEngine)
    );

    let (engine, failing) = handle(RecordingEngine::failing_when(|sql| {
        sql.contains("\"cohort_value\"")
    }));
    let query_failure = compiler
        .group_by_cohort(Some(&failing), &data, Some("column(region)"))
        .await;
    assert_eq!(query_failure, CohortResult::Ungrouped(data.clone()));
    assert_eq!(engine.opened(), engine.closed());

    let (_, unreachable) = handle(UnreachableEngine);
    let load_failure = compiler
        .try_group_by_cohort(Some(&unreachable), &data, Some("column(region)"))
        .await;
    assert!(matches!(load_failure, Err(CohortError::Load(_))));
}

#[tokio::test]
async fn test_empty_rows_stay_ungrouped() {
    let result = CohortCompiler::new()
        .try_group_by_cohort(None, &[], Some("column(region)"))
        .await;
    assert_eq!(result, Ok(CohortResult::Ungrouped(Vec::new())));
}

#[tokio::test]
async fn test_traces_from_cohorts() {
    let (_, engine) = handle(RecordingEngine::new());
    let config = json!({"type": "box", "marker": {"color": "red"}});

    let traces = CohortCompiler::new()
        .group_by_cohort(Some(&engine), &sales_rows(), Some("column(region)"))
        .await
        .into_traces(&config);

    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["name"], json!("North"));
    assert_eq!(traces[0]["type"], json!("box"));
    assert_eq!(traces[1]["name"], json!("South"));
    assert_eq!(traces[1]["sales"], json!([50.0]));
    assert_eq!(config, json!({"type": "box", "marker": {"color": "red"}}));

    let ungrouped = CohortResult::Ungrouped(sales_rows()).into_traces(&config);
    assert_eq!(ungrouped.len(), 1);
    assert!(ungrouped[0].get("name").is_none());
    assert_eq!(ungrouped[0]["region"], json!(["North", "South", "North"]));
}
