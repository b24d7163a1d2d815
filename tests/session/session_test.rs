#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{sales_rows, Script, ScriptedProvider};
use pivotal::config::Settings;
use pivotal::engine::{AnalyticalEngine, EngineConnection, EngineState, SqliteProvider};
use pivotal::pivot::PivotRequest;
use pivotal::PivotSession;
use serde_json::json;

#[tokio::test]
async fn test_load_then_pivot() {
    let session = PivotSession::new(Arc::new(SqliteProvider::new()));
    let engine = session.initialize_engine(None).await.unwrap();
    assert_eq!(session.status().state, EngineState::Success);

    let summary = session.load_rows(&engine, &sales_rows()).await.unwrap();
    assert_eq!(summary.inserted_rows, 3);
    assert!(!session.is_loading());

    let pivot = session
        .compile_pivot(
            Some(&engine),
            &PivotRequest::new(["category"], ["region"]).value("sales"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pivot.row_count(), 2);
    assert!(!session.is_pivoting());

    session.cleanup(None).await;
    assert_eq!(session.status().state, EngineState::Idle);
    assert!(session.handle().is_none());
}

#[tokio::test]
async fn test_pivot_flag_cleared_after_error() {
    let session = PivotSession::new(Arc::new(SqliteProvider::new()));
    let engine = session.initialize_engine(None).await.unwrap();
    session.load_rows(&engine, &sales_rows()).await.unwrap();

    let result = session
        .compile_pivot(
            Some(&engine),
            &PivotRequest::new(["category"], ["nowhere"]).value("sales"),
        )
        .await;

    assert!(result.is_err());
    assert!(!session.is_pivoting());
}

#[tokio::test]
async fn test_cohorts_do_not_disturb_pivot_table() {
    let session = PivotSession::new(Arc::new(SqliteProvider::new()));
    let engine = session.initialize_engine(None).await.unwrap();
    session.load_rows(&engine, &sales_rows()).await.unwrap();

    let cohorts = session
        .group_by_cohort(
            &common::rows(json!([{"team": "red"}, {"team": "blue"}, {"team": "red"}])),
            Some("column(team)"),
        )
        .await;
    assert_eq!(cohorts.cohort_names(), vec!["blue", "red"]);

    let pivot = session
        .compile_pivot(
            Some(&engine),
            &PivotRequest::new(["category"], ["region"]).value("sales"),
        )
        .await
        .unwrap();
    assert!(pivot.is_some());
}

#[tokio::test]
async fn test_cohorts_without_ready_engine_are_ungrouped() {
    let session = PivotSession::new(ScriptedProvider::new(vec![Script::Succeed(vec![])]));
    let rows = sales_rows();

    let result = session.group_by_cohort(&rows, Some("column(region)")).await;

    assert!(!result.is_grouped());
    assert_eq!(result.to_json()["values"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_settings_route_tables() {
    let settings = Settings::from_toml_str(
        "[loader]\ntable_name = \"facts\"\n\n[cohort]\ntable_name = \"groups\"\n",
    )
    .unwrap();
    let session = PivotSession::from_settings(Arc::new(SqliteProvider::new()), &settings);
    let engine = session.initialize_engine(None).await.unwrap();
    session.load_rows(&engine, &sales_rows()).await.unwrap();

    let mut conn = engine.connect().await.unwrap();
    let count = conn.query("SELECT COUNT(*) FROM facts").await.unwrap();
    assert_eq!(count.scalar().and_then(|c| c.as_f64()), Some(3.0));
    conn.close().await.unwrap();

    let pivot = session
        .compile_pivot(
            Some(&engine),
            &PivotRequest::new(["category"], ["region"]).value("sales"),
        )
        .await
        .unwrap();
    assert!(pivot.is_some());
}
