#[path = "../common/mod.rs"]
mod common;

use common::{handle, rows, RecordingEngine, UnreachableEngine};
use pivotal::engine::{AnalyticalEngine, CellValue, EngineError};
use pivotal::loader::{format_value_for_sql, LoadError, Loader};
use pivotal::schema::ColumnType;
use pivotal::sql::{Dialect, StorageType};
use serde_json::{json, Value};

fn numbered_rows(n: usize) -> Vec<pivotal::dataset::Record> {
    rows(Value::Array(
        (0..n)
            .map(|i| json!({"id": i, "tag": format!("t{}", i % 7), "amount": format!("${}.50", i)}))
            .collect(),
    ))
}

#[test]
fn test_format_value_examples() {
    let f = |v: Value, ty| format_value_for_sql(&v, ty, true, Dialect::DuckDb);
    assert_eq!(f(Value::Null, StorageType::Double), "NULL");
    assert_eq!(f(json!("-"), StorageType::Double), "NULL");
    assert_eq!(f(json!("$1,234.50"), StorageType::Double), "1234.5");
    assert_eq!(f(json!("O'Connor"), StorageType::Varchar), "'o''connor'");
}

#[tokio::test]
async fn test_chunk_count_and_accounting() {
    let (engine, handle) = handle(RecordingEngine::new());
    let loader = Loader::new().with_batch_size(500);

    let summary = loader.load(&handle, &numbered_rows(1234)).await.unwrap();

    assert_eq!(engine.statements_starting_with("INSERT").len(), 3);
    assert_eq!(summary.inserted_rows + summary.error_rows, 1234);
    assert_eq!(summary.inserted_rows, 1234);
    assert_eq!(summary.verified_rows, Some(1234));
    assert_eq!(engine.opened(), 1);
    assert_eq!(engine.closed(), 1);
}

#[tokio::test]
async fn test_failed_chunk_does_not_stop_later_chunks() {
    let mut data = numbered_rows(1200);
    data[600].insert("tag".into(), json!("poison"));

    let (engine, handle) = handle(RecordingEngine::failing_when(|sql| {
        sql.starts_with("INSERT") && sql.contains("'poison'")
    }));
    let loader = Loader::new().with_batch_size(500);

    let summary = loader.load(&handle, &data).await.unwrap();

    assert_eq!(engine.statements_starting_with("INSERT").len(), 3);
    assert_eq!(summary.error_rows, 500);
    assert_eq!(summary.inserted_rows, 700);
    assert_eq!(summary.verified_rows, Some(700));
    assert_eq!(
        summary.clone().ensure_complete(),
        Err(LoadError::PartialInsertFailure {
            failed: 500,
            total: 1200
        })
    );
}

#[tokio::test]
async fn test_drop_failure_is_not_fatal() {
    let (_, handle) = handle(RecordingEngine::failing_when(|sql| sql.starts_with("DROP")));
    let summary = Loader::new()
        .load(&handle, &numbered_rows(3))
        .await
        .unwrap();
    assert_eq!(summary.inserted_rows, 3);
}

#[tokio::test]
async fn test_create_failure_aborts_and_closes() {
    let (engine, handle) = handle(RecordingEngine::failing_when(|sql| sql.starts_with("CREATE")));
    let err = Loader::new()
        .load(&handle, &numbered_rows(3))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::CreateTable { ref table, .. } if table == "pivot_data"));
    assert!(engine.statements_starting_with("INSERT").is_empty());
    assert_eq!(engine.closed(), 1);
}

#[tokio::test]
async fn test_verification_failure_is_swallowed() {
    let (_, handle) = handle(RecordingEngine::failing_when(|sql| {
        sql.starts_with("SELECT") && sql.contains("COUNT(*)")
    }));
    let summary = Loader::new()
        .load(&handle, &numbered_rows(4))
        .await
        .unwrap();
    assert_eq!(summary.inserted_rows, 4);
    assert_eq!(summary.verified_rows, None);
}

#[tokio::test]
async fn test_connection_failure() {
    let (_, handle) = handle(UnreachableEngine);
    let err = Loader::new()
        .load(&handle, &numbered_rows(2))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Connection(EngineError::ConnectionFailed(_))));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_concurrent_load_is_rejected() {
    let (engine, handle) = handle(RecordingEngine::new());
    let loader = Loader::new();
    let data = numbered_rows(10);

    let (first, second) = tokio::join!(loader.load(&handle, &data), loader.load(&handle, &data));

    assert_eq!(first.unwrap().inserted_rows, 10);
    assert_eq!(second.unwrap_err(), LoadError::LoadInProgress);
    assert_eq!(engine.opened(), 1);
    assert!(!loader.is_loading());
}

#[tokio::test]
async fn test_values_are_sanitized_on_the_way_in() {
    let (engine, handle) = handle(RecordingEngine::new());
    let data = rows(json!([
        {"name": "  O'Connor ", "amount": "$1,234.50"},
        {"name": "SMITH", "amount": "-"},
        {"name": null, "amount": "n/a"},
        {"name": "Lee", "amount": 12},
        {"name": "Kim", "amount": "7"},
        {"name": "Ng", "amount": "€3"},
    ]));

    let summary = Loader::new().load(&handle, &data).await.unwrap();
    assert_eq!(
        summary.schema.get("amount").unwrap().inferred_type,
        ColumnType::Numeric
    );

    let mut conn = engine.connect().await.unwrap();
    let result = conn
        .query("SELECT name, amount FROM pivot_data")
        .await
        .unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![CellValue::Text("o'connor".into()), CellValue::Float(1234.5)],
            vec![CellValue::Text("smith".into()), CellValue::Null],
            vec![CellValue::Null, CellValue::Null],
            vec![CellValue::Text("lee".into()), CellValue::Float(12.0)],
            vec![CellValue::Text("kim".into()), CellValue::Float(7.0)],
            vec![CellValue::Text("ng".into()), CellValue::Float(3.0)],
        ]
    );
}

#[tokio::test]
async fn test_case_preserving_loader() {
    let (engine, handle) = handle(RecordingEngine::new());
    let loader = Loader::new().with_table("cohort_data").with_fold_case(false);
    loader
        .load(&handle, &rows(json!([{"region": "North"}])))
        .await
        .unwrap();

    let mut conn = engine.connect().await.unwrap();
    let result = conn.query("SELECT region FROM cohort_data").await.unwrap();
    assert_eq!(result.scalar(), Some(&CellValue::Text("North".into())));
}

#[tokio::test]
async fn test_empty_input_touches_nothing() {
    let (engine, handle) = handle(RecordingEngine::new());
    let summary = Loader::new().load(&handle, &[]).await.unwrap();
    assert_eq!(summary.total_rows(), 0);
    assert_eq!(engine.opened(), 0);
}
