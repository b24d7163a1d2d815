#[path = "../common/mod.rs"]
mod common;

use common::{handle, rows, sales_rows, RecordingEngine, UnreachableEngine};
use pivotal::dataset::Record;
use pivotal::engine::EngineHandle;
use pivotal::loader::Loader;
use pivotal::pivot::{
    compile_pivot, plan_pivot, AggregateFunc, PivotError, PivotOptions, PivotRequest,
};
use serde_json::{json, Value};
use std::sync::Arc;

async fn loaded(loader: Loader, data: Vec<Record>) -> (Arc<RecordingEngine>, EngineHandle) {
    let (engine, handle) = handle(RecordingEngine::new());
    loader.load(&handle, &data).await.unwrap();
    (engine, handle)
}

fn number(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64)
}

#[tokio::test]
async fn test_category_by_region_sum() {
    let (_, engine) = loaded(Loader::new(), sales_rows()).await;
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let pivot = compile_pivot(Some(&engine), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    let keys: Vec<_> = pivot.columns.iter().map(|c| c.accessor_key.as_str()).collect();
    assert_eq!(keys, vec!["category", "region_north", "region_south"]);
    assert_eq!(pivot.row_count(), 2);

    let a = pivot.find_row("category", &json!("a")).unwrap();
    assert_eq!(number(a.get("region_north")), Some(100.0));
    assert_eq!(number(a.get("region_south")), Some(50.0));

    let b = pivot.find_row("category", &json!("b")).unwrap();
    assert_eq!(number(b.get("region_north")), Some(75.0));
    assert_eq!(b.get("region_south"), Some(&Value::Null));
}

#[tokio::test]
async fn test_case_preserving_load_keeps_label_case() {
    let (_, engine) = loaded(Loader::new().with_fold_case(false), sales_rows()).await;
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let pivot = compile_pivot(Some(&engine), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    let headers: Vec<_> = pivot.columns.iter().map(|c| c.header.as_str()).collect();
    assert_eq!(headers, vec!["category", "region_North", "region_South"]);
    assert!(pivot.find_row("category", &json!("A")).is_some());
}

#[tokio::test]
async fn test_count_and_average() {
    let data = rows(json!([
        {"team": "x", "kind": "a", "score": "10"},
        {"team": "x", "kind": "a", "score": "20"},
        {"team": "x", "kind": "b", "score": "-"},
        {"team": "y", "kind": "b", "score": "1,000"},
    ]));
    let (_, engine) = loaded(Loader::new(), data).await;

    let count = compile_pivot(
        Some(&engine),
        &PivotRequest::new(["team"], ["kind"])
            .value("score")
            .aggregate(AggregateFunc::Count),
        &PivotOptions::default(),
    )
    .await
    .unwrap()
    .unwrap();
    let x = count.find_row("team", &json!("x")).unwrap();
    assert_eq!(number(x.get("kind_a")), Some(2.0));
    assert_eq!(number(x.get("kind_b")), Some(1.0));
    let y = count.find_row("team", &json!("y")).unwrap();
    assert_eq!(number(y.get("kind_a")), Some(0.0));

    let avg = compile_pivot(
        Some(&engine),
        &PivotRequest::new(["team"], ["kind"])
            .value("score")
            .aggregate(AggregateFunc::Avg),
        &PivotOptions::default(),
    )
    .await
    .unwrap()
    .unwrap();
    let x = avg.find_row("team", &json!("x")).unwrap();
    assert_eq!(number(x.get("kind_a")), Some(15.0));
    let y = avg.find_row("team", &json!("y")).unwrap();
    assert_eq!(number(y.get("kind_b")), Some(1000.0));
}

#[tokio::test]
async fn test_colliding_labels_merge_into_one_column() {
    let data = rows(json!([
        {"category": "A", "region": "North America", "sales": 10},
        {"category": "A", "region": "North-America", "sales": 5},
        {"category": "A", "region": "South", "sales": 1},
    ]));
    let (_, engine) = loaded(Loader::new(), data).await;
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let pivot = compile_pivot(Some(&engine), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    let keys: Vec<_> = pivot.columns.iter().map(|c| c.accessor_key.as_str()).collect();
    assert_eq!(keys, vec!["category", "region_north_america", "region_south"]);
    let a = pivot.find_row("category", &json!("a")).unwrap();
    assert_eq!(number(a.get("region_north_america")), Some(15.0));
}

#[tokio::test]
async fn test_numeric_column_field_and_dotted_names() {
    let data = rows(json!([
        {"user.region": "east", "year": 2020, "amount": "$5"},
        {"user.region": "east", "year": 2021, "amount": "$7"},
        {"user.region": "west", "year": 2020, "amount": "$1"},
    ]));
    let (_, engine) = loaded(Loader::new(), data).await;
    let request = PivotRequest::new(["user_region"], ["year"]).value("amount");

    let pivot = compile_pivot(Some(&engine), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(pivot.columns[0].header, "user.region");
    assert_eq!(pivot.columns[0].accessor_key, "user_region");
    let east = pivot.find_row("user_region", &json!("east")).unwrap();
    assert_eq!(number(east.get("year_2020")), Some(5.0));
    assert_eq!(number(east.get("year_2021")), Some(7.0));
}

#[tokio::test]
async fn test_missing_inputs_skip_the_engine() {
    let (engine, handle) = handle(RecordingEngine::new());
    let options = PivotOptions::default();

    let no_value = PivotRequest::new(["category"], ["region"]);
    let blank_value = PivotRequest::new(["category"], ["region"]).value("  ");
    let no_rows = PivotRequest::new(Vec::<String>::new(), ["region"]).value("sales");

    for request in [&no_value, &blank_value, &no_rows] {
        assert_eq!(compile_pivot(Some(&handle), request, &options).await, Ok(None));
    }
    let full = PivotRequest::new(["category"], ["region"]).value("sales");
    assert_eq!(compile_pivot(None, &full, &options).await, Ok(None));
    assert_eq!(engine.opened(), 0);
}

#[tokio::test]
async fn test_no_column_fields_opens_and_closes() {
    let (engine, handle) = handle(RecordingEngine::new());
    let request = PivotRequest::new(["category"], Vec::<String>::new()).value("sales");

    let result = compile_pivot(Some(&handle), &request, &PivotOptions::default()).await;

    assert_eq!(result, Ok(None));
    assert_eq!(engine.opened(), 1);
    assert_eq!(engine.closed(), 1);
    assert!(engine.statements().is_empty());
}

#[tokio::test]
async fn test_unknown_field_is_reported() {
    let (engine, handle) = loaded(Loader::new(), sales_rows()).await;
    let request = PivotRequest::new(["category"], ["region"]).value("revenue");

    let err = compile_pivot(Some(&handle), &request, &PivotOptions::default())
        .await
        .unwrap_err();

    match err {
        PivotError::UnknownField { field, available } => {
            assert_eq!(field, "revenue");
            assert_eq!(available, vec!["category", "region", "sales"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(engine.opened(), engine.closed());
}

#[tokio::test]
async fn test_query_failure_still_closes_connection() {
    let (engine, handle) = handle(RecordingEngine::failing_when(|sql| {
        sql.starts_with("SELECT DISTINCT")
    }));
    Loader::new().load(&handle, &sales_rows()).await.unwrap();
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let err = compile_pivot(Some(&handle), &request, &PivotOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PivotError::Query(_)));
    assert_eq!(engine.opened(), 2);
    assert_eq!(engine.closed(), 2);
}

#[tokio::test]
async fn test_connection_failure() {
    let (_, handle) = handle(UnreachableEngine);
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let err = compile_pivot(Some(&handle), &request, &PivotOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::Connection(_)));
}

#[tokio::test]
async fn test_plan_exposes_sql_without_running_it() {
    let (engine, handle) = loaded(Loader::new(), sales_rows()).await;
    let request = PivotRequest::new(["category"], ["region"]).value("sales");

    let plan = plan_pivot(Some(&handle), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(plan.groups.len(), 2);
    let sql = plan.to_sql();
    assert!(sql.contains("AS \"region_north\""));
    assert!(sql.contains("GROUP BY \"category\""));
    assert!(!engine.statements().iter().any(|s| s.contains("ROUND(")));
}

#[tokio::test]
async fn test_row_field_and_label_with_same_key_both_survive() {
    let data = rows(json!([
        {"a b": "x", "a": "b", "v": 1},
        {"a b": "y", "a": "b", "v": 2},
    ]));
    let (_, engine) = loaded(Loader::new(), data).await;
    let request = PivotRequest::new(["a b"], ["a"]).value("v");

    let pivot = compile_pivot(Some(&engine), &request, &PivotOptions::default())
        .await
        .unwrap()
        .unwrap();

    let keys: Vec<_> = pivot.columns.iter().map(|c| c.accessor_key.as_str()).collect();
    assert_eq!(keys, vec!["a_b", "a_b_2"]);
    let headers: Vec<_> = pivot.columns.iter().map(|c| c.header.as_str()).collect();
    assert_eq!(headers, vec!["a b", "a_b"]);

    let x = pivot.find_row("a_b", &json!("x")).unwrap();
    assert_eq!(number(x.get("a_b_2")), Some(1.0));
    let y = pivot.find_row("a_b", &json!("y")).unwrap();
    assert_eq!(number(y.get("a_b_2")), Some(2.0));
}
