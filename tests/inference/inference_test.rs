#[path = "../common/mod.rs"]
mod common;

use common::rows;
use pivotal::dataset::{Dataset, Record};
use pivotal::inference::{SamplingStrategy, TypeSampler};
use pivotal::schema::ColumnType;
use serde_json::{json, Value};

fn column_of(values: Vec<Value>) -> Vec<Record> {
    rows(Value::Array(
        values.into_iter().map(|v| json!({ "c": v })).collect(),
    ))
}

#[test]
fn test_all_native_numbers_are_numeric() {
    let data = column_of((0..100).map(|i| json!(i as f64 * 1.5)).collect());
    assert_eq!(
        TypeSampler::striped().infer_column(&data, "c"),
        ColumnType::Numeric
    );
}

#[test]
fn test_threshold_is_inclusive() {
    // 6 numeric of 10 valid: exactly 0.6.
    let mut values: Vec<Value> = (0..6).map(|i| json!(format!("${},000", i))).collect();
    values.extend((0..4).map(|i| json!(format!("label {}", i))));
    assert_eq!(
        TypeSampler::striped().infer_column(&column_of(values), "c"),
        ColumnType::Numeric
    );
}

#[test]
fn test_just_below_threshold_is_text() {
    // 5 numeric of 9 valid.
    let mut values: Vec<Value> = (0..5).map(|i| json!(i)).collect();
    values.extend((0..4).map(|i| json!(format!("label {}", i))));
    assert_eq!(
        TypeSampler::striped().infer_column(&column_of(values), "c"),
        ColumnType::Text
    );
}

#[test]
fn test_blanks_do_not_dilute() {
    let values = vec![
        json!(null),
        json!(""),
        json!("   "),
        json!("1,200"),
        json!("€ 3.50"),
        json!("-2e3"),
    ];
    assert_eq!(
        TypeSampler::striped().infer_column(&column_of(values), "c"),
        ColumnType::Numeric
    );
}

#[test]
fn test_zero_valid_samples_is_text() {
    let values = vec![json!(null), json!(""), json!(null)];
    assert_eq!(
        TypeSampler::striped().infer_column(&column_of(values), "c"),
        ColumnType::Text
    );
}

#[test]
fn test_missing_keys_count_as_null() {
    let data = rows(json!([
        {"id": 1, "amount": "10"},
        {"id": 2},
        {"id": 3, "amount": "x"},
        {"id": 4, "amount": "12"},
    ]));
    let schema = TypeSampler::striped().infer_schema(&Dataset::from_records(&data));
    assert_eq!(schema.get("id").unwrap().inferred_type, ColumnType::Numeric);
    assert_eq!(
        schema.get("amount").unwrap().inferred_type,
        ColumnType::Numeric
    );
}

#[test]
fn test_schema_follows_first_record_keys() {
    let data = rows(json!([
        {"region": "North", "sales": 1},
        {"region": "South", "sales": 2, "extra": "ignored"},
    ]));
    let schema = TypeSampler::striped().infer_schema(&Dataset::from_records(&data));
    assert_eq!(
        schema.column_names().collect::<Vec<_>>(),
        vec!["region", "sales"]
    );
    assert_eq!(schema.get("region").unwrap().inferred_type, ColumnType::Text);
}

#[test]
fn test_striped_sample_is_bounded_and_spread() {
    let sampler = TypeSampler::striped();
    let indices = sampler.sample_indices(10_000);
    assert_eq!(indices.len(), 30);
    assert_eq!(indices[0], 0);
    assert!(*indices.last().unwrap() >= 9_000);
    assert_eq!(indices, sampler.sample_indices(10_000));
}

#[test]
fn test_striped_sampling_sees_late_rows() {
    // Text first, numbers after: a prefix sample would call this Text.
    let mut values: Vec<Value> = (0..300).map(|i| json!(format!("n{}", i))).collect();
    values.extend((0..700).map(|i| json!(i)));
    assert_eq!(
        TypeSampler::striped().infer_column(&column_of(values), "c"),
        ColumnType::Numeric
    );
}

#[test]
fn test_random_strategy_threshold() {
    // 7 of 10 numeric passes 0.6 but not 0.8.
    let mut values: Vec<Value> = (0..7).map(|i| json!(i)).collect();
    values.extend((0..3).map(|i| json!(format!("t{}", i))));
    let data = column_of(values);

    assert_eq!(
        TypeSampler::striped().infer_column(&data, "c"),
        ColumnType::Numeric
    );
    let random = TypeSampler::random(Some(99));
    assert_eq!(random.strategy(), SamplingStrategy::Random);
    assert_eq!(random.infer_column(&data, "c"), ColumnType::Text);
}

#[test]
fn test_custom_sampler_settings() {
    let sampler = TypeSampler::striped()
        .with_max_samples(5)
        .with_threshold(1.0);
    assert_eq!(sampler.sample_indices(100), vec![0, 20, 40, 60, 80]);

    let values = vec![json!(1), json!(2), json!("three")];
    assert_eq!(
        sampler.infer_column(&column_of(values), "c"),
        ColumnType::Text
    );
}
