//! Cohort grouping output and trace construction.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::dataset::{Dataset, Record};

/// One cohort: its name and its rows in column-oriented form.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub name: String,
    /// Column name to the array of that column's values, in row order.
    pub columns: Map<String, Value>,
}

impl Cohort {
    /// Number of rows in the cohort.
    pub fn len(&self) -> usize {
        self.columns
            .values()
            .next()
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a cohort grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum CohortResult {
    /// No grouping applied; the raw rows unchanged.
    Ungrouped(Vec<Record>),
    /// One entry per distinct non-null cohort value, in query order.
    Grouped(Vec<Cohort>),
}

impl CohortResult {
    pub fn is_grouped(&self) -> bool {
        matches!(self, CohortResult::Grouped(_))
    }

    pub fn cohort_names(&self) -> Vec<&str> {
        match self {
            CohortResult::Ungrouped(_) => Vec::new(),
            CohortResult::Grouped(cohorts) => cohorts.iter().map(|c| c.name.as_str()).collect(),
        }
    }

    /// JSON form: `{"values": rows}` when ungrouped, otherwise an array of
    /// `{"name": ..., <column>: [...]}` objects.
    pub fn to_json(&self) -> Value {
        match self {
            CohortResult::Ungrouped(rows) => {
                let mut map = Map::new();
                map.insert(
                    "values".into(),
                    Value::Array(rows.iter().cloned().map(Value::Object).collect()),
                );
                Value::Object(map)
            }
            CohortResult::Grouped(cohorts) => Value::Array(
                cohorts
                    .iter()
                    .map(|c| {
                        let mut map = Map::new();
                        map.insert("name".into(), Value::String(c.name.clone()));
                        map.extend(c.columns.clone());
                        Value::Object(map)
                    })
                    .collect(),
            ),
        }
    }

    /// One renderable trace per cohort.
    ///
    /// Each trace is a copy of `trace_config` with the cohort's column
    /// arrays merged in at top level and `name` set to the cohort name.
    /// Ungrouped rows yield a single unnamed trace. `trace_config` itself is
    /// never modified.
    pub fn into_traces(self, trace_config: &Value) -> Vec<Value> {
        let base = match trace_config {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        match self {
            CohortResult::Ungrouped(rows) => {
                let mut trace = base;
                trace.extend(transpose(&rows));
                vec![Value::Object(trace)]
            }
            CohortResult::Grouped(cohorts) => cohorts
                .into_iter()
                .map(|cohort| {
                    let mut trace = base.clone();
                    trace.extend(cohort.columns);
                    trace.insert("name".into(), Value::String(cohort.name));
                    Value::Object(trace)
                })
                .collect(),
        }
    }
}

impl Serialize for CohortResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Row-oriented records to column arrays, in the first record's key order.
pub fn transpose(rows: &[Record]) -> Map<String, Value> {
    let dataset = Dataset::from_records(rows);
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values = dataset.rows().iter().map(|r| r[idx].clone()).collect();
            (name.clone(), Value::Array(values))
        })
        .collect()
}
