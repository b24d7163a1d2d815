//! Pivot request and compile options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PivotError;
use crate::config::Settings;

/// Aggregate applied to the value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunc {
    #[default]
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunc {
    /// SQL function name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Count => "COUNT",
        }
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for AggregateFunc {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUM" => Ok(AggregateFunc::Sum),
            "AVG" | "AVERAGE" | "MEAN" => Ok(AggregateFunc::Avg),
            "MIN" => Ok(AggregateFunc::Min),
            "MAX" => Ok(AggregateFunc::Max),
            "COUNT" => Ok(AggregateFunc::Count),
            _ => Err(PivotError::UnknownAggregate(s.to_string())),
        }
    }
}

/// What to pivot: row grouping, column projection and the aggregated value.
///
/// Field names may use either the dotted (`user.region`) or underscored
/// (`user_region`) spelling of a stored column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PivotRequest {
    pub row_fields: Vec<String>,
    pub column_fields: Vec<String>,
    pub value_field: Option<String>,
    #[serde(alias = "aggregateFunc")]
    pub aggregate: AggregateFunc,
}

impl PivotRequest {
    pub fn new<R, C>(row_fields: R, column_fields: C) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            row_fields: row_fields.into_iter().map(Into::into).collect(),
            column_fields: column_fields.into_iter().map(Into::into).collect(),
            value_field: None,
            aggregate: AggregateFunc::default(),
        }
    }

    pub fn value(mut self, field: impl Into<String>) -> Self {
        self.value_field = Some(field.into());
        self
    }

    pub fn aggregate(mut self, aggregate: AggregateFunc) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// The value field, unless it is missing or blank.
    pub fn value_field(&self) -> Option<&str> {
        self.value_field
            .as_deref()
            .filter(|v| !v.trim().is_empty())
    }
}

/// Where and how a pivot runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotOptions {
    /// Working table populated by the loader.
    pub table: String,
    /// Decimal places for non-count aggregates.
    pub round_digits: u32,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            table: "pivot_data".to_string(),
            round_digits: 2,
        }
    }
}

impl PivotOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            table: settings.loader.table_name.clone(),
            round_digits: settings.pivot.round_digits,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}
