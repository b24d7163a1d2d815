//! Sampling-based column type inference.
//!
//! A bounded sample of each column is classified; the column is Numeric when
//! the share of numeric values among non-blank samples reaches a threshold.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::InferenceSettings;
use crate::dataset::{Dataset, Record};
use crate::schema::{ColumnType, ColumnTypeInfo, TableSchema};
use crate::value::{is_blank, is_numeric_value};

/// Row selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// Evenly spaced rows across the dataset; reproducible.
    #[default]
    Striped,
    /// Uniform sample without replacement. A seed makes it reproducible.
    Random,
}

impl SamplingStrategy {
    pub fn default_max_samples(&self) -> usize {
        match self {
            SamplingStrategy::Striped => 30,
            SamplingStrategy::Random => 10,
        }
    }

    pub fn default_threshold(&self) -> f64 {
        match self {
            SamplingStrategy::Striped => 0.6,
            SamplingStrategy::Random => 0.8,
        }
    }
}

/// Classifies columns as [`ColumnType::Numeric`] or [`ColumnType::Text`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSampler {
    strategy: SamplingStrategy,
    max_samples: usize,
    threshold: f64,
    seed: Option<u64>,
}

impl Default for TypeSampler {
    fn default() -> Self {
        Self::striped()
    }
}

impl TypeSampler {
    /// Striped sampling: 30 rows, 0.6 threshold.
    pub fn striped() -> Self {
        Self::with_strategy(SamplingStrategy::Striped)
    }

    /// Random sampling: 10 rows, 0.8 threshold.
    pub fn random(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::with_strategy(SamplingStrategy::Random)
        }
    }

    fn with_strategy(strategy: SamplingStrategy) -> Self {
        Self {
            strategy,
            max_samples: strategy.default_max_samples(),
            threshold: strategy.default_threshold(),
            seed: None,
        }
    }

    pub fn from_settings(settings: &InferenceSettings) -> Self {
        let base = Self::with_strategy(settings.strategy);
        Self {
            max_samples: settings.max_samples.unwrap_or(base.max_samples).max(1),
            threshold: settings.numeric_threshold.unwrap_or(base.threshold),
            seed: settings.seed,
            ..base
        }
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Row indices to inspect for a dataset of `n` rows.
    pub fn sample_indices(&self, n: usize) -> Vec<usize> {
        if n <= self.max_samples {
            return (0..n).collect();
        }
        match self.strategy {
            SamplingStrategy::Striped => (0..self.max_samples)
                .map(|i| i * n / self.max_samples)
                .collect(),
            SamplingStrategy::Random => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                let mut picked = rand::seq::index::sample(&mut rng, n, self.max_samples).into_vec();
                picked.sort_unstable();
                picked
            }
        }
    }

    /// Infer the type of column `column` (by index) of `dataset`.
    pub fn infer_type(&self, dataset: &Dataset, column: usize) -> ColumnType {
        let (valid, numeric) = self
            .sample_indices(dataset.len())
            .into_iter()
            .map(|row| dataset.value(row, column))
            .filter(|v| !is_blank(v))
            .fold((0usize, 0usize), |(valid, numeric), v| {
                (valid + 1, numeric + usize::from(is_numeric_value(v)))
            });

        let inferred = classify(valid, numeric, self.threshold);
        trace!(column, valid, numeric, ?inferred, "inferred column type");
        inferred
    }

    /// Infer the type of the column named `name` across `records`.
    ///
    /// A column absent from the first record has no valid samples and is
    /// Text.
    pub fn infer_column(&self, records: &[Record], name: &str) -> ColumnType {
        let dataset = Dataset::from_records(records);
        match dataset.column_index(name) {
            Some(idx) => self.infer_type(&dataset, idx),
            None => ColumnType::Text,
        }
    }

    /// Infer every column of `dataset`, in column order.
    pub fn infer_schema(&self, dataset: &Dataset) -> TableSchema {
        TableSchema::new(
            dataset
                .columns()
                .iter()
                .enumerate()
                .map(|(idx, name)| ColumnTypeInfo::new(name.clone(), self.infer_type(dataset, idx)))
                .collect(),
        )
    }
}

fn classify(valid: usize, numeric: usize, threshold: f64) -> ColumnType {
    if valid == 0 {
        return ColumnType::Text;
    }
    if numeric as f64 / valid as f64 >= threshold {
        ColumnType::Numeric
    } else {
        ColumnType::Text
    }
}
