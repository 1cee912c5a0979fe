//! Feature Matrix - imputed model input
//!
//! Built from a `TelemetryTable` without touching it: the table stays as the
//! provider sent it, the matrix carries the filled-in numbers.

use ndarray::Array2;

use crate::logic::error::DetectionError;
use crate::logic::telemetry::TelemetryTable;

use super::layout::{FEATURE_COUNT, FEATURE_FALLBACK, FEATURE_LAYOUT};

/// Dense `rows x FEATURE_COUNT` matrix plus the values used for imputation
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    fill: [f64; FEATURE_COUNT],
    imputed_cells: usize,
}

impl FeatureMatrix {
    /// Select the feature columns and replace missing values with the column
    /// mean of this snapshot (or the layout fallback if the whole column is
    /// missing). Fails only when a feature column is absent from the schema.
    pub fn from_table(table: &TelemetryTable) -> Result<Self, DetectionError> {
        for &column in FEATURE_LAYOUT {
            if !table.has_column(column) {
                return Err(DetectionError::MissingColumn(column));
            }
        }

        let fill = column_means(table);
        let rows = table.len();
        let mut values = Array2::<f64>::zeros((rows, FEATURE_COUNT));
        let mut imputed_cells = 0;

        for (i, record) in table.records().iter().enumerate() {
            for (j, &column) in FEATURE_LAYOUT.iter().enumerate() {
                values[[i, j]] = match record.feature(column) {
                    Some(v) => v,
                    None => {
                        imputed_cells += 1;
                        fill[j]
                    }
                };
            }
        }

        Ok(Self { values, fill, imputed_cells })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    /// Value substituted for missing cells, per feature
    pub fn fill_values(&self) -> &[f64; FEATURE_COUNT] {
        &self.fill
    }

    pub fn imputed_cells(&self) -> usize {
        self.imputed_cells
    }
}

fn column_means(table: &TelemetryTable) -> [f64; FEATURE_COUNT] {
    let mut means = FEATURE_FALLBACK;

    for (j, &column) in FEATURE_LAYOUT.iter().enumerate() {
        // Running mean: a plain sum of values near f64::MAX overflows
        let (mean, count) = table
            .records()
            .iter()
            .filter_map(|r| r.feature(column))
            .fold((0.0_f64, 0usize), |(m, c), v| {
                let n = (c + 1) as f64;
                (m + (v / n - m / n), c + 1)
            });

        if count > 0 && mean.is_finite() {
            means[j] = mean;
        }
    }

    means
}
