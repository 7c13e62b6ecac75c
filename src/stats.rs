//! Per-column descriptive statistics.

use crate::error::Result;
use polars::prelude::*;

/// On-demand descriptors for one numeric column, computed over the
/// non-missing values only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    /// Count of non-missing (and non-NaN) values.
    pub non_null: usize,
}

impl ColumnStats {
    /// Compute stats for a numeric series. Returns `None` when the column
    /// holds no usable values. NaN values count as missing; they appear in
    /// log-transformed columns with negative inputs.
    pub fn compute(series: &Series) -> Result<Option<ColumnStats>> {
        let float_series = series.cast(&DataType::Float64)?;
        let mut values: Vec<f64> = float_series
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();

        if values.is_empty() {
            return Ok(None);
        }

        values.sort_by(f64::total_cmp);

        Ok(Some(ColumnStats {
            q1: quantile_type7(&values, 0.25),
            q3: quantile_type7(&values, 0.75),
            iqr: quantile_type7(&values, 0.75) - quantile_type7(&values, 0.25),
            min: values[0],
            max: values[values.len() - 1],
            non_null: values.len(),
        }))
    }
}

/// Type-7 quantile: linear interpolation between order statistics.
///
/// Input must be sorted ascending and non-empty. Matches the conventional
/// definition used by statistical packages, so fence computations are
/// reproducible.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Sample standard deviation (n - 1 divisor); 0.0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
