//! Skew correction via a safe natural-log transform.

use crate::error::{PipelineError, Result};
use crate::types::Table;
use polars::prelude::*;
use tracing::debug;

/// Replace a numeric column with its natural logarithm.
///
/// Zeros are first replaced with `min(positive values) / 10` so `ln(0)` never
/// occurs; negative values propagate as NaN per the standard log domain —
/// accepted source behavior, not corrected here. Missing values stay missing.
///
/// Fails with [`PipelineError::NoPositiveValues`] when the column holds no
/// positive values, and with the usual column lookup/kind errors otherwise.
pub fn log_transform(table: &Table, column: &str) -> Result<Table> {
    let series = table.numeric_series(column)?;
    let chunked = series.f64()?;

    let min_positive = chunked
        .into_iter()
        .flatten()
        .filter(|v| *v > 0.0)
        .min_by(f64::total_cmp)
        .ok_or_else(|| PipelineError::NoPositiveValues(column.to_string()))?;

    let zero_replacement = min_positive / 10.0;

    let mut zeros_replaced = 0usize;
    let transformed: Vec<Option<f64>> = chunked
        .into_iter()
        .map(|opt| {
            opt.map(|v| {
                let v = if v == 0.0 {
                    zeros_replaced += 1;
                    zero_replacement
                } else {
                    v
                };
                v.ln()
            })
        })
        .collect();

    if zeros_replaced > 0 {
        debug!(
            "Column '{}': replaced {} zeros with {} before log transform",
            column, zeros_replaced, zero_replacement
        );
    }

    let mut df = table.frame().clone();
    df.replace(column, Series::new(column.into(), transformed))?;

    Ok(Table::with_schema(df, table.schema().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_of(table: &Table, column: &str) -> Vec<Option<f64>> {
        table
            .numeric_series(column)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_zero_replaced_with_tenth_of_min_positive() {
        let df = df!["value" => [0.0f64, 1.0, 10.0]].unwrap();
        let table = Table::from_frame(df);

        let out = log_transform(&table, "value").unwrap();
        let values = values_of(&out, "value");

        // Zero -> 0.1 -> ln(0.1); ln(1) = 0; ln(10).
        assert!((values[0].unwrap() - (-2.303)).abs() < 1e-3);
        assert!((values[1].unwrap() - 0.0).abs() < 1e-12);
        assert!((values[2].unwrap() - 2.303).abs() < 1e-3);
    }

    #[test]
    fn test_negative_values_become_nan() {
        let df = df!["value" => [-1.0f64, 1.0, 2.0]].unwrap();
        let table = Table::from_frame(df);

        let out = log_transform(&table, "value").unwrap();
        let values = values_of(&out, "value");
        assert!(values[0].unwrap().is_nan());
        assert_eq!(values[1].unwrap(), 0.0);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let df = df!["value" => [Some(1.0f64), None, Some(2.0)]].unwrap();
        let table = Table::from_frame(df);

        let out = log_transform(&table, "value").unwrap();
        assert!(values_of(&out, "value")[1].is_none());
    }

    #[test]
    fn test_no_positive_values() {
        let df = df!["value" => [0.0f64, -1.0, -5.0]].unwrap();
        let table = Table::from_frame(df);

        let err = log_transform(&table, "value").unwrap_err();
        assert_eq!(err.error_code(), "NO_POSITIVE_VALUES");
    }

    #[test]
    fn test_non_numeric_column() {
        let df = df!["region" => ["north"]].unwrap();
        let table = Table::from_frame(df);

        let err = log_transform(&table, "region").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_original_table_untouched() {
        let df = df!["value" => [1.0f64, 10.0]].unwrap();
        let table = Table::from_frame(df);

        let _ = log_transform(&table, "value").unwrap();
        assert_eq!(values_of(&table, "value"), vec![Some(1.0), Some(10.0)]);
    }
}
