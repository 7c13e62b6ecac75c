//! IQR-based outlier flagging.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::stats::ColumnStats;
use crate::types::{ColumnKind, ColumnSchema, Table};
use polars::prelude::*;
use tracing::debug;

/// Name of the boolean column appended by [`OutlierDetector::flag_outliers`].
pub const OUTLIER_COLUMN: &str = "outlier";

/// Flags values lying outside the IQR-derived fences of a column.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    fence_multiplier: f64,
}

impl OutlierDetector {
    pub fn new(config: &PipelineConfig) -> OutlierDetector {
        OutlierDetector {
            fence_multiplier: config.iqr_fence_multiplier,
        }
    }

    /// Return a copy of the table with a boolean `outlier` column.
    ///
    /// A row is flagged `true` iff its value in `column` is strictly below
    /// `Q1 - k*IQR` or strictly above `Q3 + k*IQR` (type-7 quantiles over
    /// the non-missing values). Values exactly on a fence are not flagged;
    /// missing values are never flagged.
    pub fn flag_outliers(&self, table: &Table, column: &str) -> Result<Table> {
        let series = table.numeric_series(column)?;

        let flags = match ColumnStats::compute(&series)? {
            Some(stats) => {
                let lower = stats.q1 - self.fence_multiplier * stats.iqr;
                let upper = stats.q3 + self.fence_multiplier * stats.iqr;

                let flags: Vec<bool> = series
                    .f64()?
                    .into_iter()
                    .map(|opt| opt.is_some_and(|v| v < lower || v > upper))
                    .collect();

                debug!(
                    "Column '{}': fences [{:.4}, {:.4}], {} of {} rows flagged",
                    column,
                    lower,
                    upper,
                    flags.iter().filter(|f| **f).count(),
                    flags.len()
                );

                flags
            }
            // No usable values, nothing can be an outlier.
            None => vec![false; table.height()],
        };

        let mut df = table.frame().clone();
        df.with_column(Series::new(OUTLIER_COLUMN.into(), flags))?;

        let mut schema = table.schema().to_vec();
        schema.retain(|c| c.name != OUTLIER_COLUMN);
        schema.push(ColumnSchema {
            name: OUTLIER_COLUMN.to_string(),
            kind: ColumnKind::Boolean,
        });

        // `with_column` replaces an existing column in place, so rebuild the
        // frame with the flag column last to keep schema and frame aligned.
        let reordered: Vec<String> = schema.iter().map(|c| c.name.clone()).collect();
        let df = df.select(reordered)?;

        Ok(Table::with_schema(df, schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OutlierDetector {
        OutlierDetector {
            fence_multiplier: 1.5,
        }
    }

    fn flags_of(table: &Table) -> Vec<bool> {
        let col = table.frame().column(OUTLIER_COLUMN).unwrap();
        col.as_materialized_series()
            .bool()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_flags_value_beyond_fence() {
        // [1..9, 100]: q1 = 3.25, q3 = 7.75, iqr = 4.5,
        // fences [-3.5, 14.5] -> only 100 is flagged.
        let df = df![
            "value" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        let flags = flags_of(&flagged);
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(flags[9]);
    }

    #[test]
    fn test_boundary_value_not_flagged() {
        // [0 x4, 10 x4, 25]: q1 = 0, q3 = 10, iqr = 10, upper fence = 25.
        // 25 sits exactly on the fence and must not be flagged.
        let df = df![
            "value" => [0.0f64, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 25.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        assert!(flags_of(&flagged).iter().all(|f| !f));

        // Nudging past the fence flips the flag.
        let df = df![
            "value" => [0.0f64, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 25.1],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        assert!(flags_of(&flagged)[8]);
    }

    #[test]
    fn test_missing_values_never_flagged() {
        let df = df![
            "value" => [Some(1.0f64), None, Some(2.0), Some(3.0), Some(1000.0)],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        let flags = flags_of(&flagged);
        assert!(!flags[1]);
        assert!(flags[4]);
    }

    #[test]
    fn test_missing_column() {
        let df = df!["value" => [1.0f64]].unwrap();
        let table = Table::from_frame(df);

        let err = detector().flag_outliers(&table, "nope").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_non_numeric_column() {
        let df = df!["region" => ["north", "south"]].unwrap();
        let table = Table::from_frame(df);

        let err = detector().flag_outliers(&table, "region").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_iqr_zero_flags_nothing_among_equal_values() {
        let df = df!["value" => [5.0f64, 5.0, 5.0, 5.0, 5.0]].unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        assert!(flags_of(&flagged).iter().all(|f| !f));
    }

    #[test]
    fn test_outlier_column_appended_with_boolean_kind() {
        let df = df!["value" => [1.0f64, 2.0]].unwrap();
        let table = Table::from_frame(df);

        let flagged = detector().flag_outliers(&table, "value").unwrap();
        assert_eq!(flagged.kind_of(OUTLIER_COLUMN), Some(ColumnKind::Boolean));
        assert_eq!(flagged.width(), 2);
        assert_eq!(flagged.height(), table.height());
    }
}
