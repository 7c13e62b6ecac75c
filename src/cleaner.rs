//! Row-level cleaning: duplicate removal and sparse-row removal.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::Table;
use polars::prelude::*;
use tracing::debug;

/// Removes exact-duplicate rows and rows with excessive missing fields.
///
/// Both steps are deterministic and preserve the order of surviving rows,
/// so cleaning is idempotent: `clean(clean(t)) == clean(t)`.
#[derive(Debug, Clone)]
pub struct Cleaner {
    /// Fraction of fields a row must have populated to be kept.
    row_completeness_threshold: f64,
}

impl Cleaner {
    pub fn new(config: &PipelineConfig) -> Cleaner {
        Cleaner {
            row_completeness_threshold: config.row_completeness_threshold,
        }
    }

    /// Produce a cleaned copy of the table.
    ///
    /// 1. Exact-duplicate rows (equal across all columns) are removed; the
    ///    first occurrence wins.
    /// 2. Rows with fewer than `ceil(threshold * column_count)` non-missing
    ///    fields are removed.
    pub fn clean(&self, table: &Table) -> Result<Table> {
        // Zero-width or empty frames have nothing to deduplicate, and
        // group_by-backed dedup rejects them.
        if table.width() == 0 || table.height() == 0 {
            return Ok(table.clone());
        }

        let before = table.height();

        let deduped = table
            .frame()
            .unique_stable(None, UniqueKeepStrategy::First, None)?;
        let duplicates_removed = before - deduped.height();

        let filtered = self.drop_sparse_rows(deduped)?;
        let sparse_removed = before - duplicates_removed - filtered.height();

        debug!(
            "Cleaning removed {} duplicate rows and {} sparse rows ({} -> {})",
            duplicates_removed,
            sparse_removed,
            before,
            filtered.height()
        );

        Ok(Table::with_schema(filtered, table.schema().to_vec()))
    }

    fn drop_sparse_rows(&self, df: DataFrame) -> Result<DataFrame> {
        let width = df.width();
        if width == 0 || df.height() == 0 {
            return Ok(df);
        }

        let required = (self.row_completeness_threshold * width as f64).ceil() as usize;

        let mut non_null_counts = vec![0usize; df.height()];
        for col in df.get_columns() {
            let null_mask = col.as_materialized_series().is_null();
            for (i, is_null) in null_mask.into_iter().enumerate() {
                if !is_null.unwrap_or(true) {
                    non_null_counts[i] += 1;
                }
            }
        }

        let keep: Vec<bool> = non_null_counts.iter().map(|&c| c >= required).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Ok(df.filter(&mask)?)
    }
}
