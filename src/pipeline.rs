//! End-to-end orchestration: load, clean, transform, cache, derive.
//!
//! [`ClimatePipeline`] ties the per-step modules together and owns the
//! processed-table cache. Consumers ask it for a dataset and get back the
//! fully processed table; derivations (aggregation, trends) run on top of
//! those cached tables.

use crate::aggregate::aggregate;
use crate::cache::TableCache;
use crate::catalog::Dataset;
use crate::cleaner::Cleaner;
use crate::config::PipelineConfig;
use crate::encode::one_hot_encode;
use crate::error::{Result, ResultExt};
use crate::loader::load_csv;
use crate::outliers::OutlierDetector;
use crate::transform::log_transform;
use crate::trend::trend_by;
use crate::types::{AggOp, Table, TrendRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// The full climate data processing pipeline.
///
/// Processing a dataset runs, in order:
/// 1. CSV load with header normalization and type inference
/// 2. cleaning (duplicate and sparse-row removal)
/// 3. outlier flagging on the dataset's measure column
/// 4. log skew correction on the same column
/// 5. drop-first one-hot encoding of text columns, where the catalog
///    enables it
///
/// Processed tables are cached; repeat requests return the same [`Arc`]
/// until the entry is invalidated.
#[derive(Debug)]
pub struct ClimatePipeline {
    config: PipelineConfig,
    cleaner: Cleaner,
    detector: OutlierDetector,
    cache: TableCache,
}

impl ClimatePipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<ClimatePipeline> {
        config.validate()?;
        Ok(ClimatePipeline {
            cleaner: Cleaner::new(&config),
            detector: OutlierDetector::new(&config),
            cache: TableCache::new(),
            config,
        })
    }

    /// Pipeline with default configuration.
    pub fn with_defaults() -> Result<ClimatePipeline> {
        ClimatePipeline::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch a dataset's fully processed table, loading it on first access.
    pub fn table(&self, dataset: Dataset) -> Result<Arc<Table>> {
        if let Some(table) = self.cache.get(dataset) {
            return Ok(table);
        }

        let table = self
            .process(dataset)
            .context(format!("Processing dataset '{}'", dataset))?;
        Ok(self.cache.insert(dataset, table))
    }

    fn process(&self, dataset: Dataset) -> Result<Table> {
        let path = self.config.data_dir.join(dataset.file_name());
        let raw = load_csv(&path, &self.config)?;
        let cleaned = self.cleaner.clean(&raw)?;

        let measure = dataset.measure_column();
        let flagged = self.detector.flag_outliers(&cleaned, measure)?;
        let transformed = log_transform(&flagged, measure)?;

        let table = if dataset.encode_categoricals() {
            one_hot_encode(&transformed)?
        } else {
            transformed
        };

        info!(
            "Processed dataset '{}': {} rows x {} columns",
            dataset,
            table.height(),
            table.width()
        );

        Ok(table)
    }

    /// Process every catalog dataset, isolating failures per dataset.
    ///
    /// A dataset that fails (missing file, malformed content) is reported in
    /// its map slot and does not stop the others from loading.
    pub fn load_all(&self) -> BTreeMap<Dataset, Result<Arc<Table>>> {
        Dataset::all()
            .into_iter()
            .map(|dataset| {
                let result = self.table(dataset);
                if let Err(e) = &result {
                    error!("Failed to process dataset '{}': {}", dataset, e);
                }
                (dataset, result)
            })
            .collect()
    }

    /// Group a dataset's table and summarize measures; see [`aggregate`].
    pub fn aggregate_by(
        &self,
        dataset: Dataset,
        group_keys: &[&str],
        measures: &[&str],
        ops: &[AggOp],
    ) -> Result<Table> {
        let table = self.table(dataset)?;
        aggregate(&table, group_keys, measures, ops)
    }

    /// Per-group linear trends over a dataset's table; see [`trend_by`].
    pub fn trend_by(
        &self,
        dataset: Dataset,
        group_col: &str,
        x_col: &str,
        y_col: &str,
    ) -> Result<Vec<TrendRecord>> {
        let table = self.table(dataset)?;
        trend_by(&table, group_col, x_col, y_col)
    }

    /// Drop one dataset from the cache so the next access reloads it.
    pub fn invalidate(&self, dataset: Dataset) {
        self.cache.invalidate(dataset);
    }

    /// Drop every cached table.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
