//! # climate-pipeline
//!
//! Data preparation library for a climate dashboard: loads flat CSV climate
//! datasets, cleans them, flags outliers, corrects skew, encodes
//! categoricals, and derives grouped summaries and per-group linear trends.
//!
//! ## Features
//!
//! - **CSV loading**: schema inference, date parsing, and snake_case header
//!   normalization
//! - **Cleaning**: exact-duplicate removal and sparse-row removal against a
//!   configurable completeness threshold
//! - **Outlier flagging**: Tukey fences over type-7 quantiles, appended as a
//!   boolean `outlier` column
//! - **Skew correction**: natural-log transform with safe zero handling
//! - **Categorical encoding**: deterministic drop-first one-hot encoding
//! - **Derivations**: group-by aggregation (mean/sum/std/min/max) and
//!   per-group OLS trend slopes
//! - **Caching**: processed tables are cached behind `Arc`s with explicit
//!   invalidation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use climate_pipeline::{AggOp, ClimatePipeline, Dataset, PipelineConfig};
//!
//! let config = PipelineConfig::builder().data_dir("dataset").build()?;
//! let pipeline = ClimatePipeline::new(config)?;
//!
//! let table = pipeline.table(Dataset::GreenhouseGas)?;
//! println!("{} rows x {} columns", table.height(), table.width());
//!
//! let by_year = pipeline.aggregate_by(
//!     Dataset::GreenhouseGas,
//!     &["year"],
//!     &["co2"],
//!     &[AggOp::Mean, AggOp::Sum],
//! )?;
//! ```

pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod cleaner;
pub mod config;
pub mod encode;
pub mod error;
pub mod loader;
pub mod outliers;
pub mod pipeline;
pub mod stats;
pub mod transform;
pub mod trend;
pub mod types;

pub use aggregate::aggregate;
pub use cache::TableCache;
pub use catalog::Dataset;
pub use cleaner::Cleaner;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use encode::one_hot_encode;
pub use error::{PipelineError, Result, ResultExt};
pub use loader::{load_csv, normalize_column_name};
pub use outliers::{OutlierDetector, OUTLIER_COLUMN};
pub use pipeline::ClimatePipeline;
pub use stats::ColumnStats;
pub use transform::log_transform;
pub use trend::{estimate_trend, trend_by};
pub use types::{AggOp, ColumnKind, ColumnSchema, Table, TrendRecord};
