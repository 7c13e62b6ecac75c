//! Configuration types for the climate data pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the climate data pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use climate_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_dir("dataset")
///     .row_completeness_threshold(0.7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fraction of fields a row must have populated to survive cleaning
    /// (0.0 - 1.0). A row is kept when its non-missing field count is at
    /// least `ceil(threshold * column_count)`.
    /// Default: 0.7 (rows missing more than 30% of fields are dropped)
    pub row_completeness_threshold: f64,

    /// Multiplier applied to the IQR when computing outlier fences.
    /// Default: 1.5 (the conventional Tukey fence)
    pub iqr_fence_multiplier: f64,

    /// Number of rows the CSV reader inspects to infer column types.
    /// Default: 100
    pub infer_schema_length: usize,

    /// Directory holding the source data files.
    /// Default: "dataset"
    pub data_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            row_completeness_threshold: 0.7,
            iqr_fence_multiplier: 1.5,
            infer_schema_length: 100,
            data_dir: PathBuf::from("dataset"),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.row_completeness_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "row_completeness_threshold".to_string(),
                value: self.row_completeness_threshold,
            });
        }

        if self.iqr_fence_multiplier <= 0.0 || !self.iqr_fence_multiplier.is_finite() {
            return Err(ConfigValidationError::InvalidFenceMultiplier(
                self.iqr_fence_multiplier,
            ));
        }

        if self.infer_schema_length == 0 {
            return Err(ConfigValidationError::InvalidInferSchemaLength(
                self.infer_schema_length,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid IQR fence multiplier: {0} (must be a positive finite number)")]
    InvalidFenceMultiplier(f64),

    #[error("Invalid schema inference length: {0} (must be at least 1)")]
    InvalidInferSchemaLength(usize),
}

impl From<ConfigValidationError> for crate::error::PipelineError {
    fn from(e: ConfigValidationError) -> Self {
        crate::error::PipelineError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    row_completeness_threshold: Option<f64>,
    iqr_fence_multiplier: Option<f64>,
    infer_schema_length: Option<usize>,
    data_dir: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Set the fraction of fields a row must have populated to be kept.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.7 = 70%)
    pub fn row_completeness_threshold(mut self, threshold: f64) -> Self {
        self.row_completeness_threshold = Some(threshold);
        self
    }

    /// Set the IQR multiplier used for outlier fences.
    pub fn iqr_fence_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_fence_multiplier = Some(multiplier);
        self
    }

    /// Set the number of rows used for CSV schema inference.
    pub fn infer_schema_length(mut self, length: usize) -> Self {
        self.infer_schema_length = Some(length);
        self
    }

    /// Set the directory holding the source data files.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            row_completeness_threshold: self.row_completeness_threshold.unwrap_or(0.7),
            iqr_fence_multiplier: self.iqr_fence_multiplier.unwrap_or(1.5),
            infer_schema_length: self.infer_schema_length.unwrap_or(100),
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from("dataset")),
        };

        config.validate()?;
        Ok(config)
    }
}
