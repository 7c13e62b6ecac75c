//! Custom error types for the climate data pipeline.
//!
//! All pipeline steps report typed failures to their immediate caller via
//! [`PipelineError`]; nothing is silently swallowed. Errors are serializable
//! as `{code, message}` pairs so a presentation layer can decide how to
//! render fallbacks.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file does not exist.
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    /// Source file exists but could not be parsed.
    #[error("Failed to parse source '{path}': {reason}")]
    SourceFormat { path: String, reason: String },

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Column has the wrong kind for the requested operation.
    #[error("Column '{column}' is {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        actual: &'static str,
        expected: &'static str,
    },

    /// Log transform requested on a column with no positive values.
    #[error("Column '{0}' contains no positive values")]
    NoPositiveValues(String),

    /// Fewer than two points were available to fit a trend.
    #[error("Trend fit needs at least 2 points, got {0}")]
    InsufficientData(usize),

    /// All x values are equal; the trend slope is undefined.
    #[error("Zero variance in x values, trend slope is undefined")]
    DegenerateInput,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for consumers that dispatch on error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::SourceFormat { .. } => "SOURCE_FORMAT",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::NoPositiveValues(_) => "NO_POSITIVE_VALUES",
            Self::InsufficientData(_) => "INSUFFICIENT_DATA",
            Self::DegenerateInput => "DEGENERATE_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is recoverable at the per-group level.
    ///
    /// Trend fitting over a group with too few points or zero x-variance is
    /// expected on real data; callers skip the group and continue instead of
    /// failing the whole derivation.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientData(_) | Self::DegenerateInput => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}
