//! Core data model: typed tables and derived records.
//!
//! A [`Table`] wraps a polars `DataFrame` together with an explicit
//! per-column [`ColumnKind`] tag decided once at load time and carried
//! through every transform. Missing values are polars nulls; they are never
//! coerced into sentinel values. Transforms consume a table by reference and
//! return a new one, so a cached table is never mutated.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The nominal kind of a column, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Free text or categorical labels
    Text,
    /// Date or datetime values
    Date,
    /// Boolean values
    Boolean,
}

impl ColumnKind {
    /// Derive the kind from a polars dtype.
    ///
    /// Anything that is not numeric, temporal, or boolean is treated as
    /// text; the CSV reader only produces those four families.
    pub fn from_dtype(dtype: &DataType) -> ColumnKind {
        if is_numeric_dtype(dtype) {
            ColumnKind::Numeric
        } else if is_datetime_dtype(dtype) {
            ColumnKind::Date
        } else if matches!(dtype, DataType::Boolean) {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
            ColumnKind::Boolean => "boolean",
        }
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Name and kind of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

/// An immutable tabular dataset with a typed schema.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
    schema: Vec<ColumnSchema>,
}

impl Table {
    /// Wrap a DataFrame, deriving the column kinds from the dtypes.
    pub fn from_frame(df: DataFrame) -> Table {
        let schema = df
            .get_columns()
            .iter()
            .map(|col| ColumnSchema {
                name: col.name().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
            })
            .collect();
        Table { df, schema }
    }

    /// Construct from a frame and an already-known schema.
    ///
    /// The schema must describe exactly the frame's columns, in order;
    /// transforms use this to carry load-time kinds forward instead of
    /// re-deriving them.
    pub(crate) fn with_schema(df: DataFrame, schema: Vec<ColumnSchema>) -> Table {
        debug_assert_eq!(df.width(), schema.len());
        Table { df, schema }
    }

    /// The underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// The typed column schema, in column order.
    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.iter().any(|c| c.name == name)
    }

    /// Kind of a column, if present.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.schema.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Look up a column or fail with `ColumnNotFound`.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.df
            .column(name)
            .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
    }

    /// Fetch a column as a Float64 series, enforcing the numeric kind tag.
    pub fn numeric_series(&self, name: &str) -> Result<Series> {
        let kind = self
            .kind_of(name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))?;
        if kind != ColumnKind::Numeric {
            return Err(PipelineError::TypeMismatch {
                column: name.to_string(),
                actual: kind.name(),
                expected: ColumnKind::Numeric.name(),
            });
        }
        let series = self.column(name)?.as_materialized_series().clone();
        Ok(series.cast(&DataType::Float64)?)
    }
}

/// One fitted trend: the slope of a measure over time for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRecord {
    /// Group label, e.g. a calendar month or a region name.
    pub group: String,
    /// Estimated OLS slope of y on x.
    pub slope: f64,
    /// Number of (x, y) points the slope was fitted on. Always >= 2.
    pub points: usize,
}

/// Summary statistic applied to a measure within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggOp {
    Mean,
    Sum,
    /// Sample standard deviation (n - 1 divisor).
    Std,
    Min,
    Max,
}

impl AggOp {
    pub fn name(&self) -> &'static str {
        match self {
            AggOp::Mean => "mean",
            AggOp::Sum => "sum",
            AggOp::Std => "std",
            AggOp::Min => "min",
            AggOp::Max => "max",
        }
    }

    /// All supported reducers, in output column order.
    pub fn all() -> [AggOp; 5] {
        [AggOp::Mean, AggOp::Sum, AggOp::Std, AggOp::Min, AggOp::Max]
    }
}

impl std::str::FromStr for AggOp {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<AggOp> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(AggOp::Mean),
            "sum" => Ok(AggOp::Sum),
            "std" => Ok(AggOp::Std),
            "min" => Ok(AggOp::Min),
            "max" => Ok(AggOp::Max),
            other => Err(PipelineError::InvalidConfig(format!(
                "Unknown aggregation op '{other}' (expected mean, sum, std, min, or max)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind_from_dtype() {
        assert_eq!(ColumnKind::from_dtype(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Float64),
            ColumnKind::Numeric
        );
        assert_eq!(ColumnKind::from_dtype(&DataType::String), ColumnKind::Text);
        assert_eq!(ColumnKind::from_dtype(&DataType::Date), ColumnKind::Date);
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Boolean),
            ColumnKind::Boolean
        );
    }

    #[test]
    fn test_table_schema_derivation() {
        let df = df![
            "region" => ["north", "south"],
            "year" => [2000i64, 2001],
            "gmsl" => [1.5f64, 2.5],
        ]
        .unwrap();

        let table = Table::from_frame(df);
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 3);
        assert_eq!(table.kind_of("region"), Some(ColumnKind::Text));
        assert_eq!(table.kind_of("year"), Some(ColumnKind::Numeric));
        assert_eq!(table.kind_of("gmsl"), Some(ColumnKind::Numeric));
        assert_eq!(table.kind_of("missing"), None);
    }

    #[test]
    fn test_numeric_series_type_mismatch() {
        let df = df!["region" => ["north", "south"]].unwrap();
        let table = Table::from_frame(df);

        let err = table.numeric_series("region").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_numeric_series_missing_column() {
        let df = df!["gmsl" => [1.0f64]].unwrap();
        let table = Table::from_frame(df);

        let err = table.numeric_series("extent").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_agg_op_parse() {
        assert_eq!("mean".parse::<AggOp>().unwrap(), AggOp::Mean);
        assert_eq!(" STD ".parse::<AggOp>().unwrap(), AggOp::Std);
        assert!("median".parse::<AggOp>().is_err());
    }
}
