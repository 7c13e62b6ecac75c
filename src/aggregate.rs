//! Group-by aggregation over cleaned tables.
//!
//! Charts consume one row per distinct group-key combination (e.g. region and
//! year) with summary statistics per measure. Grouping is explicit rather
//! than delegated so ordering is fully deterministic: the result is sorted
//! ascending by the group-key columns with standard per-type ordering, and a
//! group exists only if at least one source row maps to it.

use crate::error::{PipelineError, Result};
use crate::stats::sample_std;
use crate::types::{AggOp, ColumnKind, ColumnSchema, Table};
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// One group-key cell. Within a column every non-null cell has the same
/// variant; `Null` groups rows whose key value is missing.
#[derive(Debug, Clone, PartialEq)]
enum KeyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Eq for KeyValue {}

impl KeyValue {
    fn rank(&self) -> u8 {
        match self {
            KeyValue::Null => 0,
            KeyValue::Bool(_) => 1,
            KeyValue::Int(_) => 2,
            KeyValue::Float(_) => 3,
            KeyValue::Str(_) => 4,
        }
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Bool(a), KeyValue::Bool(b)) => a.cmp(b),
            (KeyValue::Int(a), KeyValue::Int(b)) => a.cmp(b),
            (KeyValue::Float(a), KeyValue::Float(b)) => a.total_cmp(b),
            (KeyValue::Str(a), KeyValue::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a key column's values were extracted, used to rebuild it with the
/// matching dtype in the output.
#[derive(Debug, Clone, Copy)]
enum KeyMode {
    Int,
    Float,
    Bool,
    Str,
}

struct KeyColumn {
    name: String,
    mode: KeyMode,
    values: Vec<KeyValue>,
}

fn extract_key_column(table: &Table, name: &str) -> Result<KeyColumn> {
    let column = table.column(name)?;
    let series = column.as_materialized_series();

    let (mode, values) = match series.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let cast = series.cast(&DataType::Float64)?;
            // NaN keys count as missing, like everywhere else in the crate;
            // this also keeps `Ord` and the derived `PartialEq` agreeing.
            let values = cast
                .f64()?
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if !v.is_nan() => KeyValue::Float(v),
                    _ => KeyValue::Null,
                })
                .collect();
            (KeyMode::Float, values)
        }
        d if crate::types::is_numeric_dtype(d) => {
            let cast = series.cast(&DataType::Int64)?;
            let values = cast
                .i64()?
                .into_iter()
                .map(|opt| opt.map(KeyValue::Int).unwrap_or(KeyValue::Null))
                .collect();
            (KeyMode::Int, values)
        }
        DataType::Boolean => {
            let values = series
                .bool()?
                .into_iter()
                .map(|opt| opt.map(KeyValue::Bool).unwrap_or(KeyValue::Null))
                .collect();
            (KeyMode::Bool, values)
        }
        // Text, dates, everything else: group on the string rendering.
        // ISO date strings order chronologically, so sorting still holds.
        _ => {
            let cast = series.cast(&DataType::String)?;
            let values = cast
                .str()?
                .into_iter()
                .map(|opt| {
                    opt.map(|s| KeyValue::Str(s.to_string()))
                        .unwrap_or(KeyValue::Null)
                })
                .collect();
            (KeyMode::Str, values)
        }
    };

    Ok(KeyColumn {
        name: name.to_string(),
        mode,
        values,
    })
}

fn rebuild_key_series(key_col: &KeyColumn, groups: &[&Vec<KeyValue>], index: usize) -> Series {
    let name: PlSmallStr = key_col.name.as_str().into();
    match key_col.mode {
        KeyMode::Int => {
            let vals: Vec<Option<i64>> = groups
                .iter()
                .map(|g| match &g[index] {
                    KeyValue::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, vals)
        }
        KeyMode::Float => {
            let vals: Vec<Option<f64>> = groups
                .iter()
                .map(|g| match &g[index] {
                    KeyValue::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, vals)
        }
        KeyMode::Bool => {
            let vals: Vec<Option<bool>> = groups
                .iter()
                .map(|g| match &g[index] {
                    KeyValue::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, vals)
        }
        KeyMode::Str => {
            let vals: Vec<Option<String>> = groups
                .iter()
                .map(|g| match &g[index] {
                    KeyValue::Str(v) => Some(v.clone()),
                    _ => None,
                })
                .collect();
            Series::new(name, vals)
        }
    }
}

fn apply_op(op: AggOp, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let result = match op {
        AggOp::Mean => values.iter().sum::<f64>() / values.len() as f64,
        AggOp::Sum => values.iter().sum(),
        AggOp::Std => sample_std(values),
        AggOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    Some(result)
}

/// Aggregate `measures` over the distinct combinations of `group_keys`.
///
/// Output columns are the group keys followed by one `<measure>_<op>` column
/// per (measure, op) pair. Missing measure values are excluded from that
/// measure's reducers only — the group itself survives, and a group with no
/// usable values for a measure gets a null statistic.
pub fn aggregate(
    table: &Table,
    group_keys: &[&str],
    measures: &[&str],
    ops: &[AggOp],
) -> Result<Table> {
    if group_keys.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "aggregate requires at least one group key".to_string(),
        ));
    }
    if measures.is_empty() || ops.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "aggregate requires at least one measure and one op".to_string(),
        ));
    }

    let key_columns: Vec<KeyColumn> = group_keys
        .iter()
        .map(|name| extract_key_column(table, name))
        .collect::<Result<_>>()?;

    // Measure values as row-indexable vectors; NaN counts as missing.
    let mut measure_values: Vec<Vec<Option<f64>>> = Vec::with_capacity(measures.len());
    for measure in measures {
        let series = table.numeric_series(measure)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|opt| opt.filter(|v| !v.is_nan()))
            .collect();
        measure_values.push(values);
    }

    // Deduplicate ops, preserving caller order, so column names stay unique.
    let mut unique_ops: Vec<AggOp> = Vec::new();
    for op in ops {
        if !unique_ops.contains(op) {
            unique_ops.push(*op);
        }
    }

    // BTreeMap iteration yields groups sorted by key columns in order.
    let mut groups: BTreeMap<Vec<KeyValue>, Vec<usize>> = BTreeMap::new();
    for row in 0..table.height() {
        let key: Vec<KeyValue> = key_columns.iter().map(|c| c.values[row].clone()).collect();
        groups.entry(key).or_default().push(row);
    }

    debug!(
        "Aggregated {} rows into {} groups over {:?}",
        table.height(),
        groups.len(),
        group_keys
    );

    let group_keys_sorted: Vec<&Vec<KeyValue>> = groups.keys().collect();
    let mut columns: Vec<Column> = Vec::new();
    let mut schema: Vec<ColumnSchema> = Vec::new();

    for (index, key_col) in key_columns.iter().enumerate() {
        let series = rebuild_key_series(key_col, &group_keys_sorted, index);
        columns.push(series.into_column());
        schema.push(ColumnSchema {
            name: key_col.name.clone(),
            kind: match key_col.mode {
                KeyMode::Int | KeyMode::Float => ColumnKind::Numeric,
                KeyMode::Bool => ColumnKind::Boolean,
                KeyMode::Str => ColumnKind::Text,
            },
        });
    }

    for (measure, values) in measures.iter().zip(&measure_values) {
        for op in &unique_ops {
            let stat: Vec<Option<f64>> = groups
                .values()
                .map(|rows| {
                    let group_values: Vec<f64> =
                        rows.iter().filter_map(|&r| values[r]).collect();
                    apply_op(*op, &group_values)
                })
                .collect();

            let name = format!("{}_{}", measure, op.name());
            columns.push(Series::new(name.as_str().into(), stat).into_column());
            schema.push(ColumnSchema {
                name,
                kind: ColumnKind::Numeric,
            });
        }
    }

    let df = DataFrame::new(columns)?;
    Ok(Table::with_schema(df, schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64s(table: &Table, name: &str) -> Vec<Option<f64>> {
        table
            .numeric_series(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_mean_sum_std_of_known_group() {
        let df = df![
            "region" => ["north", "north", "north"],
            "value" => [2.0f64, 4.0, 6.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(
            &table,
            &["region"],
            &["value"],
            &[AggOp::Sum, AggOp::Mean, AggOp::Std],
        )
        .unwrap();

        assert_eq!(out.height(), 1);
        assert_eq!(f64s(&out, "value_sum"), vec![Some(12.0)]);
        assert_eq!(f64s(&out, "value_mean"), vec![Some(4.0)]);
        assert_eq!(f64s(&out, "value_std"), vec![Some(2.0)]);
    }

    #[test]
    fn test_groups_sorted_by_keys() {
        let df = df![
            "region" => ["south", "north", "south", "north"],
            "year" => [2001i64, 2000, 2000, 2001],
            "value" => [1.0f64, 2.0, 3.0, 4.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(&table, &["region", "year"], &["value"], &[AggOp::Sum]).unwrap();
        assert_eq!(out.height(), 4);

        let regions = out.column("region").unwrap().as_materialized_series().clone();
        let regions: Vec<String> = regions
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();
        assert_eq!(regions, vec!["north", "north", "south", "south"]);

        let years = out.column("year").unwrap().as_materialized_series().clone();
        let years: Vec<i64> = years.i64().unwrap().into_iter().map(|v| v.unwrap()).collect();
        assert_eq!(years, vec![2000, 2001, 2000, 2001]);
    }

    #[test]
    fn test_missing_measure_values_excluded_from_stat_only() {
        let df = df![
            "region" => ["north", "north", "south"],
            "value" => [Some(2.0f64), None, None],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(&table, &["region"], &["value"], &[AggOp::Mean]).unwrap();
        // Both groups survive; south has no usable values -> null stat.
        assert_eq!(out.height(), 2);
        assert_eq!(f64s(&out, "value_mean"), vec![Some(2.0), None]);
    }

    #[test]
    fn test_no_empty_groups_materialized() {
        let df = df![
            "year" => [2000i64, 2000, 2002],
            "value" => [1.0f64, 2.0, 3.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(&table, &["year"], &["value"], &[AggOp::Sum]).unwrap();
        // 2001 never appears in the source, so no group for it.
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_unknown_key_column() {
        let df = df!["value" => [1.0f64]].unwrap();
        let table = Table::from_frame(df);

        let err = aggregate(&table, &["region"], &["value"], &[AggOp::Sum]).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_non_numeric_measure() {
        let df = df![
            "region" => ["north"],
            "label" => ["x"],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let err = aggregate(&table, &["region"], &["label"], &[AggOp::Sum]).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_empty_keys_rejected() {
        let df = df!["value" => [1.0f64]].unwrap();
        let table = Table::from_frame(df);

        let err = aggregate(&table, &[], &["value"], &[AggOp::Sum]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_nan_keys_group_with_nulls() {
        let df = df![
            "level" => [Some(1.0f64), Some(f64::NAN), None, Some(1.0)],
            "value" => [1.0f64, 2.0, 3.0, 4.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(&table, &["level"], &["value"], &[AggOp::Sum]).unwrap();
        // NaN and null keys collapse into one missing-key group, sorted
        // first; 1.0 forms the other.
        assert_eq!(out.height(), 2);
        assert_eq!(f64s(&out, "value_sum"), vec![Some(5.0), Some(5.0)]);

        let levels = f64s(&out, "level");
        assert_eq!(levels, vec![None, Some(1.0)]);
    }

    #[test]
    fn test_min_max_and_duplicate_ops_deduped() {
        let df = df![
            "region" => ["north", "north"],
            "value" => [3.0f64, 7.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let out = aggregate(
            &table,
            &["region"],
            &["value"],
            &[AggOp::Min, AggOp::Max, AggOp::Min],
        )
        .unwrap();

        assert_eq!(out.width(), 3);
        assert_eq!(f64s(&out, "value_min"), vec![Some(3.0)]);
        assert_eq!(f64s(&out, "value_max"), vec![Some(7.0)]);
    }
}
