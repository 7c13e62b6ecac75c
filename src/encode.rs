//! Drop-first one-hot encoding of categorical columns.

use crate::error::Result;
use crate::types::{ColumnKind, ColumnSchema, Table};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Replace every text column with boolean indicator columns.
///
/// For a column with k distinct non-missing values, the first value in
/// sorted order is dropped as the reference level and the remaining k - 1
/// values become indicator columns named `<column>_<value>`. Rows holding
/// the reference level, or a missing value, have all indicators false.
/// Numeric, date, and boolean columns pass through untouched; row count is
/// unchanged.
///
/// Sorted order is a deliberate, deterministic choice of reference level so
/// encoded schemas are stable across runs.
pub fn one_hot_encode(table: &Table) -> Result<Table> {
    let mut df = table.frame().clone();
    let mut schema: Vec<ColumnSchema> = Vec::with_capacity(table.width());

    for col_schema in table.schema() {
        if col_schema.kind != ColumnKind::Text {
            schema.push(col_schema.clone());
            continue;
        }

        let column = table.column(&col_schema.name)?;
        let series = column.as_materialized_series();
        let str_series = series.cast(&DataType::String)?;
        let chunked = str_series.str()?;

        let distinct: BTreeSet<&str> = chunked.into_iter().flatten().collect();

        debug!(
            "Encoding '{}' with {} distinct values into {} indicators",
            col_schema.name,
            distinct.len(),
            distinct.len().saturating_sub(1)
        );

        df = df.drop(&col_schema.name)?;

        // First value in sorted order is the reference level.
        for value in distinct.iter().skip(1) {
            let indicator: Vec<bool> = chunked
                .into_iter()
                .map(|opt| opt == Some(*value))
                .collect();
            let name = format!("{}_{}", col_schema.name, value);
            df.with_column(Series::new(name.as_str().into(), indicator))?;
            schema.push(ColumnSchema {
                name,
                kind: ColumnKind::Boolean,
            });
        }
    }

    // Indicator columns were appended at the end of the frame; line the
    // schema order up with the frame's column order.
    let order: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    schema.sort_by_key(|c| order.iter().position(|n| *n == c.name));

    Ok(Table::with_schema(df, schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(table: &Table, name: &str) -> Vec<bool> {
        let col = table.frame().column(name).unwrap();
        col.as_materialized_series()
            .bool()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_k_minus_one_indicators_sorted_reference() {
        let df = df![
            "gas" => ["methane", "co2", "n2o", "co2"],
            "value" => [1.0f64, 2.0, 3.0, 4.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let encoded = one_hot_encode(&table).unwrap();

        // "co2" sorts first and is dropped as the reference level.
        assert!(!encoded.has_column("gas"));
        assert!(!encoded.has_column("gas_co2"));
        assert_eq!(encoded.kind_of("gas_methane"), Some(ColumnKind::Boolean));
        assert_eq!(encoded.kind_of("gas_n2o"), Some(ColumnKind::Boolean));
        assert_eq!(encoded.height(), 4);

        assert_eq!(indicator(&encoded, "gas_methane"), vec![true, false, false, false]);
        assert_eq!(indicator(&encoded, "gas_n2o"), vec![false, false, true, false]);
    }

    #[test]
    fn test_indicator_sum_zero_or_one() {
        let df = df![
            "region" => [Some("north"), Some("south"), Some("east"), Some("east"), None],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let encoded = one_hot_encode(&table).unwrap();
        assert_eq!(encoded.width(), 2); // 3 distinct -> 2 indicators

        for row in 0..encoded.height() {
            let sum: usize = encoded
                .column_names()
                .iter()
                .filter(|name| indicator(&encoded, name)[row])
                .count();
            assert!(sum <= 1);
        }

        // "east" sorts first and becomes the reference level, so the "east"
        // rows and the missing row have all indicators false.
        let north = indicator(&encoded, "region_north");
        let south = indicator(&encoded, "region_south");
        assert!(!north[2] && !south[2]);
        assert!(!north[3] && !south[3]);
        assert!(!north[4] && !south[4]);
        assert!(north[0]);
        assert!(south[1]);
    }

    #[test]
    fn test_single_category_column_dropped() {
        let df = df![
            "source" => ["satellite", "satellite"],
            "value" => [1.0f64, 2.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let encoded = one_hot_encode(&table).unwrap();
        // k = 1 -> zero indicators; the column simply disappears.
        assert_eq!(encoded.column_names(), vec!["value"]);
    }

    #[test]
    fn test_non_text_columns_untouched() {
        let df = df![
            "year" => [2000i64, 2001],
            "flag" => [true, false],
            "value" => [1.0f64, 2.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let encoded = one_hot_encode(&table).unwrap();
        assert_eq!(encoded.column_names(), vec!["year", "flag", "value"]);
        assert_eq!(encoded.frame(), table.frame());
    }

    #[test]
    fn test_multiple_text_columns() {
        let df = df![
            "gas" => ["co2", "ch4"],
            "sector" => ["energy", "transport"],
            "value" => [1.0f64, 2.0],
        ]
        .unwrap();
        let table = Table::from_frame(df);

        let encoded = one_hot_encode(&table).unwrap();
        // gas: ch4 dropped, co2 kept; sector: energy dropped, transport kept.
        assert!(encoded.has_column("gas_co2"));
        assert!(encoded.has_column("sector_transport"));
        assert_eq!(encoded.width(), 3);
    }
}
