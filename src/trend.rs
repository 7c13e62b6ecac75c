//! Linear trend estimation per group.

use crate::error::{PipelineError, Result};
use crate::types::{Table, TrendRecord};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Ordinary-least-squares slope of y on x.
///
/// Closed form: `Σ(x - x̄)(y - ȳ) / Σ(x - x̄)²`. Needs at least two points;
/// all-equal x values make the slope undefined.
pub fn estimate_trend(points: &[(f64, f64)]) -> Result<f64> {
    if points.len() < 2 {
        return Err(PipelineError::InsufficientData(points.len()));
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let numerator: f64 = points
        .iter()
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let denominator: f64 = points.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();

    if denominator == 0.0 {
        return Err(PipelineError::DegenerateInput);
    }

    Ok(numerator / denominator)
}

/// Fit one trend per group of `group_col`, regressing `y_col` on `x_col`.
///
/// Rows with a missing group, x, or y value are skipped. Groups that cannot
/// be fitted (fewer than two points, or zero x-variance) are dropped with a
/// warning rather than failing the whole derivation — "no trend available
/// for this group" is expected on real data. Records come back in
/// first-seen group order.
pub fn trend_by(
    table: &Table,
    group_col: &str,
    x_col: &str,
    y_col: &str,
) -> Result<Vec<TrendRecord>> {
    let group_column = table.column(group_col)?;
    let group_series = group_column.as_materialized_series().cast(&DataType::String)?;
    let group_values = group_series.str()?;

    let xs = table.numeric_series(x_col)?;
    let xs = xs.f64()?;
    let ys = table.numeric_series(y_col)?;
    let ys = ys.f64()?;

    let mut order: Vec<String> = Vec::new();
    let mut points_by_group: HashMap<String, Vec<(f64, f64)>> = HashMap::new();

    for ((group, x), y) in group_values.into_iter().zip(xs).zip(ys) {
        let (Some(group), Some(x), Some(y)) = (group, x, y) else {
            continue;
        };
        if x.is_nan() || y.is_nan() {
            continue;
        }
        if !points_by_group.contains_key(group) {
            order.push(group.to_string());
        }
        points_by_group
            .entry(group.to_string())
            .or_default()
            .push((x, y));
    }

    let mut records = Vec::with_capacity(order.len());
    for group in order {
        let points = &points_by_group[&group];
        match estimate_trend(points) {
            Ok(slope) => records.push(TrendRecord {
                group,
                slope,
                points: points.len(),
            }),
            Err(e) if e.is_recoverable() => {
                warn!("No trend for group '{}': {}", group, e);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Fitted {} trends grouping '{}' by '{}'",
        records.len(),
        y_col,
        group_col
    );

    Ok(records)
}
