//! CSV source loading.
//!
//! Reads a delimited text file into a [`Table`], inferring the column dtypes
//! (including dates) once at load time. Column names are normalized so
//! downstream consumers are resilient to naming drift in the source files:
//! `LandAverageTemperature` and `Land Average Temperature` both become
//! `land_average_temperature`.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::types::Table;
use once_cell::sync::Lazy;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Load a CSV file into a typed table.
///
/// Fails with [`PipelineError::SourceNotFound`] when the file does not exist
/// and [`PipelineError::SourceFormat`] when the content cannot be parsed.
pub fn load_csv(path: &Path, config: &PipelineConfig) -> Result<Table> {
    if !path.exists() {
        return Err(PipelineError::SourceNotFound(path.display().to_string()));
    }

    info!("Loading source file: {}", path.display());

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(config.infer_schema_length))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_try_parse_dates(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| source_format(path, &e))?
        .finish()
        .map_err(|e| source_format(path, &e))?;

    let df = normalize_column_names(df, path)?;
    let table = Table::from_frame(df);

    debug!(
        "Loaded {} with shape ({}, {})",
        path.display(),
        table.height(),
        table.width()
    );

    Ok(table)
}

fn source_format(path: &Path, err: &polars::error::PolarsError) -> PipelineError {
    PipelineError::SourceFormat {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Normalize a raw header name: split camel-case word boundaries, lower-case,
/// collapse whitespace and punctuation runs into single underscores.
pub fn normalize_column_name(name: &str) -> String {
    static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

    let lowered = split_camel_boundaries(name.trim()).to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Insert `_` at camel-case word boundaries: before an uppercase letter that
/// follows a lowercase letter or digit, and before the last letter of an
/// uppercase run followed by lowercase ("GHGTotal" -> "GHG_Total").
fn split_camel_boundaries(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(c);
    }

    out
}

fn normalize_column_names(mut df: DataFrame, path: &Path) -> Result<DataFrame> {
    let old_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut new_names = Vec::with_capacity(old_names.len());
    let mut seen = HashSet::new();
    for (idx, old) in old_names.iter().enumerate() {
        let mut normalized = normalize_column_name(old);
        if normalized.is_empty() {
            normalized = format!("column_{idx}");
        }
        if !seen.insert(normalized.clone()) {
            return Err(PipelineError::SourceFormat {
                path: path.display().to_string(),
                reason: format!("duplicate column name '{normalized}' after normalization"),
            });
        }
        new_names.push(normalized);
    }

    for (old, new) in old_names.iter().zip(&new_names) {
        if old != new {
            df.rename(old, new.as_str().into())?;
        }
    }

    Ok(df)
}
