//! CLI entry point for the climate data pipeline.

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Parser;
use climate_pipeline::{ClimatePipeline, Dataset, PipelineConfig, OUTLIER_COLUMN};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Climate dashboard data preparation pipeline",
    long_about = "Loads the climate source CSVs, cleans them, flags outliers,\n\
                  log-transforms the measure column, and one-hot encodes\n\
                  categoricals.\n\n\
                  EXAMPLES:\n  \
                  # Process every dataset under ./dataset\n  \
                  climate-pipeline\n\n  \
                  # Process one dataset from a custom directory\n  \
                  climate-pipeline --data-dir /data/climate --dataset ghg\n\n  \
                  # Machine-readable report\n  \
                  climate-pipeline --json | jq '.datasets.ghg.rows'"
)]
struct Args {
    /// Directory holding the source CSV files
    #[arg(short, long, default_value = "dataset")]
    data_dir: String,

    /// Dataset to process (temperature, insights, ghg, sea_level, crop,
    /// forest, ice), or "all"
    #[arg(long, default_value = "all")]
    dataset: String,

    /// Fraction of fields a row must have populated to survive cleaning
    #[arg(long, default_value = "0.7")]
    row_threshold: f64,

    /// IQR multiplier for the outlier fences
    #[arg(long, default_value = "1.5")]
    fence_multiplier: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output a JSON report to stdout instead of a human-readable summary
    ///
    /// Disables all logging; only the JSON report reaches stdout.
    #[arg(long)]
    json: bool,
}

/// Per-dataset slice of the run report.
#[derive(Debug, Serialize)]
struct DatasetReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outliers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<climate_pipeline::PipelineError>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    generated_at: String,
    data_dir: String,
    datasets: BTreeMap<String, DatasetReport>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// only carries the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = PipelineConfig::builder()
        .data_dir(&args.data_dir)
        .row_completeness_threshold(args.row_threshold)
        .iqr_fence_multiplier(args.fence_multiplier)
        .build()?;

    let pipeline = ClimatePipeline::new(config)?;

    let datasets: Vec<Dataset> = if args.dataset == "all" {
        Dataset::all().to_vec()
    } else {
        vec![args.dataset.parse()?]
    };

    info!(
        "Processing {} dataset(s) from '{}'",
        datasets.len(),
        args.data_dir
    );

    let mut reports = BTreeMap::new();
    let mut failures = 0usize;

    for dataset in &datasets {
        let report = match pipeline.table(*dataset) {
            Ok(table) => DatasetReport {
                rows: Some(table.height()),
                columns: Some(table.width()),
                outliers: Some(count_outliers(&table)),
                error: None,
            },
            Err(e) => {
                failures += 1;
                DatasetReport {
                    rows: None,
                    columns: None,
                    outliers: None,
                    error: Some(e),
                }
            }
        };
        reports.insert(dataset.id().to_string(), report);
    }

    let report = RunReport {
        generated_at: Utc::now().to_rfc3339(),
        data_dir: args.data_dir.clone(),
        datasets: reports,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if failures == datasets.len() {
        return Err(anyhow!("All {} dataset(s) failed to process", failures));
    }

    Ok(())
}

fn count_outliers(table: &climate_pipeline::Table) -> usize {
    table
        .frame()
        .column(OUTLIER_COLUMN)
        .ok()
        .and_then(|col| col.as_materialized_series().bool().ok().map(|b| b.sum()))
        .flatten()
        .unwrap_or(0) as usize
}

/// Print a human-readable summary of the run.
///
/// Intentionally uses `println!` rather than logging: this is the primary
/// output of the command and should be visible at any log level.
fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "=".repeat(72));
    println!("CLIMATE PIPELINE RUN ({})", report.generated_at);
    println!("{}", "=".repeat(72));
    println!("Data directory: {}", report.data_dir);
    println!();
    println!(
        "{:<14} {:>8} {:>9} {:>10}  {}",
        "Dataset", "Rows", "Columns", "Outliers", "Status"
    );
    println!("{}", "-".repeat(72));

    for (id, dataset) in &report.datasets {
        match &dataset.error {
            None => println!(
                "{:<14} {:>8} {:>9} {:>10}  ok",
                id,
                dataset.rows.unwrap_or(0),
                dataset.columns.unwrap_or(0),
                dataset.outliers.unwrap_or(0)
            ),
            Some(e) => println!("{:<14} {:>8} {:>9} {:>10}  FAILED: {}", id, "-", "-", "-", e),
        }
    }

    println!("{}", "=".repeat(72));
    println!("Use --json for machine-readable output");
}
