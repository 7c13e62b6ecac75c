//! Catalog of the climate datasets the dashboard renders.
//!
//! Each dataset is a flat CSV with a fixed schema. The catalog records the
//! source file name, the measure column that the outlier and log-transform
//! steps target (post-normalization name), and whether the one-hot encoding
//! step applies to it.

use crate::error::{PipelineError, Result};
use serde::Serialize;

/// One of the climate data sources behind the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dataset {
    /// Earth surface temperature records.
    Temperature,
    /// Climate insights panel data.
    Insights,
    /// Greenhouse gas emissions by country, year, and gas.
    GreenhouseGas,
    /// Global mean sea level.
    SeaLevel,
    /// Crop production.
    Crop,
    /// Forest cover / deforestation.
    Forest,
    /// Sea ice extent.
    Ice,
}

impl Dataset {
    /// Stable identifier used by consumers and the CLI.
    pub fn id(&self) -> &'static str {
        match self {
            Dataset::Temperature => "temperature",
            Dataset::Insights => "insights",
            Dataset::GreenhouseGas => "ghg",
            Dataset::SeaLevel => "sea_level",
            Dataset::Crop => "crop",
            Dataset::Forest => "forest",
            Dataset::Ice => "ice",
        }
    }

    /// Source file name, resolved against the configured data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Temperature => "GlobalTemperatures.csv",
            Dataset::Insights => "climate_insights.csv",
            Dataset::GreenhouseGas => "greenhouse_gas_emissions.csv",
            Dataset::SeaLevel => "global_sea_level.csv",
            Dataset::Crop => "crop_production.csv",
            Dataset::Forest => "deforestation.csv",
            Dataset::Ice => "sea_ice_extent.csv",
        }
    }

    /// The numeric column the outlier and skew-correction steps target,
    /// after header normalization.
    pub fn measure_column(&self) -> &'static str {
        match self {
            Dataset::Temperature => "land_average_temperature",
            Dataset::Insights => "temperature",
            Dataset::GreenhouseGas => "co2",
            Dataset::SeaLevel => "gmsl",
            Dataset::Crop => "value",
            Dataset::Forest => "forest_area_pct",
            Dataset::Ice => "extent",
        }
    }

    /// Whether the categorical-encoding step runs for this dataset.
    ///
    /// Sea level and sea ice tables feed time-series charts directly and
    /// keep their label columns.
    pub fn encode_categoricals(&self) -> bool {
        !matches!(self, Dataset::SeaLevel | Dataset::Ice)
    }

    /// All datasets, in catalog order.
    pub fn all() -> [Dataset; 7] {
        [
            Dataset::Temperature,
            Dataset::Insights,
            Dataset::GreenhouseGas,
            Dataset::SeaLevel,
            Dataset::Crop,
            Dataset::Forest,
            Dataset::Ice,
        ]
    }
}

impl std::str::FromStr for Dataset {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Dataset> {
        Dataset::all()
            .into_iter()
            .find(|d| d.id() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "Unknown dataset '{}' (expected one of: {})",
                    s,
                    Dataset::all().map(|d| d.id()).join(", ")
                ))
            })
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for dataset in Dataset::all() {
            assert_eq!(dataset.id().parse::<Dataset>().unwrap(), dataset);
        }
    }

    #[test]
    fn test_unknown_id() {
        let err = "volcanoes".parse::<Dataset>().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_encoding_skipped_for_time_series_sources() {
        assert!(!Dataset::SeaLevel.encode_categoricals());
        assert!(!Dataset::Ice.encode_categoricals());
        assert!(Dataset::GreenhouseGas.encode_categoricals());
    }
}
