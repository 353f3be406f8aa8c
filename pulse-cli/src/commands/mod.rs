pub mod backtest;
pub mod config;
pub mod forecast;
pub mod impacts;
pub mod matrix;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pulse_forecast::{Dataset, ForecastConfig, ForecastEngine};

use crate::GlobalOpts;
use crate::config::ConfigLoader;

/// Dataset input shared by data commands.
#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// JSON file with `observations`, `events`, and `impact_links` tables
    pub dataset: PathBuf,
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    Dataset::from_json_str(&contents)
        .with_context(|| format!("Invalid dataset {}", path.display()))
}

/// Load layered configuration, apply a command-line horizon, and validate.
pub fn load_config(opts: &GlobalOpts, horizon: Option<Horizon>) -> Result<ForecastConfig> {
    let mut config = ConfigLoader::load(opts.config.as_deref())?;
    if let Some(Horizon(years)) = horizon {
        config.forecast_horizon = years;
        config.validate()?;
    }
    Ok(config)
}

/// Build an engine from the effective configuration.
pub fn load_engine(opts: &GlobalOpts, horizon: Option<Horizon>) -> Result<ForecastEngine> {
    Ok(ForecastEngine::new(load_config(opts, horizon)?)?)
}

/// Forecast years given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon(pub Vec<i32>);

/// Parse an inclusive year range such as `2025..=2030` or a single year.
pub fn parse_horizon(s: &str) -> Result<Horizon, String> {
    let parse_year = |y: &str| {
        y.trim()
            .parse::<i32>()
            .map_err(|_| format!("'{y}' is not a year"))
    };

    let (start, end) = match s.split_once("..=") {
        Some((start, end)) => (parse_year(start)?, parse_year(end)?),
        None => {
            let year = parse_year(s)?;
            (year, year)
        }
    };
    if start > end {
        return Err(format!("horizon start {start} is after end {end}"));
    }
    Ok(Horizon((start..=end).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_horizon_range() {
        assert_eq!(
            parse_horizon("2025..=2027").unwrap(),
            Horizon(vec![2025, 2026, 2027])
        );
        assert_eq!(parse_horizon("2030").unwrap(), Horizon(vec![2030]));
    }

    #[test]
    fn test_parse_horizon_rejects_bad_input() {
        assert!(parse_horizon("2027..=2025").is_err());
        assert!(parse_horizon("soon").is_err());
        assert!(parse_horizon("2025..2027").is_err());
    }

    #[test]
    fn test_load_dataset_reports_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
