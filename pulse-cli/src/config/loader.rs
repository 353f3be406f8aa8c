use super::types::{
    RawBoundsConfig, RawPulseConfig, RawScenarioMultipliers, RawTrendConfig,
};
use anyhow::{Context, Result};
use pulse_forecast::ForecastConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + explicit file)
    ///
    /// The result is validated; an invalid merged configuration is an error.
    pub fn load(explicit: Option<&Path>) -> Result<ForecastConfig> {
        let mut raw = RawPulseConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Explicit --config file, which must exist
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        Self::finalize(raw)
    }

    /// Get user config path (`$XDG_CONFIG_HOME/pulse/config.toml`)
    pub fn user_config_path() -> PathBuf {
        pulse_paths::user_config_file()
    }

    /// Get project config path
    /// Can be overridden with PULSE_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("PULSE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join(pulse_paths::CONFIG_FILE_NAME)
        } else {
            PathBuf::from(".pulse").join(pulse_paths::CONFIG_FILE_NAME)
        }
    }

    fn read_raw(path: &Path) -> Result<RawPulseConfig> {
        debug!(path = %path.display(), "Reading config layer");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid TOML in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawPulseConfig, overlay: RawPulseConfig) -> RawPulseConfig {
        RawPulseConfig {
            forecast_horizon: overlay.forecast_horizon.or(base.forecast_horizon),
            uncertainty_fraction: overlay.uncertainty_fraction.or(base.uncertainty_fraction),
            scenario_multipliers: RawScenarioMultipliers {
                optimistic: overlay
                    .scenario_multipliers
                    .optimistic
                    .or(base.scenario_multipliers.optimistic),
                pessimistic: overlay
                    .scenario_multipliers
                    .pessimistic
                    .or(base.scenario_multipliers.pessimistic),
            },
            trend: RawTrendConfig {
                asymptote: overlay.trend.asymptote.or(base.trend.asymptote),
                damping_exponent: overlay
                    .trend
                    .damping_exponent
                    .or(base.trend.damping_exponent),
                weighting: overlay.trend.weighting.or(base.trend.weighting),
                steps_per_year: overlay.trend.steps_per_year.or(base.trend.steps_per_year),
            },
            activation: overlay.activation.or(base.activation),
            bounds: RawBoundsConfig {
                lower: overlay.bounds.lower.or(base.bounds.lower),
                upper: overlay.bounds.upper.or(base.bounds.upper),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawPulseConfig) -> Result<ForecastConfig> {
        let config = raw.into_config();
        config.validate()?;
        Ok(config)
    }
}
