use pulse_forecast::{
    ActivationProfile, BoundsWarningConfig, ForecastConfig, GrowthWeighting, ScenarioMultipliers,
    TrendConfig,
};
use serde::Deserialize;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPulseConfig {
    /// Years to forecast
    pub forecast_horizon: Option<Vec<i32>>,

    /// Relative uncertainty of event contributions
    pub uncertainty_fraction: Option<f64>,

    #[serde(default)]
    pub scenario_multipliers: RawScenarioMultipliers,

    #[serde(default)]
    pub trend: RawTrendConfig,

    /// Replaced as a whole; its fields depend on the profile kind
    pub activation: Option<ActivationProfile>,

    #[serde(default)]
    pub bounds: RawBoundsConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawScenarioMultipliers {
    pub optimistic: Option<f64>,
    pub pessimistic: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTrendConfig {
    pub asymptote: Option<f64>,
    pub damping_exponent: Option<f64>,
    pub weighting: Option<GrowthWeighting>,
    pub steps_per_year: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBoundsConfig {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl RawPulseConfig {
    /// Fill every unset field from the library defaults.
    pub fn into_config(self) -> ForecastConfig {
        let defaults = ForecastConfig::default();
        let ScenarioMultipliers {
            optimistic,
            pessimistic,
        } = defaults.scenario_multipliers;
        let TrendConfig {
            asymptote,
            damping_exponent,
            weighting,
            steps_per_year,
        } = defaults.trend;
        let BoundsWarningConfig { lower, upper } = defaults.bounds;

        ForecastConfig {
            forecast_horizon: self.forecast_horizon.unwrap_or(defaults.forecast_horizon),
            uncertainty_fraction: self
                .uncertainty_fraction
                .unwrap_or(defaults.uncertainty_fraction),
            scenario_multipliers: ScenarioMultipliers {
                optimistic: self.scenario_multipliers.optimistic.unwrap_or(optimistic),
                pessimistic: self.scenario_multipliers.pessimistic.unwrap_or(pessimistic),
            },
            trend: TrendConfig {
                asymptote: self.trend.asymptote.unwrap_or(asymptote),
                damping_exponent: self.trend.damping_exponent.unwrap_or(damping_exponent),
                weighting: self.trend.weighting.unwrap_or(weighting),
                steps_per_year: self.trend.steps_per_year.unwrap_or(steps_per_year),
            },
            activation: self.activation.unwrap_or(defaults.activation),
            bounds: BoundsWarningConfig {
                lower: self.bounds.lower.unwrap_or(lower),
                upper: self.bounds.upper.unwrap_or(upper),
            },
        }
    }
}
