//! Forecast run configuration.
//!
//! Validation happens up front: a run never starts with an empty horizon,
//! non-positive multipliers, or an uncertainty fraction outside `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::contribution::ActivationProfile;
use crate::error::{Error, Result};
use crate::forecast::{BoundsWarningConfig, ScenarioMultipliers};
use crate::trend::TrendConfig;

/// Default forecast horizon.
pub const DEFAULT_HORIZON: [i32; 3] = [2025, 2026, 2027];

/// Default uncertainty fraction applied to event contributions.
pub const DEFAULT_UNCERTAINTY_FRACTION: f64 = 0.3;

/// Configuration for a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Years to forecast, strictly increasing
    pub forecast_horizon: Vec<i32>,
    /// Relative uncertainty of event contributions (0.0-1.0)
    pub uncertainty_fraction: f64,
    #[serde(default)]
    pub scenario_multipliers: ScenarioMultipliers,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub activation: ActivationProfile,
    #[serde(default)]
    pub bounds: BoundsWarningConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: DEFAULT_HORIZON.to_vec(),
            uncertainty_fraction: DEFAULT_UNCERTAINTY_FRACTION,
            scenario_multipliers: ScenarioMultipliers::default(),
            trend: TrendConfig::default(),
            activation: ActivationProfile::default(),
            bounds: BoundsWarningConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every configuration rule, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon.is_empty() {
            return Err(invalid("forecast horizon is empty"));
        }
        if self.forecast_horizon.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("forecast horizon must be strictly increasing"));
        }
        if !(0.0..=1.0).contains(&self.uncertainty_fraction) {
            return Err(invalid(format!(
                "uncertainty fraction {} is outside [0, 1]",
                self.uncertainty_fraction
            )));
        }

        let multipliers = &self.scenario_multipliers;
        for (name, value) in [
            ("optimistic", multipliers.optimistic),
            ("pessimistic", multipliers.pessimistic),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!(
                    "{name} multiplier {value} must be a positive number"
                )));
            }
        }

        let trend = &self.trend;
        if !trend.asymptote.is_finite() || trend.asymptote <= 0.0 {
            return Err(invalid(format!(
                "trend asymptote {} must be positive",
                trend.asymptote
            )));
        }
        if !trend.damping_exponent.is_finite() || trend.damping_exponent < 0.0 {
            return Err(invalid(format!(
                "damping exponent {} must be non-negative",
                trend.damping_exponent
            )));
        }
        if trend.steps_per_year == 0 {
            return Err(invalid("trend steps_per_year must be at least 1"));
        }

        if let ActivationProfile::ExponentialDecay { rate } = self.activation
            && (!rate.is_finite() || rate < 0.0)
        {
            return Err(invalid(format!(
                "decay rate {rate} must be non-negative"
            )));
        }

        let bounds = &self.bounds;
        if !bounds.lower.is_finite() || !bounds.upper.is_finite() || bounds.lower >= bounds.upper {
            return Err(invalid(format!(
                "bounds warning lower {} must be below upper {}",
                bounds.lower, bounds.upper
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::Configuration(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::GrowthWeighting;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForecastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forecast_horizon, vec![2025, 2026, 2027]);
        assert!((config.uncertainty_fraction - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.activation, ActivationProfile::Step);
    }

    #[test]
    fn test_empty_horizon_rejected() {
        let config = ForecastConfig {
            forecast_horizon: vec![],
            ..ForecastConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("horizon is empty"));
    }

    #[test]
    fn test_unordered_horizon_rejected() {
        let config = ForecastConfig {
            forecast_horizon: vec![2026, 2025],
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ForecastConfig {
            forecast_horizon: vec![2025, 2025],
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_multipliers_rejected() {
        for (optimistic, pessimistic) in [(0.0, 0.8), (1.2, -0.5), (f64::NAN, 0.8)] {
            let config = ForecastConfig {
                scenario_multipliers: ScenarioMultipliers {
                    optimistic,
                    pessimistic,
                },
                ..ForecastConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::Configuration(_))),
                "({optimistic}, {pessimistic}) should be rejected"
            );
        }
    }

    #[test]
    fn test_uncertainty_fraction_range() {
        for fraction in [-0.1, 1.5, f64::NAN] {
            let config = ForecastConfig {
                uncertainty_fraction: fraction,
                ..ForecastConfig::default()
            };
            assert!(config.validate().is_err(), "{fraction} should be rejected");
        }
        for fraction in [0.0, 1.0] {
            let config = ForecastConfig {
                uncertainty_fraction: fraction,
                ..ForecastConfig::default()
            };
            assert!(config.validate().is_ok(), "{fraction} should be accepted");
        }
    }

    #[test]
    fn test_negative_decay_rate_rejected() {
        let config = ForecastConfig {
            activation: ActivationProfile::ExponentialDecay { rate: -1.0 },
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_str() {
        let toml = r#"
forecast_horizon = [2025, 2026, 2027, 2028]
uncertainty_fraction = 0.25

[scenario_multipliers]
optimistic = 1.5
pessimistic = 0.5

[activation]
kind = "exponential_decay"
rate = 0.1
"#;
        let config = ForecastConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.forecast_horizon.len(), 4);
        assert_eq!(config.scenario_multipliers.optimistic, 1.5);
        assert_eq!(
            config.activation,
            ActivationProfile::ExponentialDecay { rate: 0.1 }
        );
        // Omitted sections fall back to defaults
        assert_eq!(config.trend, TrendConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let toml = r#"
forecast_horizon = [2025]
uncertainty_fraction = 0.3

[trend]
damping_exponent = 2.0
"#;
        let config = ForecastConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.trend.damping_exponent, 2.0);
        assert_eq!(config.trend.asymptote, 100.0);
        assert_eq!(config.trend.steps_per_year, 12);
    }

    #[test]
    fn test_from_toml_str_validates() {
        let toml = r#"
forecast_horizon = []
uncertainty_fraction = 0.3
"#;
        assert!(matches!(
            ForecastConfig::from_toml_str(toml),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = ForecastConfig {
            trend: TrendConfig {
                weighting: GrowthWeighting::Recency,
                ..TrendConfig::default()
            },
            ..ForecastConfig::default()
        };
        let toml = toml::to_string(&config).unwrap();
        let parsed: ForecastConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
