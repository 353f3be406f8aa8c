//! Scenario forecaster
//!
//! Combines a fitted trend with the event contribution function:
//! `value = clamp(trend + multiplier * contribution, 0, 100)`. Uncertainty is
//! applied to the event component only; the trend is taken as the more
//! certain part of the projection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::contribution::ContributionFunction;
use crate::trend::FittedTrend;
use crate::types::Pillar;

/// Lower bound of any forecast value.
pub const VALUE_MIN: f64 = 0.0;
/// Upper bound of any forecast value.
pub const VALUE_MAX: f64 = 100.0;

/// Forecast scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Baseline,
    Optimistic,
    Pessimistic,
}

impl Scenario {
    /// Scenarios in output order.
    pub const ALL: [Scenario; 3] = [
        Scenario::Baseline,
        Scenario::Optimistic,
        Scenario::Pessimistic,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Optimistic => "optimistic",
            Self::Pessimistic => "pessimistic",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multipliers applied to the event contribution per scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioMultipliers {
    /// Optimistic multiplier (default: 1.2)
    pub optimistic: f64,
    /// Pessimistic multiplier (default: 0.8)
    pub pessimistic: f64,
}

impl Default for ScenarioMultipliers {
    fn default() -> Self {
        Self {
            optimistic: 1.2,
            pessimistic: 0.8,
        }
    }
}

impl ScenarioMultipliers {
    /// Multiplier for a scenario; baseline is always 1.0.
    pub fn get(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Baseline => 1.0,
            Scenario::Optimistic => self.optimistic,
            Scenario::Pessimistic => self.pessimistic,
        }
    }
}

/// Raw projections outside these limits are reported as data-quality warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsWarningConfig {
    /// Warn when a raw value falls below this (default: -30.0)
    pub lower: f64,
    /// Warn when a raw value rises above this (default: 130.0)
    pub upper: f64,
}

impl Default for BoundsWarningConfig {
    fn default() -> Self {
        Self {
            lower: -30.0,
            upper: 130.0,
        }
    }
}

/// A single projected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub indicator: Pillar,
    pub year: i32,
    pub scenario: Scenario,
    pub value: f64,
    pub low_bound: f64,
    pub high_bound: f64,
}

/// A raw pre-clamp projection far outside the valid range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsViolation {
    pub indicator: Pillar,
    pub year: i32,
    pub scenario: Scenario,
    pub raw_value: f64,
}

/// Output of forecasting one indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorForecast {
    pub rows: Vec<ForecastRow>,
    pub warnings: Vec<BoundsViolation>,
}

/// Produces scenario forecasts with uncertainty bounds
pub struct ScenarioForecaster {
    multipliers: ScenarioMultipliers,
    uncertainty_fraction: f64,
    bounds: BoundsWarningConfig,
}

impl ScenarioForecaster {
    /// Create a forecaster with default multipliers, ±30% uncertainty.
    pub fn new() -> Self {
        Self {
            multipliers: ScenarioMultipliers::default(),
            uncertainty_fraction: 0.3,
            bounds: BoundsWarningConfig::default(),
        }
    }

    /// Create a forecaster with explicit settings.
    ///
    /// Values are expected to be validated by
    /// [`ForecastConfig::validate`](crate::ForecastConfig::validate).
    pub fn with_settings(
        multipliers: ScenarioMultipliers,
        uncertainty_fraction: f64,
        bounds: BoundsWarningConfig,
    ) -> Self {
        Self {
            multipliers,
            uncertainty_fraction,
            bounds,
        }
    }

    /// Forecast one (year, scenario) cell, returning the row and its raw value.
    pub fn project(
        &self,
        trend: &FittedTrend,
        contribution: &ContributionFunction,
        year: i32,
        scenario: Scenario,
    ) -> (ForecastRow, f64) {
        let base = trend.value(year);
        let effect = self.multipliers.get(scenario) * contribution.contribution(year);
        let raw = base + effect;

        let a = clamp(base + effect * (1.0 - self.uncertainty_fraction));
        let b = clamp(base + effect * (1.0 + self.uncertainty_fraction));

        let row = ForecastRow {
            indicator: trend.indicator,
            year,
            scenario,
            value: clamp(raw),
            low_bound: a.min(b),
            high_bound: a.max(b),
        };
        (row, raw)
    }

    /// Forecast every (year, scenario) for one indicator.
    ///
    /// Rows are ordered by year, then baseline, optimistic, pessimistic.
    pub fn forecast(
        &self,
        trend: &FittedTrend,
        contribution: &ContributionFunction,
        horizon: &[i32],
    ) -> IndicatorForecast {
        let mut output = IndicatorForecast::default();

        for &year in horizon {
            for scenario in Scenario::ALL {
                let (row, raw) = self.project(trend, contribution, year, scenario);
                if raw > self.bounds.upper || raw < self.bounds.lower {
                    warn!(
                        indicator = %trend.indicator,
                        year,
                        scenario = %scenario,
                        raw_value = raw,
                        "Raw projection far outside [0, 100], clamped"
                    );
                    output.warnings.push(BoundsViolation {
                        indicator: trend.indicator,
                        year,
                        scenario,
                        raw_value: raw,
                    });
                }
                output.rows.push(row);
            }
        }

        output
    }
}

impl Default for ScenarioForecaster {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(VALUE_MIN, VALUE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::ContributionBuilder;
    use crate::resolver::ResolvedImpact;
    use crate::trend::{DampedGrowthModel, TrendModel};
    use crate::types::{Confidence, Direction, EventType, RecordId};

    fn trend(series: &[(i32, f64)]) -> FittedTrend {
        DampedGrowthModel::new().fit(Pillar::Access, series).unwrap()
    }

    fn contribution(direction: Direction, magnitude: f64) -> ContributionFunction {
        let impact = ResolvedImpact {
            event_id: RecordId::from("EVT_1"),
            event_name: "Telebirr Launch".into(),
            event_year: 2021,
            event_type: EventType::Market,
            observation_id: RecordId::from("OBS_1"),
            indicator: Pillar::Access,
            direction,
            magnitude,
            lag_months: 0,
            confidence: Confidence::High,
        };
        ContributionBuilder::new().build_indicator(Pillar::Access, [&impact])
    }

    #[test]
    fn test_baseline_adds_full_contribution() {
        let trend = trend(&[(2021, 46.2), (2022, 48.7)]);
        let contribution = contribution(Direction::Positive, 4.2);
        let forecaster = ScenarioForecaster::new();

        let (row, raw) = forecaster.project(&trend, &contribution, 2025, Scenario::Baseline);

        assert!((row.value - (trend.value(2025) + 4.2)).abs() < 1e-9);
        assert_eq!(row.value, raw);
    }

    #[test]
    fn test_bounds_apply_uncertainty_to_contribution_only() {
        let trend = trend(&[(2021, 46.2), (2022, 48.7)]);
        let contribution = contribution(Direction::Positive, 4.0);
        let forecaster = ScenarioForecaster::new();

        let (row, _) = forecaster.project(&trend, &contribution, 2025, Scenario::Optimistic);
        let base = trend.value(2025);

        assert!((row.value - (base + 4.8)).abs() < 1e-9);
        assert!((row.low_bound - (base + 4.8 * 0.7)).abs() < 1e-9);
        assert!((row.high_bound - (base + 4.8 * 1.3)).abs() < 1e-9);
    }

    #[test]
    fn test_negative_contribution_keeps_low_below_high() {
        let trend = trend(&[(2021, 46.2), (2022, 48.7)]);
        let contribution = contribution(Direction::Negative, 5.0);
        let forecaster = ScenarioForecaster::new();

        let (row, _) = forecaster.project(&trend, &contribution, 2025, Scenario::Baseline);
        assert!(row.low_bound <= row.value);
        assert!(row.value <= row.high_bound);
        assert!(row.low_bound < row.high_bound);
    }

    #[test]
    fn test_values_are_clamped_and_violations_reported() {
        let trend = trend(&[(2021, 46.2), (2022, 48.7)]);
        let contribution = contribution(Direction::Positive, 100.0);
        let forecaster = ScenarioForecaster::new();

        let output = forecaster.forecast(&trend, &contribution, &[2025]);

        for row in &output.rows {
            assert!(row.value <= VALUE_MAX);
            assert!(row.high_bound <= VALUE_MAX);
            assert!(row.low_bound >= VALUE_MIN);
        }
        // Every scenario lands above 130 before clamping
        assert_eq!(output.warnings.len(), 3);
        assert!(output.warnings.iter().all(|w| w.raw_value > 130.0));
    }

    #[test]
    fn test_scenario_ordering_follows_contribution_sign() {
        let trend = trend(&[(2021, 30.0), (2022, 32.0)]);
        let forecaster = ScenarioForecaster::new();

        let positive = forecaster.forecast(&trend, &contribution(Direction::Positive, 3.0), &[2024]);
        let [baseline, optimistic, pessimistic] = [0, 1, 2].map(|i| positive.rows[i].value);
        assert!(pessimistic <= baseline && baseline <= optimistic);

        let negative = forecaster.forecast(&trend, &contribution(Direction::Negative, 3.0), &[2024]);
        let [baseline, optimistic, pessimistic] = [0, 1, 2].map(|i| negative.rows[i].value);
        assert!(optimistic <= baseline && baseline <= pessimistic);
    }

    #[test]
    fn test_rows_ordered_by_year_then_scenario() {
        let trend = trend(&[(2021, 46.2), (2022, 48.7)]);
        let output = ScenarioForecaster::new().forecast(
            &trend,
            &contribution(Direction::Positive, 1.0),
            &[2025, 2026],
        );

        let keys: Vec<(i32, Scenario)> = output.rows.iter().map(|r| (r.year, r.scenario)).collect();
        assert_eq!(
            keys,
            vec![
                (2025, Scenario::Baseline),
                (2025, Scenario::Optimistic),
                (2025, Scenario::Pessimistic),
                (2026, Scenario::Baseline),
                (2026, Scenario::Optimistic),
                (2026, Scenario::Pessimistic),
            ]
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_multipliers() {
        let multipliers = ScenarioMultipliers::default();
        assert_eq!(multipliers.get(Scenario::Baseline), 1.0);
        assert_eq!(multipliers.get(Scenario::Optimistic), 1.2);
        assert_eq!(multipliers.get(Scenario::Pessimistic), 0.8);
    }
}
