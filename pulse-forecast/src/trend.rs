//! Trend model
//!
//! Fits a baseline growth trajectory to an indicator's authoritative history
//! and extrapolates it past the last observed year.
//!
//! Growth is the (optionally recency-weighted) mean of annualized compound
//! rates between adjacent observations. Projection follows
//! `dv/dt = r * v * d(v)` with `r = ln(1 + g)` and a saturation damping
//! `d(v) = ((A - v) / (A - v0))^p` anchored at the last observed value `v0`.
//! Since `d(v0) = 1`, the projected value and slope match undamped compounding
//! at the boundary; `d` then falls monotonically to 0 at the asymptote `A`.
//! A growing projection never exceeds `A`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Pillar;

/// How adjacent-period growth rates are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthWeighting {
    /// Simple mean across the observed window
    #[default]
    Uniform,
    /// Linearly increasing weight toward the most recent period
    Recency,
}

/// Configuration for trend fitting and extrapolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Upper asymptote of the indicator (default: 100.0)
    pub asymptote: f64,
    /// Exponent `p` of the damping factor (default: 1.0, logistic)
    pub damping_exponent: f64,
    /// Averaging of period growth rates (default: uniform)
    pub weighting: GrowthWeighting,
    /// RK4 steps per projected year when `damping_exponent != 1` (default: 12)
    pub steps_per_year: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            asymptote: 100.0,
            damping_exponent: 1.0,
            weighting: GrowthWeighting::Uniform,
            steps_per_year: 12,
        }
    }
}

/// Trait for fitting baseline trajectories to observed history
pub trait TrendModel: Send + Sync {
    /// Fit a trend to `(year, value)` pairs for one indicator.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] when fewer than two distinct years
    /// are available.
    fn fit(&self, indicator: Pillar, series: &[(i32, f64)]) -> Result<FittedTrend>;
}

/// A fitted baseline trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTrend {
    pub indicator: Pillar,
    /// Last observed year; projection starts here
    pub anchor_year: i32,
    pub anchor_value: f64,
    /// Mean annual compound growth `g`
    pub annual_growth: f64,
    /// Continuous rate `r = ln(1 + g)`
    pub continuous_rate: f64,
    pub observed_years: usize,
    history: Vec<(i32, f64)>,
    config: TrendConfig,
}

impl FittedTrend {
    /// Trend value for `year`.
    ///
    /// Up to the anchor year this is the latest observation at or before
    /// `year` (the first observation for earlier years). Beyond it the damped
    /// growth equation is integrated forward from the anchor.
    pub fn value(&self, year: i32) -> f64 {
        if year <= self.anchor_year {
            return self
                .history
                .iter()
                .rev()
                .find(|(y, _)| *y <= year)
                .or_else(|| self.history.first())
                .map(|&(_, v)| v)
                .unwrap_or(self.anchor_value);
        }
        self.integrate((year - self.anchor_year) as f64)
    }

    /// Saturation damping at projected value `v`, 1.0 at the anchor value.
    pub fn damping_factor(&self, value: f64) -> f64 {
        if self.continuous_rate <= 0.0 {
            return 1.0;
        }
        let headroom = self.config.asymptote - self.anchor_value;
        if headroom <= 0.0 {
            return 0.0;
        }
        ((self.config.asymptote - value) / headroom)
            .max(0.0)
            .powf(self.config.damping_exponent)
    }

    /// Instantaneous slope `dv/dt` at projected value `v`.
    pub fn slope(&self, value: f64) -> f64 {
        self.continuous_rate * value * self.damping_factor(value)
    }

    /// Upper limit of the projection, `None` when the trend does not grow.
    fn ceiling(&self) -> Option<f64> {
        (self.continuous_rate > 0.0).then_some(self.config.asymptote.max(self.anchor_value))
    }

    /// Projected value `years` after the anchor.
    ///
    /// With `p = 1` the equation is the logistic and is solved exactly.
    /// Otherwise it is integrated with RK4, halving any step that would
    /// cross the asymptote.
    fn integrate(&self, years: f64) -> f64 {
        let v0 = self.anchor_value;
        let Some(ceiling) = self.ceiling() else {
            return self.integrate_rk4(years);
        };
        if v0 <= 0.0 || v0 >= ceiling {
            return v0;
        }

        if self.config.damping_exponent == 1.0 {
            let a = self.config.asymptote;
            let k = self.continuous_rate * a / (a - v0);
            return (a / (1.0 + (a - v0) / v0 * (-k * years).exp())).min(ceiling);
        }
        self.integrate_rk4(years)
    }

    fn integrate_rk4(&self, years: f64) -> f64 {
        let steps = (years * self.config.steps_per_year.max(1) as f64).round().max(1.0) as u64;
        let h = years / steps as f64;
        let mut v = self.anchor_value;
        for _ in 0..steps {
            v = self.advance(v, h, MAX_STEP_HALVINGS);
        }
        v
    }

    /// One RK4 step of size `h`, split in halves while it overshoots the ceiling.
    fn advance(&self, v: f64, h: f64, halvings: u32) -> f64 {
        let Some(ceiling) = self.ceiling() else {
            return self.rk4_step(v, h, f64::INFINITY);
        };
        let next = self.rk4_step(v, h, ceiling);
        if next <= ceiling || halvings == 0 {
            return next.min(ceiling);
        }
        let mid = self.advance(v, h / 2.0, halvings - 1);
        self.advance(mid, h / 2.0, halvings - 1)
    }

    fn rk4_step(&self, v: f64, h: f64, ceiling: f64) -> f64 {
        let stage = |x: f64| self.slope(x.min(ceiling));
        let k1 = stage(v);
        let k2 = stage(v + 0.5 * h * k1);
        let k3 = stage(v + 0.5 * h * k2);
        let k4 = stage(v + h * k3);
        v + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
    }
}

/// Deepest step subdivision before a projected value is pinned to the ceiling.
const MAX_STEP_HALVINGS: u32 = 12;

/// Compound growth with saturation damping toward an asymptote
pub struct DampedGrowthModel {
    config: TrendConfig,
}

impl DampedGrowthModel {
    /// Create a model with default configuration
    pub fn new() -> Self {
        Self {
            config: TrendConfig::default(),
        }
    }

    /// Create a model with custom configuration
    pub fn with_config(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Annualized compound growth between adjacent points.
    ///
    /// Pairs with a non-positive value have no defined ratio and are skipped.
    fn period_rates(series: &[(i32, f64)]) -> Vec<f64> {
        series
            .windows(2)
            .filter_map(|pair| {
                let (y1, v1) = pair[0];
                let (y2, v2) = pair[1];
                if v1 <= 0.0 || v2 <= 0.0 {
                    return None;
                }
                Some((v2 / v1).powf(1.0 / (y2 - y1) as f64) - 1.0)
            })
            .collect()
    }

    fn average(&self, rates: &[f64]) -> f64 {
        match self.config.weighting {
            GrowthWeighting::Uniform => rates.iter().sum::<f64>() / rates.len() as f64,
            GrowthWeighting::Recency => {
                let weights = (1..=rates.len()).map(|w| w as f64);
                let total: f64 = weights.clone().sum();
                rates.iter().zip(weights).map(|(r, w)| r * w).sum::<f64>() / total
            }
        }
    }
}

impl Default for DampedGrowthModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendModel for DampedGrowthModel {
    fn fit(&self, indicator: Pillar, series: &[(i32, f64)]) -> Result<FittedTrend> {
        let mut history = series.to_vec();
        history.sort_by_key(|&(year, _)| year);
        // Keep the last value for any repeated year
        history.reverse();
        history.dedup_by_key(|&mut (year, _)| year);
        history.reverse();

        if history.len() < 2 {
            return Err(Error::InsufficientData {
                indicator,
                distinct_years: history.len(),
            });
        }

        let rates = Self::period_rates(&history);
        let annual_growth = if rates.is_empty() {
            warn!(
                indicator = %indicator,
                "No adjacent observations with positive values, projecting flat"
            );
            0.0
        } else {
            self.average(&rates)
        };

        let (anchor_year, anchor_value) = history[history.len() - 1];
        let continuous_rate = (1.0 + annual_growth).ln();

        debug!(
            indicator = %indicator,
            anchor_year,
            anchor_value,
            annual_growth,
            periods = rates.len(),
            "Fitted trend"
        );

        Ok(FittedTrend {
            indicator,
            anchor_year,
            anchor_value,
            annual_growth,
            continuous_rate,
            observed_years: history.len(),
            history,
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(series: &[(i32, f64)]) -> FittedTrend {
        DampedGrowthModel::new().fit(Pillar::Access, series).unwrap()
    }

    #[test]
    fn test_requires_two_distinct_years() {
        let model = DampedGrowthModel::new();
        let err = model.fit(Pillar::Usage, &[(2021, 20.0)]).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                indicator: Pillar::Usage,
                distinct_years: 1
            }
        ));

        let err = model
            .fit(Pillar::Usage, &[(2021, 20.0), (2021, 22.0)])
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData { distinct_years: 1, .. }));

        assert!(model.fit(Pillar::Usage, &[]).is_err());
    }

    #[test]
    fn test_two_point_growth_rate() {
        let trend = fit(&[(2021, 46.2), (2022, 48.7)]);
        assert!((trend.annual_growth - (48.7 / 46.2 - 1.0)).abs() < 1e-12);
        assert_eq!(trend.anchor_year, 2022);
        assert_eq!(trend.anchor_value, 48.7);
    }

    #[test]
    fn test_gap_years_are_annualized() {
        // 22 -> 35 over three years
        let trend = fit(&[(2014, 22.0), (2017, 35.0)]);
        let expected = (35.0f64 / 22.0).powf(1.0 / 3.0) - 1.0;
        assert!((trend.annual_growth - expected).abs() < 1e-12);
    }

    #[test]
    fn test_recency_weighting_favors_latest_period() {
        let series = [(2014, 22.0), (2017, 35.0), (2021, 46.0), (2024, 49.0)];
        let uniform = fit(&series);
        let recency = DampedGrowthModel::with_config(TrendConfig {
            weighting: GrowthWeighting::Recency,
            ..TrendConfig::default()
        })
        .fit(Pillar::Access, &series)
        .unwrap();

        // Growth slowed over time, so leaning on recent periods lowers it
        assert!(recency.annual_growth < uniform.annual_growth);
    }

    #[test]
    fn test_history_is_returned_up_to_anchor() {
        let trend = fit(&[(2014, 22.0), (2017, 35.0), (2021, 46.0)]);
        assert_eq!(trend.value(2017), 35.0);
        assert_eq!(trend.value(2019), 35.0);
        assert_eq!(trend.value(2021), 46.0);
        assert_eq!(trend.value(2010), 22.0);
    }

    #[test]
    fn test_projection_matches_logistic_closed_form() {
        let trend = fit(&[(2021, 46.2), (2022, 48.7)]);
        let a = 100.0;
        let v0 = trend.anchor_value;
        let k = trend.continuous_rate * a / (a - v0);

        for years in 1..=5 {
            let t = years as f64;
            let expected = a / (1.0 + (a - v0) / v0 * (-k * t).exp());
            let projected = trend.value(2022 + years);
            assert!(
                (projected - expected).abs() < 1e-6,
                "year +{years}: {projected} vs {expected}"
            );
        }
    }

    #[test]
    fn test_projection_never_exceeds_asymptote() {
        let trend = fit(&[(2020, 60.0), (2021, 90.0)]);
        for year in 2022..2060 {
            let v = trend.value(year);
            assert!(v <= 100.0 + 1e-9, "{year}: {v}");
        }
        assert!(trend.value(2059) > trend.value(2022));
    }

    #[test]
    fn test_steep_history_stays_below_asymptote() {
        let quadratic = TrendConfig {
            damping_exponent: 2.0,
            ..TrendConfig::default()
        };
        for config in [TrendConfig::default(), quadratic] {
            let model = DampedGrowthModel::with_config(config);
            for series in [[(2021, 10.0), (2022, 95.0)], [(2021, 1.0), (2022, 99.0)]] {
                let trend = model.fit(Pillar::Access, &series).unwrap();
                let mut previous = trend.anchor_value;
                for year in 2023..=2040 {
                    let v = trend.value(year);
                    assert!(v <= 100.0, "{series:?} {year}: {v}");
                    assert!(v >= previous, "{series:?} {year}: {v} < {previous}");
                    previous = v;
                }
            }
        }
    }

    #[test]
    fn test_rk4_matches_logistic_when_exponent_is_one() {
        let trend = fit(&[(2021, 46.2), (2022, 48.7)]);
        for years in 1..=5 {
            let t = years as f64;
            let exact = trend.integrate(t);
            let numeric = trend.integrate_rk4(t);
            assert!((exact - numeric).abs() < 1e-6, "+{years}: {exact} vs {numeric}");
        }
    }

    #[test]
    fn test_damping_is_monotonic_and_one_at_anchor() {
        let trend = fit(&[(2021, 46.2), (2022, 48.7)]);
        assert!((trend.damping_factor(trend.anchor_value) - 1.0).abs() < 1e-12);

        let mut previous = f64::INFINITY;
        for step in 0..=100 {
            let v = trend.anchor_value + step as f64 * (100.0 - trend.anchor_value) / 100.0;
            let d = trend.damping_factor(v);
            assert!(d <= previous);
            previous = d;
        }
        assert_eq!(trend.damping_factor(100.0), 0.0);
    }

    #[test]
    fn test_slope_is_continuous_at_boundary() {
        let trend = fit(&[(2021, 46.2), (2022, 48.7)]);
        // Slope of undamped compounding at the anchor
        let undamped = trend.continuous_rate * trend.anchor_value;
        assert!((trend.slope(trend.anchor_value) - undamped).abs() < 1e-12);

        // First step of the projection moves at that slope
        let h = 1.0 / 12.0;
        let finite_difference = (trend.integrate(h) - trend.anchor_value) / h;
        assert!((finite_difference - undamped).abs() < 0.01);
    }

    #[test]
    fn test_declining_series_is_undamped() {
        let trend = fit(&[(2021, 40.0), (2022, 36.0)]);
        assert!(trend.annual_growth < 0.0);
        assert_eq!(trend.damping_factor(20.0), 1.0);
        let projected = trend.value(2023);
        assert!((projected - 36.0 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_saturated_anchor_projects_flat() {
        let trend = fit(&[(2021, 95.0), (2022, 100.0)]);
        assert_eq!(trend.value(2030), 100.0);
    }

    #[test]
    fn test_zero_values_project_flat() {
        let trend = fit(&[(2021, 0.0), (2022, 0.0)]);
        assert_eq!(trend.annual_growth, 0.0);
        assert_eq!(trend.value(2025), 0.0);
    }
}
