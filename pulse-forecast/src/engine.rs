//! Forecast engine
//!
//! Runs the whole pipeline for one dataset: link resolution, association
//! matrix, contribution functions, then trend fitting and scenario
//! forecasting per indicator. An indicator with out-of-range observations or
//! too little history is reported as a failure and skipped; the others still
//! produce rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::EventCatalog;
use crate::config::ForecastConfig;
use crate::contribution::{ContributionBuilder, ContributionFunction, ContributionSet};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::forecast::{BoundsViolation, ForecastRow, ScenarioForecaster};
use crate::resolver::{AssociationMatrix, ImpactLink, ResolutionReport, resolve_links};
use crate::series::IndicatorSeriesStore;
use crate::trend::{DampedGrowthModel, FittedTrend, TrendModel};
use crate::types::{Pillar, RunId};

/// Fitted trend parameters for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub indicator: Pillar,
    pub anchor_year: i32,
    pub anchor_value: f64,
    pub annual_growth: f64,
    pub observed_years: usize,
}

impl From<&FittedTrend> for TrendSummary {
    fn from(trend: &FittedTrend) -> Self {
        Self {
            indicator: trend.indicator,
            anchor_year: trend.anchor_year,
            anchor_value: trend.anchor_value,
            annual_growth: trend.annual_growth,
            observed_years: trend.observed_years,
        }
    }
}

/// An indicator that produced no forecast, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFailure {
    pub indicator: Pillar,
    pub reason: String,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub resolution: ResolutionReport,
    pub matrix: AssociationMatrix,
    pub contributions: ContributionSet,
    /// Ordered by indicator, year, then scenario
    pub rows: Vec<ForecastRow>,
    pub trends: Vec<TrendSummary>,
    pub failures: Vec<IndicatorFailure>,
    pub warnings: Vec<BoundsViolation>,
}

impl RunReport {
    /// Rows for one indicator, in output order.
    pub fn rows_for(&self, indicator: Pillar) -> impl Iterator<Item = &ForecastRow> + '_ {
        self.rows.iter().filter(move |row| row.indicator == indicator)
    }
}

/// Per-indicator projection output shared by forecast runs and backtests.
#[derive(Debug, Default)]
pub(crate) struct Projection {
    pub rows: Vec<ForecastRow>,
    pub trends: Vec<TrendSummary>,
    pub failures: Vec<IndicatorFailure>,
    pub warnings: Vec<BoundsViolation>,
}

/// Attribution and forecasting pipeline over validated configuration.
pub struct ForecastEngine {
    config: ForecastConfig,
    trend_model: Box<dyn TrendModel>,
    forecaster: ScenarioForecaster,
}

impl ForecastEngine {
    /// Create an engine, rejecting invalid configuration before any computation.
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let trend_model = Box::new(DampedGrowthModel::with_config(config.trend.clone()));
        let forecaster = ScenarioForecaster::with_settings(
            config.scenario_multipliers.clone(),
            config.uncertainty_fraction,
            config.bounds.clone(),
        );
        Ok(Self {
            config,
            trend_model,
            forecaster,
        })
    }

    /// Replace the trend model.
    pub fn with_trend_model(mut self, model: impl TrendModel + 'static) -> Self {
        self.trend_model = Box::new(model);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Run the full pipeline over `dataset`.
    pub fn run(&self, dataset: &Dataset) -> Result<RunReport> {
        let (observations, events) = dataset.stores()?;
        let run_id = RunId::new();

        info!(
            run_id = %run_id,
            observations = observations.len(),
            events = events.len(),
            links = dataset.impact_links.len(),
            horizon = ?self.config.forecast_horizon,
            "Starting forecast run"
        );

        let (resolution, contributions) =
            self.attribute(&events, &observations, &dataset.impact_links);
        let matrix = AssociationMatrix::from_impacts(&resolution.resolved);

        let horizon = &self.config.forecast_horizon;
        let projection = self.project(&observations, &contributions, |_| horizon.clone());

        info!(
            run_id = %run_id,
            rows = projection.rows.len(),
            failures = projection.failures.len(),
            warnings = projection.warnings.len(),
            "Forecast run complete"
        );

        Ok(RunReport {
            run_id,
            generated_at: Utc::now(),
            resolution,
            matrix,
            contributions,
            rows: projection.rows,
            trends: projection.trends,
            failures: projection.failures,
            warnings: projection.warnings,
        })
    }

    /// Resolve links and build contribution functions from the resolved tuples.
    pub(crate) fn attribute(
        &self,
        events: &EventCatalog,
        observations: &IndicatorSeriesStore,
        links: &[ImpactLink],
    ) -> (ResolutionReport, ContributionSet) {
        let resolution = resolve_links(events, observations, links);
        let contributions =
            ContributionBuilder::with_profile(self.config.activation).build(&resolution.resolved);
        (resolution, contributions)
    }

    /// Fit and forecast every indicator present in `observations`.
    ///
    /// `horizon_for` supplies the years to forecast per indicator. Indicators
    /// with an empty horizon still get a fitted trend but no rows.
    pub(crate) fn project<F>(
        &self,
        observations: &IndicatorSeriesStore,
        contributions: &ContributionSet,
        horizon_for: F,
    ) -> Projection
    where
        F: Fn(Pillar) -> Vec<i32>,
    {
        let mut projection = Projection::default();

        for indicator in observations.pillars() {
            let invalid = observations.invalid(indicator);
            if !invalid.is_empty() {
                let reason = invalid
                    .iter()
                    .map(|o| {
                        format!(
                            "observation {} has value {} outside [0, 100]",
                            o.record_id, o.value
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(indicator = %indicator, %reason, "Skipping indicator");
                projection.failures.push(IndicatorFailure { indicator, reason });
                continue;
            }

            let series = observations.authoritative_series(indicator);
            let trend = match self.trend_model.fit(indicator, &series) {
                Ok(trend) => trend,
                Err(e) => {
                    warn!(indicator = %indicator, error = %e, "Skipping indicator");
                    projection.failures.push(IndicatorFailure {
                        indicator,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let empty;
            let contribution = match contributions.get(indicator) {
                Some(function) => function,
                None => {
                    empty = ContributionFunction::empty(indicator, self.config.activation);
                    &empty
                }
            };

            let output = self
                .forecaster
                .forecast(&trend, contribution, &horizon_for(indicator));
            projection.trends.push(TrendSummary::from(&trend));
            projection.rows.extend(output.rows);
            projection.warnings.extend(output.warnings);
        }

        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Event;
    use crate::error::Error;
    use crate::forecast::Scenario;
    use crate::series::Observation;
    use crate::types::{Confidence, Direction, EventType, RecordId};

    fn dataset() -> Dataset {
        Dataset {
            observations: vec![
                Observation::new("OBS_1", Pillar::Access, 2021, 46.2, "Findex", Confidence::High),
                Observation::new("OBS_2", Pillar::Access, 2024, 49.0, "Findex", Confidence::High),
                Observation::new("OBS_3", Pillar::Usage, 2024, 21.0, "NBE", Confidence::Medium),
            ],
            events: vec![Event::new(
                "EVT_1",
                "Telebirr Launch",
                2021,
                EventType::Market,
                "Ethio Telecom",
                Confidence::High,
            )],
            impact_links: vec![ImpactLink::new(
                "EVT_1",
                "OBS_1",
                Direction::Positive,
                4.2,
                0,
                Confidence::Medium,
            )],
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = ForecastConfig {
            forecast_horizon: vec![],
            ..ForecastConfig::default()
        };
        assert!(matches!(
            ForecastEngine::new(config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_single_year_indicator_fails_alone() {
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let report = engine.run(&dataset()).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].indicator, Pillar::Usage);
        assert!(report.failures[0].reason.contains("usage"));

        // Access still forecasts every horizon year and scenario
        assert_eq!(report.rows_for(Pillar::Access).count(), 9);
        assert_eq!(report.rows_for(Pillar::Usage).count(), 0);
        assert_eq!(report.trends.len(), 1);
    }

    #[test]
    fn test_baseline_includes_contribution() {
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let report = engine.run(&dataset()).unwrap();

        let trend = DampedGrowthModel::new()
            .fit(Pillar::Access, &[(2021, 46.2), (2024, 49.0)])
            .unwrap();
        let baseline = report
            .rows_for(Pillar::Access)
            .find(|r| r.year == 2025 && r.scenario == Scenario::Baseline)
            .unwrap();
        assert!((baseline.value - (trend.value(2025) + 4.2)).abs() < 1e-9);
    }

    #[test]
    fn test_indicator_without_links_uses_zero_contribution() {
        let mut dataset = dataset();
        dataset.impact_links.clear();
        dataset.observations.push(Observation::new(
            "OBS_4",
            Pillar::Usage,
            2022,
            18.0,
            "NBE",
            Confidence::Medium,
        ));
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let report = engine.run(&dataset).unwrap();

        assert!(report.failures.is_empty());
        for row in &report.rows {
            assert!((row.low_bound - row.value).abs() < 1e-9);
            assert!((row.high_bound - row.value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_range_value_fails_only_its_indicator() {
        let mut dataset = dataset();
        dataset.observations.push(Observation::new(
            "OBS_4",
            Pillar::Usage,
            2023,
            104.0,
            "NBE",
            Confidence::Medium,
        ));
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let report = engine.run(&dataset).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].indicator, Pillar::Usage);
        assert!(report.failures[0].reason.contains("OBS_4"));
        assert!(report.failures[0].reason.contains("104"));
        assert_eq!(report.rows_for(Pillar::Access).count(), 9);
        assert_eq!(report.rows_for(Pillar::Usage).count(), 0);
    }

    #[test]
    fn test_negative_event_lowers_saturating_forecast() {
        let mut dataset = dataset();
        dataset.observations = vec![
            Observation::new("OBS_1", Pillar::Access, 2021, 10.0, "Findex", Confidence::High),
            Observation::new("OBS_2", Pillar::Access, 2022, 95.0, "Findex", Confidence::High),
        ];
        dataset.impact_links = vec![ImpactLink::new(
            "EVT_1",
            "OBS_1",
            Direction::Negative,
            10.0,
            0,
            Confidence::Medium,
        )];
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let report = engine.run(&dataset).unwrap();

        let baselines: Vec<&ForecastRow> = report
            .rows_for(Pillar::Access)
            .filter(|r| r.scenario == Scenario::Baseline)
            .collect();
        assert_eq!(baselines.len(), 3);
        for row in baselines {
            assert!(row.value <= 90.0, "{}: {}", row.year, row.value);
            assert!(row.value >= 85.0, "{}: {}", row.year, row.value);
        }
    }

    #[test]
    fn test_duplicate_record_ids_fail_the_run() {
        let mut dataset = dataset();
        dataset.observations[1].record_id = RecordId::from("OBS_1");
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        assert!(matches!(engine.run(&dataset), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_custom_trend_model() {
        struct Flat;
        impl TrendModel for Flat {
            fn fit(&self, indicator: Pillar, series: &[(i32, f64)]) -> Result<FittedTrend> {
                let flat: Vec<(i32, f64)> = series.iter().map(|&(y, _)| (y, 10.0)).collect();
                DampedGrowthModel::new().fit(indicator, &flat)
            }
        }

        let engine = ForecastEngine::new(ForecastConfig::default())
            .unwrap()
            .with_trend_model(Flat);
        let report = engine.run(&dataset()).unwrap();
        let baseline = report
            .rows_for(Pillar::Access)
            .find(|r| r.scenario == Scenario::Baseline)
            .unwrap();
        assert!((baseline.value - 14.2).abs() < 1e-9);
    }
}
