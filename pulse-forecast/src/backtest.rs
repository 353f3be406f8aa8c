//! Backtesting against held-out observations
//!
//! The dataset is cut at a year: observations and events from the cutoff
//! onward are removed, links that would reach past the cutoff are dropped,
//! and the remaining history is forecast over the years that were actually
//! observed. Nothing dated at or after the cutoff influences a projection.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::engine::{ForecastEngine, IndicatorFailure, TrendSummary};
use crate::error::Result;
use crate::forecast::{BoundsViolation, Scenario};
use crate::resolver::{ImpactLink, ResolutionReport};
use crate::types::{Pillar, RecordId, RunId};

/// Projected baseline against the observed value for one indicator-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub indicator: Pillar,
    pub year: i32,
    pub projected: f64,
    pub low_bound: f64,
    pub high_bound: f64,
    pub actual: f64,
    /// `projected - actual`
    pub error: f64,
    pub within_bounds: bool,
}

/// Accuracy summary for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAccuracy {
    pub indicator: Pillar,
    pub points: usize,
    pub mean_absolute_error: f64,
    /// Mean signed error; positive means the forecast ran high
    pub bias: f64,
    pub within_bounds: usize,
}

/// Result of a backtest at one cutoff year.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub run_id: RunId,
    pub cutoff: i32,
    /// Exactly what the projections were computed from
    pub truncated: Dataset,
    pub links_excluded_by_cutoff: usize,
    pub resolution: ResolutionReport,
    pub trends: Vec<TrendSummary>,
    pub rows: Vec<BacktestRow>,
    pub accuracy: Vec<IndicatorAccuracy>,
    pub failures: Vec<IndicatorFailure>,
    pub warnings: Vec<BoundsViolation>,
}

/// Restrict `dataset` to records dated before `cutoff`.
///
/// Returns the truncated dataset and how many links were dropped because
/// their event or target observation is dated at or after the cutoff.
/// Links whose references are unknown in the full dataset are kept so that
/// resolution still reports them.
pub fn truncate_dataset(dataset: &Dataset, cutoff: i32) -> (Dataset, usize) {
    let late: HashSet<&RecordId> = dataset
        .observations
        .iter()
        .filter(|o| o.year >= cutoff)
        .map(|o| &o.record_id)
        .chain(
            dataset
                .events
                .iter()
                .filter(|e| e.year >= cutoff)
                .map(|e| &e.record_id),
        )
        .collect();

    let (impact_links, excluded): (Vec<ImpactLink>, Vec<ImpactLink>) =
        dataset.impact_links.iter().cloned().partition(|link| {
            !late.contains(&link.source_event_id) && !late.contains(&link.target_observation_id)
        });

    let truncated = Dataset {
        observations: dataset
            .observations
            .iter()
            .filter(|o| o.year < cutoff)
            .cloned()
            .collect(),
        events: dataset
            .events
            .iter()
            .filter(|e| e.year < cutoff)
            .cloned()
            .collect(),
        impact_links,
    };
    (truncated, excluded.len())
}

impl ForecastEngine {
    /// Forecast from history before `cutoff` and compare against every
    /// authoritative observation at or after it.
    pub fn backtest(&self, dataset: &Dataset, cutoff: i32) -> Result<BacktestReport> {
        let (full_observations, _) = dataset.stores()?;
        let (truncated, links_excluded_by_cutoff) = truncate_dataset(dataset, cutoff);
        let (observations, events) = truncated.stores()?;
        let run_id = RunId::new();

        info!(
            run_id = %run_id,
            cutoff,
            kept_observations = observations.len(),
            kept_events = events.len(),
            links_excluded_by_cutoff,
            "Starting backtest"
        );

        let actuals: BTreeMap<Pillar, Vec<(i32, f64)>> = full_observations
            .pillars()
            .into_iter()
            .map(|pillar| {
                let held_out = full_observations
                    .authoritative_series(pillar)
                    .into_iter()
                    .filter(|&(year, _)| year >= cutoff)
                    .collect();
                (pillar, held_out)
            })
            .collect();

        let (resolution, contributions) =
            self.attribute(&events, &observations, &truncated.impact_links);
        let projection = self.project(&observations, &contributions, |pillar| {
            actuals
                .get(&pillar)
                .map(|points| points.iter().map(|&(year, _)| year).collect())
                .unwrap_or_default()
        });

        let mut rows = Vec::new();
        for forecast in projection
            .rows
            .iter()
            .filter(|r| r.scenario == Scenario::Baseline)
        {
            let Some(&(_, actual)) = actuals
                .get(&forecast.indicator)
                .and_then(|points| points.iter().find(|&&(year, _)| year == forecast.year))
            else {
                continue;
            };
            rows.push(BacktestRow {
                indicator: forecast.indicator,
                year: forecast.year,
                projected: forecast.value,
                low_bound: forecast.low_bound,
                high_bound: forecast.high_bound,
                actual,
                error: forecast.value - actual,
                within_bounds: forecast.low_bound <= actual && actual <= forecast.high_bound,
            });
        }

        let accuracy = summarize(&rows);
        for entry in &accuracy {
            info!(
                indicator = %entry.indicator,
                points = entry.points,
                mae = entry.mean_absolute_error,
                bias = entry.bias,
                "Backtest accuracy"
            );
        }

        Ok(BacktestReport {
            run_id,
            cutoff,
            truncated,
            links_excluded_by_cutoff,
            resolution,
            trends: projection.trends,
            rows,
            accuracy,
            failures: projection.failures,
            warnings: projection.warnings,
        })
    }
}

fn summarize(rows: &[BacktestRow]) -> Vec<IndicatorAccuracy> {
    let mut grouped: BTreeMap<Pillar, Vec<&BacktestRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.indicator).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(indicator, rows)| {
            let n = rows.len() as f64;
            IndicatorAccuracy {
                indicator,
                points: rows.len(),
                mean_absolute_error: rows.iter().map(|r| r.error.abs()).sum::<f64>() / n,
                bias: rows.iter().map(|r| r.error).sum::<f64>() / n,
                within_bounds: rows.iter().filter(|r| r.within_bounds).count(),
            }
        })
        .collect()
}
