//! Event-impact attribution and scenario forecasting for pulse.
//!
//! This crate turns an observation series, an event catalog, and a set of
//! impact links into deterministic scenario forecasts for the tracked
//! financial-inclusion indicators.
//!
//! # Architecture
//!
//! - **Stores** ([`IndicatorSeriesStore`], [`EventCatalog`]) hold validated,
//!   read-only input records
//! - **Resolution** ([`resolve_links`]) joins impact links to their events and
//!   target indicators, isolating malformed links in a [`ResolutionReport`]
//! - **Contribution** ([`ContributionBuilder`]) turns resolved tuples into
//!   cumulative per-indicator step functions
//! - **Trend** ([`TrendModel`], [`DampedGrowthModel`]) fits the baseline
//!   trajectory from history alone
//! - **Forecast** ([`ScenarioForecaster`]) combines trend and contribution
//!   into clamped scenario values with uncertainty bounds
//!
//! [`ForecastEngine`] runs the pipeline end to end and can backtest it
//! against held-out years.

mod backtest;
mod catalog;
mod config;
mod contribution;
mod dataset;
mod engine;
mod error;
pub mod export;
mod forecast;
mod resolver;
mod series;
mod trend;
mod types;

// Error types
pub use error::{Error, Result};

// Vocabulary types
pub use types::{Confidence, Direction, EventType, Metadata, Pillar, RecordId, RunId};

// Input stores
pub use catalog::{Event, EventCatalog};
pub use dataset::{Dataset, DatasetComposition, YearRange};
pub use series::{DATA_YEAR_MAX, DATA_YEAR_MIN, IndicatorSeriesStore, Observation};

// Link resolution
pub use resolver::{
    AssociationMatrix, ImpactLink, LinkError, MatrixEvent, RejectedLink, ResolutionReport,
    ResolvedImpact, resolve_links,
};

// Contribution functions
pub use contribution::{
    Activation, ActivationProfile, ContributionBuilder, ContributionFunction, ContributionPoint,
    ContributionSet,
};

// Trend models
pub use trend::{DampedGrowthModel, FittedTrend, GrowthWeighting, TrendConfig, TrendModel};

// Scenario forecasting
pub use forecast::{
    BoundsViolation, BoundsWarningConfig, ForecastRow, IndicatorForecast, Scenario,
    ScenarioForecaster, ScenarioMultipliers, VALUE_MAX, VALUE_MIN,
};

// Configuration
pub use config::{DEFAULT_HORIZON, DEFAULT_UNCERTAINTY_FRACTION, ForecastConfig};

// Orchestration
pub use backtest::{BacktestReport, BacktestRow, IndicatorAccuracy, truncate_dataset};
pub use engine::{ForecastEngine, IndicatorFailure, RunReport, TrendSummary};
