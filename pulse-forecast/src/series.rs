//! Indicator series store
//!
//! In-memory typed representation of time-stamped indicator observations,
//! grouped by pillar. Duplicate observations for the same (pillar, year) are
//! all retained; exactly one of them is authoritative for trend fitting.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{Confidence, Metadata, Pillar, RecordId};

/// First year of the observed data domain.
pub const DATA_YEAR_MIN: i32 = 2011;
/// Last year of the observed data domain.
pub const DATA_YEAR_MAX: i32 = 2027;

/// A single indicator observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub record_id: RecordId,
    pub pillar: Pillar,
    pub year: i32,
    /// Percentage value (0-100)
    pub value: f64,
    pub source: String,
    pub confidence: Confidence,
    /// Publication or collection date, used only to break duplicate ties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Observation {
    /// Create an observation with no date and no metadata.
    pub fn new(
        record_id: impl Into<RecordId>,
        pillar: Pillar,
        year: i32,
        value: f64,
        source: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            pillar,
            year,
            value,
            source: source.into(),
            confidence,
            observed_on: None,
            metadata: Metadata::new(),
        }
    }

    /// Set the observation date.
    #[must_use]
    pub fn observed_on(mut self, date: NaiveDate) -> Self {
        self.observed_on = Some(date);
        self
    }

    /// Whether the value is a finite percentage in `[0, 100]`.
    pub fn has_valid_value(&self) -> bool {
        self.value.is_finite() && (0.0..=100.0).contains(&self.value)
    }

    fn precedence(&self) -> (Confidence, Option<NaiveDate>) {
        (self.confidence, self.observed_on)
    }
}

/// Typed store of observations keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeriesStore {
    observations: Vec<Observation>,
    index: HashMap<RecordId, usize>,
}

impl IndicatorSeriesStore {
    /// Build a store, rejecting duplicate ids.
    ///
    /// Observations with a value outside `[0, 100]` are kept for lookup but
    /// never enter a series; see [`IndicatorSeriesStore::invalid`].
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let mut index = HashMap::with_capacity(observations.len());

        for (position, obs) in observations.iter().enumerate() {
            if !obs.has_valid_value() {
                warn!(
                    record_id = %obs.record_id,
                    pillar = %obs.pillar,
                    value = obs.value,
                    "Observation value outside [0, 100]"
                );
            }
            if index.insert(obs.record_id.clone(), position).is_some() {
                return Err(Error::InvalidRecord(format!(
                    "duplicate observation record_id {}",
                    obs.record_id
                )));
            }
            if !(DATA_YEAR_MIN..=DATA_YEAR_MAX).contains(&obs.year) {
                warn!(
                    record_id = %obs.record_id,
                    year = obs.year,
                    "Observation year outside the {DATA_YEAR_MIN}-{DATA_YEAR_MAX} data domain"
                );
            }
        }

        Ok(Self {
            observations,
            index,
        })
    }

    pub fn get(&self, id: &RecordId) -> Option<&Observation> {
        self.index.get(id).map(|&i| &self.observations[i])
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Pillars that have at least one observation, in pillar order.
    pub fn pillars(&self) -> BTreeSet<Pillar> {
        self.observations.iter().map(|o| o.pillar).collect()
    }

    /// All observations for a pillar, in input order.
    pub fn by_pillar(&self, pillar: Pillar) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| o.pillar == pillar)
            .collect()
    }

    /// Observations of a pillar whose value is outside `[0, 100]`.
    pub fn invalid(&self, pillar: Pillar) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| o.pillar == pillar && !o.has_valid_value())
            .collect()
    }

    /// One authoritative observation per year for a pillar, ordered by year.
    ///
    /// Among duplicates the higher confidence wins, then the later
    /// `observed_on` date, then the later record in input order. Invalid
    /// values are skipped.
    pub fn authoritative(&self, pillar: Pillar) -> Vec<&Observation> {
        let mut by_year: BTreeMap<i32, &Observation> = BTreeMap::new();
        for obs in self
            .observations
            .iter()
            .filter(|o| o.pillar == pillar && o.has_valid_value())
        {
            match by_year.get(&obs.year) {
                Some(current) if obs.precedence() < current.precedence() => {}
                _ => {
                    by_year.insert(obs.year, obs);
                }
            }
        }
        by_year.into_values().collect()
    }

    /// Authoritative `(year, value)` pairs for a pillar, ordered by year.
    pub fn authoritative_series(&self, pillar: Pillar) -> Vec<(i32, f64)> {
        self.authoritative(pillar)
            .into_iter()
            .map(|o| (o.year, o.value))
            .collect()
    }

    /// Number of distinct observed years for a pillar.
    pub fn distinct_years(&self, pillar: Pillar) -> usize {
        self.authoritative(pillar).len()
    }
}
