//! Dataset bundle and composition summary
//!
//! The three input tables as handed over by the ingestion collaborator, plus
//! a breakdown of what they contain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Event, EventCatalog};
use crate::error::Result;
use crate::resolver::ImpactLink;
use crate::series::{IndicatorSeriesStore, Observation};
use crate::types::{Confidence, Pillar};

/// Observations, events, and impact links for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub impact_links: Vec<ImpactLink>,
}

/// Inclusive range of years covered by dated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Record counts broken down by type, pillar, source, and confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetComposition {
    pub total_records: usize,
    pub by_record_type: BTreeMap<String, usize>,
    /// Observations only; events are pillar-agnostic
    pub by_pillar: BTreeMap<Pillar, usize>,
    /// Observations and events
    pub by_source: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<Confidence, usize>,
    /// Observations and events; `None` when neither exists
    pub year_range: Option<YearRange>,
}

impl Dataset {
    /// Parse a dataset from its JSON representation.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty() && self.events.is_empty() && self.impact_links.is_empty()
    }

    /// Build the validated observation store and event catalog.
    pub fn stores(&self) -> Result<(IndicatorSeriesStore, EventCatalog)> {
        let observations = IndicatorSeriesStore::new(self.observations.clone())?;
        let events = EventCatalog::new(self.events.clone())?;
        Ok((observations, events))
    }

    /// Count records by type, pillar, source, confidence, and year span.
    pub fn composition(&self) -> DatasetComposition {
        let mut composition = DatasetComposition {
            total_records: self.observations.len() + self.events.len() + self.impact_links.len(),
            ..DatasetComposition::default()
        };

        for (record_type, count) in [
            ("observation", self.observations.len()),
            ("event", self.events.len()),
            ("impact_link", self.impact_links.len()),
        ] {
            if count > 0 {
                composition
                    .by_record_type
                    .insert(record_type.to_string(), count);
            }
        }

        let mut years = Vec::with_capacity(self.observations.len() + self.events.len());
        for obs in &self.observations {
            *composition.by_pillar.entry(obs.pillar).or_insert(0) += 1;
            *composition.by_source.entry(obs.source.clone()).or_insert(0) += 1;
            *composition.by_confidence.entry(obs.confidence).or_insert(0) += 1;
            years.push(obs.year);
        }
        for event in &self.events {
            *composition.by_source.entry(event.source.clone()).or_insert(0) += 1;
            *composition.by_confidence.entry(event.confidence).or_insert(0) += 1;
            years.push(event.year);
        }
        for link in &self.impact_links {
            *composition.by_confidence.entry(link.confidence).or_insert(0) += 1;
        }

        composition.year_range = match (years.iter().min(), years.iter().max()) {
            (Some(&min), Some(&max)) => Some(YearRange { min, max }),
            _ => None,
        };

        composition
    }
}
