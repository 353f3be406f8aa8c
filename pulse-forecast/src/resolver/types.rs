//! Impact link types
//!
//! Raw links as supplied by the ingestion collaborator, resolved impact
//! tuples, and the resolution report that enumerates every rejected link.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Confidence, Direction, EventType, Metadata, Pillar, RecordId};

/// Raw causal assertion from one event to one observation's indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLink {
    pub source_event_id: RecordId,
    pub target_observation_id: RecordId,
    pub direction: Direction,
    /// Percentage points, must be >= 0
    pub magnitude: f64,
    #[serde(default)]
    pub lag_months: u32,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl ImpactLink {
    pub fn new(
        source_event_id: impl Into<RecordId>,
        target_observation_id: impl Into<RecordId>,
        direction: Direction,
        magnitude: f64,
        lag_months: u32,
        confidence: Confidence,
    ) -> Self {
        Self {
            source_event_id: source_event_id.into(),
            target_observation_id: target_observation_id.into(),
            direction,
            magnitude,
            lag_months,
            confidence,
            metadata: Metadata::new(),
        }
    }
}

/// A link whose references both resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedImpact {
    pub event_id: RecordId,
    pub event_name: String,
    pub event_year: i32,
    pub event_type: EventType,
    pub observation_id: RecordId,
    pub indicator: Pillar,
    pub direction: Direction,
    pub magnitude: f64,
    pub lag_months: u32,
    pub confidence: Confidence,
}

impl ResolvedImpact {
    /// Direction applied to magnitude.
    pub fn signed_magnitude(&self) -> f64 {
        self.direction.sign() * self.magnitude
    }

    /// First calendar year in which the impact counts: `event_year + ceil(lag / 12)`.
    pub fn effective_start_year(&self) -> i32 {
        self.event_year + self.lag_months.div_ceil(12) as i32
    }
}

/// Why a link could not be resolved.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LinkError {
    #[error("unknown source event {0}")]
    UnknownEvent(RecordId),

    #[error("unknown target observation {0}")]
    UnknownObservation(RecordId),

    #[error("magnitude {0} is not a finite non-negative number")]
    InvalidMagnitude(f64),
}

/// A rejected link with every reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedLink {
    /// Position of the link in the input table
    pub index: usize,
    pub link: ImpactLink,
    pub errors: Vec<LinkError>,
}

/// Outcome of resolving a table of impact links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Ordered by (indicator, event_year, event_name)
    pub resolved: Vec<ResolvedImpact>,
    /// Ordered by input position
    pub rejected: Vec<RejectedLink>,
}

impl ResolutionReport {
    /// True when no link was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Total number of links considered.
    pub fn total_links(&self) -> usize {
        self.resolved.len() + self.rejected.len()
    }

    /// Resolved impacts on one indicator, in resolved order.
    pub fn impacts_for(&self, indicator: Pillar) -> Vec<&ResolvedImpact> {
        self.resolved
            .iter()
            .filter(|i| i.indicator == indicator)
            .collect()
    }

    /// Resolved impacts originating from one event.
    pub fn impacts_for_event(&self, event_id: &RecordId) -> Vec<&ResolvedImpact> {
        self.resolved
            .iter()
            .filter(|i| &i.event_id == event_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impact(direction: Direction, magnitude: f64, lag_months: u32) -> ResolvedImpact {
        ResolvedImpact {
            event_id: RecordId::from("EVT_1"),
            event_name: "Telebirr Launch".into(),
            event_year: 2021,
            event_type: EventType::Market,
            observation_id: RecordId::from("OBS_1"),
            indicator: Pillar::Access,
            direction,
            magnitude,
            lag_months,
            confidence: Confidence::High,
        }
    }

    #[test]
    fn test_effective_start_year_rounds_lag_up() {
        assert_eq!(impact(Direction::Positive, 1.0, 0).effective_start_year(), 2021);
        assert_eq!(impact(Direction::Positive, 1.0, 1).effective_start_year(), 2022);
        assert_eq!(impact(Direction::Positive, 1.0, 12).effective_start_year(), 2022);
        assert_eq!(impact(Direction::Positive, 1.0, 13).effective_start_year(), 2023);
        assert_eq!(impact(Direction::Positive, 1.0, 24).effective_start_year(), 2023);
    }

    #[test]
    fn test_signed_magnitude() {
        assert_eq!(impact(Direction::Positive, 4.2, 0).signed_magnitude(), 4.2);
        assert_eq!(impact(Direction::Negative, 4.2, 0).signed_magnitude(), -4.2);
        assert_eq!(impact(Direction::Neutral, 4.2, 0).signed_magnitude(), 0.0);
    }

    #[test]
    fn test_link_defaults_lag_to_zero() {
        let json = r#"{
            "source_event_id": "EVT_1",
            "target_observation_id": "OBS_1",
            "direction": "positive",
            "magnitude": 4.2,
            "confidence": "medium"
        }"#;
        let link: ImpactLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.lag_months, 0);
        assert_eq!(link.direction, Direction::Positive);
    }

    #[test]
    fn test_link_error_display() {
        let err = LinkError::UnknownObservation(RecordId::from("OBS_404"));
        assert_eq!(err.to_string(), "unknown target observation OBS_404");
    }
}
