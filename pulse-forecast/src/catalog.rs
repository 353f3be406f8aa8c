//! Event catalog
//!
//! Discrete historical events are pillar-agnostic: an event carries no
//! indicator association of its own. All causal semantics live in impact links.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Confidence, EventType, Metadata, RecordId};

/// A discrete historical event (policy action, market entry, rollout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub record_id: RecordId,
    pub name: String,
    pub year: i32,
    pub event_type: EventType,
    pub source: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Catches a pillar assignment in the input so it can be rejected
    #[serde(default, rename = "pillar", skip_serializing)]
    assigned_pillar: Option<serde_json::Value>,
}

impl Event {
    pub fn new(
        record_id: impl Into<RecordId>,
        name: impl Into<String>,
        year: i32,
        event_type: EventType,
        source: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            name: name.into(),
            year,
            event_type,
            source: source.into(),
            confidence,
            metadata: Metadata::new(),
            assigned_pillar: None,
        }
    }
}

/// Read-only catalog of events keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<Event>,
    index: HashMap<RecordId, usize>,
}

impl EventCatalog {
    /// Build a catalog, rejecting duplicate record ids and events that
    /// carry a pillar assignment.
    pub fn new(events: Vec<Event>) -> Result<Self> {
        let mut index = HashMap::with_capacity(events.len());
        for (position, event) in events.iter().enumerate() {
            if event.assigned_pillar.as_ref().is_some_and(|v| !v.is_null()) {
                return Err(Error::InvalidRecord(format!(
                    "event {} has a pillar assignment; events are pillar-agnostic",
                    event.record_id
                )));
            }
            if index.insert(event.record_id.clone(), position).is_some() {
                return Err(Error::InvalidRecord(format!(
                    "duplicate event record_id {}",
                    event.record_id
                )));
            }
        }
        Ok(Self { events, index })
    }

    pub fn get(&self, id: &RecordId) -> Option<&Event> {
        self.index.get(id).map(|&i| &self.events[i])
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events that happened in `year`, in input order.
    pub fn by_year(&self, year: i32) -> Vec<&Event> {
        self.events.iter().filter(|e| e.year == year).collect()
    }

    /// Events ordered chronologically, ties broken by name then id.
    pub fn chronological(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        events.sort_by(|a, b| {
            (a.year, &a.name, &a.record_id).cmp(&(b.year, &b.name, &b.record_id))
        });
        events
    }
}
