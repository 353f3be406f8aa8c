//! Event × indicator association matrix
//!
//! Fully derived from resolved impacts. Rows are the distinct events that
//! appear in resolved links, ordered by (year, name, id); columns are the
//! distinct indicators in pillar order. Duplicate links on the same cell sum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::ResolvedImpact;
use crate::types::{Pillar, RecordId};

/// Row header of the association matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEvent {
    pub event_id: RecordId,
    pub name: String,
    pub year: i32,
}

/// Signed-magnitude matrix of events against indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationMatrix {
    pub events: Vec<MatrixEvent>,
    pub indicators: Vec<Pillar>,
    /// `cells[row][column]`, 0 where no link exists
    pub cells: Vec<Vec<f64>>,
}

impl AssociationMatrix {
    /// Derive the matrix from resolved impacts.
    pub fn from_impacts(impacts: &[ResolvedImpact]) -> Self {
        let mut rows: BTreeMap<(i32, &str, &RecordId), BTreeMap<Pillar, f64>> = BTreeMap::new();
        let mut indicators: Vec<Pillar> = Vec::new();

        for impact in impacts {
            let row = rows
                .entry((impact.event_year, impact.event_name.as_str(), &impact.event_id))
                .or_default();
            *row.entry(impact.indicator).or_insert(0.0) += impact.signed_magnitude();
            if !indicators.contains(&impact.indicator) {
                indicators.push(impact.indicator);
            }
        }
        indicators.sort();

        let mut events = Vec::with_capacity(rows.len());
        let mut cells = Vec::with_capacity(rows.len());
        for ((year, name, event_id), values) in rows {
            events.push(MatrixEvent {
                event_id: event_id.clone(),
                name: name.to_string(),
                year,
            });
            cells.push(
                indicators
                    .iter()
                    .map(|pillar| values.get(pillar).copied().unwrap_or(0.0))
                    .collect(),
            );
        }

        Self {
            events,
            indicators,
            cells,
        }
    }

    /// Cell value for an event and indicator, 0 when either is absent.
    pub fn cell(&self, event_id: &RecordId, indicator: Pillar) -> f64 {
        let row = self.events.iter().position(|e| &e.event_id == event_id);
        let column = self.indicators.iter().position(|&p| p == indicator);
        match (row, column) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, Direction, EventType};

    fn impact(
        event_id: &str,
        name: &str,
        year: i32,
        indicator: Pillar,
        direction: Direction,
        magnitude: f64,
    ) -> ResolvedImpact {
        ResolvedImpact {
            event_id: RecordId::from(event_id),
            event_name: name.into(),
            event_year: year,
            event_type: EventType::Policy,
            observation_id: RecordId::from("OBS"),
            indicator,
            direction,
            magnitude,
            lag_months: 0,
            confidence: Confidence::Medium,
        }
    }

    #[test]
    fn test_matrix_shape_and_signs() {
        let impacts = vec![
            impact("EVT_1", "Telebirr Launch", 2021, Pillar::Access, Direction::Positive, 4.2),
            impact("EVT_1", "Telebirr Launch", 2021, Pillar::Usage, Direction::Positive, 6.0),
            impact("EVT_2", "FX Reform", 2024, Pillar::Usage, Direction::Negative, 1.5),
        ];

        let matrix = AssociationMatrix::from_impacts(&impacts);

        assert_eq!(matrix.indicators, vec![Pillar::Access, Pillar::Usage]);
        assert_eq!(matrix.events.len(), 2);
        assert_eq!(matrix.cell(&RecordId::from("EVT_1"), Pillar::Access), 4.2);
        assert_eq!(matrix.cell(&RecordId::from("EVT_2"), Pillar::Usage), -1.5);
        assert_eq!(matrix.cell(&RecordId::from("EVT_2"), Pillar::Access), 0.0);
        assert_eq!(matrix.cell(&RecordId::from("EVT_9"), Pillar::Access), 0.0);
    }

    #[test]
    fn test_duplicate_links_sum_into_one_cell() {
        let impacts = vec![
            impact("EVT_1", "Telebirr Launch", 2021, Pillar::Access, Direction::Positive, 2.0),
            impact("EVT_1", "Telebirr Launch", 2021, Pillar::Access, Direction::Positive, 1.5),
        ];
        let matrix = AssociationMatrix::from_impacts(&impacts);
        assert_eq!(matrix.events.len(), 1);
        assert!((matrix.cell(&RecordId::from("EVT_1"), Pillar::Access) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_rows_ordered_by_year_then_name() {
        let impacts = vec![
            impact("EVT_3", "Zeta", 2023, Pillar::Access, Direction::Positive, 1.0),
            impact("EVT_2", "Alpha", 2023, Pillar::Access, Direction::Positive, 1.0),
            impact("EVT_1", "Omega", 2019, Pillar::Access, Direction::Positive, 1.0),
        ];
        let matrix = AssociationMatrix::from_impacts(&impacts);
        let names: Vec<&str> = matrix.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Omega", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let impacts = vec![
            impact("EVT_2", "FX Reform", 2024, Pillar::Usage, Direction::Negative, 1.5),
            impact("EVT_1", "Telebirr Launch", 2021, Pillar::Access, Direction::Positive, 4.2),
        ];
        let first = serde_json::to_vec(&AssociationMatrix::from_impacts(&impacts)).unwrap();
        let second = serde_json::to_vec(&AssociationMatrix::from_impacts(&impacts)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_impacts_give_empty_matrix() {
        let matrix = AssociationMatrix::from_impacts(&[]);
        assert!(matrix.is_empty());
        assert!(matrix.indicators.is_empty());
    }
}
