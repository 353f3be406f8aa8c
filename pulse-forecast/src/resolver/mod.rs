//! Impact link resolver
//!
//! Joins raw event→observation links against the event catalog and the
//! observation store. Every link either resolves into a [`ResolvedImpact`] or
//! is listed in the report's rejected links; nothing is silently dropped and
//! duplicates are kept individually so independent estimates compose.

mod matrix;
mod types;

pub use matrix::{AssociationMatrix, MatrixEvent};
pub use types::{ImpactLink, LinkError, RejectedLink, ResolutionReport, ResolvedImpact};

use tracing::{info, warn};

use crate::catalog::EventCatalog;
use crate::series::IndicatorSeriesStore;

/// Resolve every link against the catalogs.
///
/// Resolved tuples are ordered by (indicator, event_year, event_name); links
/// sharing that key keep their input order.
pub fn resolve_links(
    events: &EventCatalog,
    observations: &IndicatorSeriesStore,
    links: &[ImpactLink],
) -> ResolutionReport {
    let mut report = ResolutionReport::default();

    for (index, link) in links.iter().enumerate() {
        let mut errors = Vec::new();

        let event = events.get(&link.source_event_id);
        if event.is_none() {
            errors.push(LinkError::UnknownEvent(link.source_event_id.clone()));
        }
        let observation = observations.get(&link.target_observation_id);
        if observation.is_none() {
            errors.push(LinkError::UnknownObservation(
                link.target_observation_id.clone(),
            ));
        }
        if !link.magnitude.is_finite() || link.magnitude < 0.0 {
            errors.push(LinkError::InvalidMagnitude(link.magnitude));
        }

        match (event, observation) {
            (Some(event), Some(observation)) if errors.is_empty() => {
                report.resolved.push(ResolvedImpact {
                    event_id: event.record_id.clone(),
                    event_name: event.name.clone(),
                    event_year: event.year,
                    event_type: event.event_type,
                    observation_id: observation.record_id.clone(),
                    indicator: observation.pillar,
                    direction: link.direction,
                    magnitude: link.magnitude,
                    lag_months: link.lag_months,
                    confidence: link.confidence,
                });
            }
            _ => {
                for error in &errors {
                    warn!(index, error = %error, "Rejected impact link");
                }
                report.rejected.push(RejectedLink {
                    index,
                    link: link.clone(),
                    errors,
                });
            }
        }
    }

    // Stable sort keeps input order among equal keys
    report.resolved.sort_by(|a, b| {
        (a.indicator, a.event_year, &a.event_name).cmp(&(b.indicator, b.event_year, &b.event_name))
    });

    info!(
        resolved = report.resolved.len(),
        rejected = report.rejected.len(),
        "Resolved impact links"
    );

    report
}
