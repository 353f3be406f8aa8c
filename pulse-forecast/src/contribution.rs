//! Contribution function builder
//!
//! Converts resolved impacts into a per-indicator function
//! `contribution(year) -> percentage points`. Each impact activates at its
//! effective start year and contributes its signed magnitude from then on;
//! impacts on the same indicator stack additively. No clamping happens here:
//! the contribution is a pure additive signal, bounds belong to the forecaster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedImpact;
use crate::types::{Pillar, RecordId};

/// Shape of an impact over the years after it activates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationProfile {
    /// Full magnitude from the effective start year onward
    #[default]
    Step,
    /// Magnitude fades as `e^(-rate * years_active)` after activation
    ExponentialDecay { rate: f64 },
}

impl ActivationProfile {
    /// Weight of an impact `years_active` years after its start year.
    ///
    /// Zero before activation, 1.0 in the activation year.
    pub fn weight(&self, years_active: i32) -> f64 {
        if years_active < 0 {
            return 0.0;
        }
        match self {
            Self::Step => 1.0,
            Self::ExponentialDecay { rate } => (-rate * years_active as f64).exp(),
        }
    }
}

/// One impact as seen by the contribution function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub event_id: RecordId,
    pub event_name: String,
    pub start_year: i32,
    pub signed_magnitude: f64,
}

/// Cumulative event contribution for a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionFunction {
    pub indicator: Pillar,
    pub profile: ActivationProfile,
    /// Ordered by start year, ties in resolved order
    activations: Vec<Activation>,
}

impl ContributionFunction {
    /// A function with no activations; contributes 0 everywhere.
    pub fn empty(indicator: Pillar, profile: ActivationProfile) -> Self {
        Self {
            indicator,
            profile,
            activations: Vec::new(),
        }
    }

    /// Percentage-point contribution in `year` from every impact active by then.
    pub fn contribution(&self, year: i32) -> f64 {
        self.activations
            .iter()
            .take_while(|a| a.start_year <= year)
            .map(|a| a.signed_magnitude * self.profile.weight(year - a.start_year))
            .sum()
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }
}

/// Contribution functions for every indicator that received impacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionSet {
    functions: BTreeMap<Pillar, ContributionFunction>,
}

/// One tabulated contribution value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPoint {
    pub indicator: Pillar,
    pub year: i32,
    pub contribution: f64,
}

impl ContributionSet {
    pub fn get(&self, indicator: Pillar) -> Option<&ContributionFunction> {
        self.functions.get(&indicator)
    }

    /// Contribution for an indicator, 0 when it received no impacts.
    pub fn contribution(&self, indicator: Pillar, year: i32) -> f64 {
        self.functions
            .get(&indicator)
            .map(|f| f.contribution(year))
            .unwrap_or(0.0)
    }

    pub fn indicators(&self) -> impl Iterator<Item = Pillar> + '_ {
        self.functions.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Tabulate every function over `years`, ordered by (indicator, year).
    pub fn table(&self, years: &[i32]) -> Vec<ContributionPoint> {
        self.functions
            .values()
            .flat_map(|f| {
                years.iter().map(move |&year| ContributionPoint {
                    indicator: f.indicator,
                    year,
                    contribution: f.contribution(year),
                })
            })
            .collect()
    }
}

/// Builds contribution functions from resolved impacts.
pub struct ContributionBuilder {
    profile: ActivationProfile,
}

impl ContributionBuilder {
    /// Create a builder using step activation.
    pub fn new() -> Self {
        Self {
            profile: ActivationProfile::default(),
        }
    }

    /// Create a builder with a custom activation profile.
    pub fn with_profile(profile: ActivationProfile) -> Self {
        Self { profile }
    }

    /// Build the function for one indicator from the impacts targeting it.
    ///
    /// Impacts on other indicators are ignored.
    pub fn build_indicator<'a>(
        &self,
        indicator: Pillar,
        impacts: impl IntoIterator<Item = &'a ResolvedImpact>,
    ) -> ContributionFunction {
        let mut activations: Vec<Activation> = impacts
            .into_iter()
            .filter(|i| i.indicator == indicator)
            .map(|i| Activation {
                event_id: i.event_id.clone(),
                event_name: i.event_name.clone(),
                start_year: i.effective_start_year(),
                signed_magnitude: i.signed_magnitude(),
            })
            .collect();
        // Fixed summation order so reordered input yields identical sums
        activations.sort_by(|a, b| {
            a.start_year
                .cmp(&b.start_year)
                .then_with(|| a.event_id.cmp(&b.event_id))
                .then_with(|| a.signed_magnitude.total_cmp(&b.signed_magnitude))
        });

        ContributionFunction {
            indicator,
            profile: self.profile,
            activations,
        }
    }

    /// Build functions for every indicator present in `impacts`.
    pub fn build(&self, impacts: &[ResolvedImpact]) -> ContributionSet {
        let mut grouped: BTreeMap<Pillar, Vec<&ResolvedImpact>> = BTreeMap::new();
        for impact in impacts {
            grouped.entry(impact.indicator).or_default().push(impact);
        }

        let functions = grouped
            .into_iter()
            .map(|(indicator, impacts)| (indicator, self.build_indicator(indicator, impacts)))
            .collect();

        ContributionSet { functions }
    }
}

impl Default for ContributionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
