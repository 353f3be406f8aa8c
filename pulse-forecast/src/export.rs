//! Deterministic tabular exports.
//!
//! Every table renders numbers at a fixed precision with negative zero
//! normalized, so identical inputs produce byte-identical text.

use serde::{Deserialize, Serialize};

use crate::backtest::BacktestRow;
use crate::contribution::ContributionPoint;
use crate::error::{Error, Result};
use crate::forecast::ForecastRow;
use crate::resolver::{AssociationMatrix, ResolvedImpact};

/// Decimal places for indicator values and contributions.
pub const VALUE_PRECISION: usize = 2;

/// A header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as delimited text with `\n` after every line.
    ///
    /// Cells containing the delimiter, a quote, or a newline are quoted.
    pub fn to_delimited(&self, delimiter: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Fixed-precision number with negative zero shown as zero.
pub fn format_number(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

fn value(v: f64) -> String {
    format_number(v, VALUE_PRECISION)
}

/// Event-by-indicator matrix, one row per event.
pub fn matrix_table(matrix: &AssociationMatrix) -> Table {
    let mut table = Table::new(
        ["event_id", "event", "year"]
            .into_iter()
            .map(String::from)
            .chain(matrix.indicators.iter().map(|p| p.as_str().to_string())),
    );
    for (event, cells) in matrix.events.iter().zip(&matrix.cells) {
        let mut row = vec![
            event.event_id.to_string(),
            event.name.clone(),
            event.year.to_string(),
        ];
        row.extend(cells.iter().map(|&c| value(c)));
        table.push(row);
    }
    table
}

/// One row per resolved impact tuple.
pub fn impact_summary_table(impacts: &[ResolvedImpact]) -> Table {
    let mut table = Table::new([
        "event",
        "event_year",
        "indicator",
        "direction",
        "magnitude",
        "lag_months",
        "confidence",
    ]);
    for impact in impacts {
        table.push(vec![
            impact.event_name.clone(),
            impact.event_year.to_string(),
            impact.indicator.to_string(),
            impact.direction.to_string(),
            value(impact.magnitude),
            impact.lag_months.to_string(),
            impact.confidence.to_string(),
        ]);
    }
    table
}

pub fn contribution_table(points: &[ContributionPoint]) -> Table {
    let mut table = Table::new(["indicator", "year", "contribution"]);
    for point in points {
        table.push(vec![
            point.indicator.to_string(),
            point.year.to_string(),
            value(point.contribution),
        ]);
    }
    table
}

pub fn forecast_table(rows: &[ForecastRow]) -> Table {
    let mut table = Table::new([
        "indicator",
        "year",
        "scenario",
        "value",
        "low_bound",
        "high_bound",
    ]);
    for row in rows {
        table.push(vec![
            row.indicator.to_string(),
            row.year.to_string(),
            row.scenario.to_string(),
            value(row.value),
            value(row.low_bound),
            value(row.high_bound),
        ]);
    }
    table
}

pub fn backtest_table(rows: &[BacktestRow]) -> Table {
    let mut table = Table::new([
        "indicator",
        "year",
        "projected",
        "low_bound",
        "high_bound",
        "actual",
        "error",
        "within_bounds",
    ]);
    for row in rows {
        table.push(vec![
            row.indicator.to_string(),
            row.year.to_string(),
            value(row.projected),
            value(row.low_bound),
            value(row.high_bound),
            value(row.actual),
            value(row.error),
            row.within_bounds.to_string(),
        ]);
    }
    table
}
