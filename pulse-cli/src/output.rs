//! Rendering of export tables and JSON for the terminal.

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use pulse_forecast::export;
use serde::Serialize;

/// Output format for tabular commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Bordered terminal table
    #[default]
    Table,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
}

/// Print an export table in the chosen format.
pub fn print_table(table: &export::Table, format: Format) -> Result<()> {
    match format {
        Format::Table => println!("{}", render(table)),
        Format::Csv => print!("{}", table.to_delimited(b',')?),
        Format::Tsv => print!("{}", table.to_delimited(b'\t')?),
    }
    Ok(())
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build a terminal table from an export table.
pub fn render(table: &export::Table) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_content_arrangement(ContentArrangement::Dynamic);
    out.set_header(
        table
            .headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    for row in &table.rows {
        out.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    out
}
