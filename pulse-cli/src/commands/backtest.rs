use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use pulse_forecast::{IndicatorAccuracy, export};

use super::{DatasetArgs, load_dataset, load_engine};
use crate::GlobalOpts;
use crate::output::{Format, print_json, print_table};

#[derive(Args, Debug)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub input: DatasetArgs,

    /// First held-out year; nothing dated at or after it is used
    #[arg(long, value_name = "YEAR")]
    pub cutoff: i32,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

pub fn run(args: BacktestArgs, opts: &GlobalOpts) -> Result<()> {
    let engine = load_engine(opts, None)?;
    let dataset = load_dataset(&args.input.dataset)?;
    let report = engine.backtest(&dataset, args.cutoff)?;

    if opts.json {
        return print_json(&report);
    }

    if report.rows.is_empty() {
        println!("No observations at or after {} to compare against.", args.cutoff);
    } else {
        print_table(&export::backtest_table(&report.rows), args.format)?;
        if args.format == Format::Table {
            println!();
            println!("{}", accuracy_table(&report.accuracy));
        }
    }

    if report.links_excluded_by_cutoff > 0 {
        eprintln!(
            "Excluded {} impact link(s) dated at or after {}",
            report.links_excluded_by_cutoff, args.cutoff
        );
    }
    for failure in &report.failures {
        eprintln!("Skipped {}: {}", failure.indicator, failure.reason);
    }
    Ok(())
}

fn accuracy_table(accuracy: &[IndicatorAccuracy]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Indicator").fg(Color::Cyan),
        Cell::new("Points").fg(Color::Cyan),
        Cell::new("MAE").fg(Color::Cyan),
        Cell::new("Bias").fg(Color::Cyan),
        Cell::new("Within bounds").fg(Color::Cyan),
    ]);

    for entry in accuracy {
        table.add_row(vec![
            Cell::new(entry.indicator),
            Cell::new(entry.points),
            Cell::new(export::format_number(entry.mean_absolute_error, 2)),
            Cell::new(export::format_number(entry.bias, 2)),
            Cell::new(format!("{}/{}", entry.within_bounds, entry.points)),
        ]);
    }
    table
}
