use anyhow::Result;
use clap::Args;
use pulse_forecast::{RunReport, export};

use super::{DatasetArgs, Horizon, load_dataset, load_engine, parse_horizon};
use crate::GlobalOpts;
use crate::output::{Format, print_json, print_table};

#[derive(Args, Debug)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: DatasetArgs,

    /// Forecast years, e.g. 2025..=2030 (overrides configuration)
    #[arg(long, value_parser = parse_horizon, value_name = "START..=END")]
    pub horizon: Option<Horizon>,

    /// Also print the event contribution per indicator and horizon year
    #[arg(long)]
    pub contributions: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

pub fn run(args: ForecastArgs, opts: &GlobalOpts) -> Result<()> {
    let engine = load_engine(opts, args.horizon)?;
    let dataset = load_dataset(&args.input.dataset)?;
    let report = engine.run(&dataset)?;

    if opts.json {
        return print_json(&report);
    }

    print_table(&export::forecast_table(&report.rows), args.format)?;
    if args.contributions {
        println!();
        let points = report
            .contributions
            .table(&engine.config().forecast_horizon);
        print_table(&export::contribution_table(&points), args.format)?;
    }
    print_diagnostics(&report);
    Ok(())
}

/// Report skipped indicators, rejected links, and clamped projections on stderr.
fn print_diagnostics(report: &RunReport) {
    for failure in &report.failures {
        eprintln!("Skipped {}: {}", failure.indicator, failure.reason);
    }
    if !report.resolution.is_clean() {
        eprintln!(
            "Rejected {} of {} impact links (see `pulse impacts`)",
            report.resolution.rejected.len(),
            report.resolution.total_links()
        );
    }
    for warning in &report.warnings {
        eprintln!(
            "Clamped {} {} {}: raw value {:.2}",
            warning.indicator, warning.year, warning.scenario, warning.raw_value
        );
    }
}
