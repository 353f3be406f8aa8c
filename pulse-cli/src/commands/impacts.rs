use anyhow::Result;
use clap::Args;
use pulse_forecast::{ResolutionReport, export, resolve_links};

use super::{DatasetArgs, load_dataset};
use crate::GlobalOpts;
use crate::output::{Format, print_json, print_table};

#[derive(Args, Debug)]
pub struct ImpactsArgs {
    #[command(flatten)]
    pub input: DatasetArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

pub fn run(args: ImpactsArgs, opts: &GlobalOpts) -> Result<()> {
    let dataset = load_dataset(&args.input.dataset)?;
    let (observations, events) = dataset.stores()?;
    let report = resolve_links(&events, &observations, &dataset.impact_links);

    if opts.json {
        return print_json(&report);
    }

    print_table(&export::impact_summary_table(&report.resolved), args.format)?;
    print_rejected(&report);
    Ok(())
}

/// List rejected links on stderr so delimited output stays clean.
fn print_rejected(report: &ResolutionReport) {
    if report.is_clean() {
        return;
    }
    eprintln!();
    eprintln!(
        "Rejected {} of {} links:",
        report.rejected.len(),
        report.total_links()
    );
    for rejected in &report.rejected {
        let reasons: Vec<String> = rejected.errors.iter().map(ToString::to_string).collect();
        eprintln!(
            "  #{} {} -> {}: {}",
            rejected.index,
            rejected.link.source_event_id,
            rejected.link.target_observation_id,
            reasons.join("; ")
        );
    }
}
