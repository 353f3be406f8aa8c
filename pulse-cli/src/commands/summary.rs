use anyhow::Result;
use clap::Args;
use pulse_forecast::{DatasetComposition, export};

use super::{DatasetArgs, load_dataset};
use crate::GlobalOpts;
use crate::output::{print_json, render};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: DatasetArgs,
}

pub fn run(args: SummaryArgs, opts: &GlobalOpts) -> Result<()> {
    let dataset = load_dataset(&args.input.dataset)?;
    let composition = dataset.composition();

    if opts.json {
        return print_json(&composition);
    }

    println!("Total records: {}", composition.total_records);
    match composition.year_range {
        Some(range) => println!("Years:         {}-{}", range.min, range.max),
        None => println!("Years:         none"),
    }
    println!();
    println!("{}", render(&breakdown(&composition)));
    Ok(())
}

/// One row per (category, key) count.
fn breakdown(composition: &DatasetComposition) -> export::Table {
    let mut table = export::Table::new(["category", "key", "count"]);
    let mut push = |category: &str, key: &str, count: usize| {
        table.push(vec![category.to_string(), key.to_string(), count.to_string()]);
    };

    for (key, count) in &composition.by_record_type {
        push("record_type", key, *count);
    }
    for (pillar, count) in &composition.by_pillar {
        push("pillar", pillar.as_str(), *count);
    }
    for (source, count) in &composition.by_source {
        push("source", source, *count);
    }
    for (confidence, count) in &composition.by_confidence {
        push("confidence", confidence.as_str(), *count);
    }
    table
}
