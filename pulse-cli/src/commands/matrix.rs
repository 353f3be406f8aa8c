use anyhow::Result;
use clap::Args;
use pulse_forecast::{AssociationMatrix, export, resolve_links};

use super::{DatasetArgs, load_dataset};
use crate::GlobalOpts;
use crate::output::{Format, print_json, print_table};

#[derive(Args, Debug)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub input: DatasetArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

pub fn run(args: MatrixArgs, opts: &GlobalOpts) -> Result<()> {
    let dataset = load_dataset(&args.input.dataset)?;
    let (observations, events) = dataset.stores()?;
    let report = resolve_links(&events, &observations, &dataset.impact_links);
    let matrix = AssociationMatrix::from_impacts(&report.resolved);

    if opts.json {
        return print_json(&matrix);
    }

    if matrix.is_empty() {
        println!("No resolved impact links.");
        return Ok(());
    }
    print_table(&export::matrix_table(&matrix), args.format)?;
    Ok(())
}
