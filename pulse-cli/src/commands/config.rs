use crate::GlobalOpts;
use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};

use super::{Horizon, load_config, parse_horizon};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration (merged and validated)
    Show {
        /// Forecast years, e.g. 2025..=2030
        #[arg(long, value_parser = parse_horizon, value_name = "START..=END")]
        horizon: Option<Horizon>,
    },
    /// Show configuration file paths
    Path,
}

pub fn run(args: ConfigArgs, opts: &GlobalOpts) -> Result<()> {
    match args.command {
        ConfigCommands::Show { horizon } => show_config(opts, horizon),
        ConfigCommands::Path => show_paths(opts),
    }
}

fn show_config(opts: &GlobalOpts, horizon: Option<Horizon>) -> Result<()> {
    let config = load_config(opts, horizon)?;
    if opts.json {
        return crate::output::print_json(&config);
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths(opts: &GlobalOpts) -> Result<()> {
    println!("User config:    {}", ConfigLoader::user_config_path().display());
    println!("Project config: {}", ConfigLoader::project_config_path().display());
    if let Some(path) = &opts.config {
        println!("Explicit config: {}", path.display());
    }
    Ok(())
}
