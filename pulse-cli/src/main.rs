use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "pulse", about = "Event-impact attribution and scenario forecasting")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file layered over the user and project files
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the composition of a dataset
    Summary(commands::summary::SummaryArgs),
    /// Resolve impact links and list the resulting impacts
    Impacts(commands::impacts::ImpactsArgs),
    /// Print the event-by-indicator association matrix
    Matrix(commands::matrix::MatrixArgs),
    /// Forecast every indicator under each scenario
    Forecast(commands::forecast::ForecastArgs),
    /// Forecast from history before a cutoff and compare with what happened
    Backtest(commands::backtest::BacktestArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

/// Flags shared by every command.
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = GlobalOpts {
        json: cli.json,
        config: cli.config,
    };

    match cli.command {
        Commands::Summary(args) => commands::summary::run(args, &opts),
        Commands::Impacts(args) => commands::impacts::run(args, &opts),
        Commands::Matrix(args) => commands::matrix::run(args, &opts),
        Commands::Forecast(args) => commands::forecast::run(args, &opts),
        Commands::Backtest(args) => commands::backtest::run(args, &opts),
        Commands::Config(args) => commands::config::run(args, &opts),
    }
}
