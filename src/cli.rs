use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Food Price Index analysis and forecasting.
#[derive(Parser)]
#[command(
    name = "fpi-forecast",
    version,
    about = "Food Price Index diagnostics and seasonal ARIMA forecasts"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Load the series, run diagnostics, select a model and write the report.
    Run(RunArgs),
    /// Load the series and write it as CSV without analysing it.
    Fetch(FetchArgs),
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to TOML configuration file; built-in defaults when absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read the table from this CSV export instead of the configured source.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the report directory from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the forecast horizon from config.
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Skip chart rendering.
    #[arg(long)]
    pub no_charts: bool,
}

/// Arguments for the `fetch` subcommand.
#[derive(clap::Args)]
pub struct FetchArgs {
    /// Path to TOML configuration file; built-in defaults when absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read the table from this CSV export instead of the configured source.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path for the series CSV.
    #[arg(short, long)]
    pub output: PathBuf,
}
