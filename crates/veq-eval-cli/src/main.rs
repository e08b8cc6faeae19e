//! veq-eval CLI - Video encoder quality-regression tool

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

/// Video encoder quality-regression comparison tool.
#[derive(Parser)]
#[command(name = "veq-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the BD-rate between two measured rate-distortion curves
    BdRate {
        /// Baseline curve CSV (bitrate_kbps,psnr_db)
        #[arg(short, long)]
        baseline: PathBuf,

        /// Target curve CSV (bitrate_kbps,psnr_db)
        #[arg(short, long)]
        target: PathBuf,
    },

    /// Gate two measured curves against a BD-rate threshold
    ///
    /// Exits 0 on pass and 2 when the comparison is inconclusive
    /// (regression detected).
    Check {
        /// Baseline curve CSV (bitrate_kbps,psnr_db)
        #[arg(short, long)]
        baseline: PathBuf,

        /// Target curve CSV (bitrate_kbps,psnr_db)
        #[arg(short, long)]
        target: PathBuf,

        /// Maximum acceptable BD-rate percentage
        #[arg(long, default_value_t = 0.0)]
        min_gain: f64,

        /// Comparison name used in reports
        #[arg(long, default_value = "veq-check")]
        name: String,

        /// Write a JSON report here
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write a CSV report here
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Render a JSON regression report as CSV
    Report {
        /// Input report JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BdRate { baseline, target } => {
            commands::bdrate::run(baseline, target, cli.verbose)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            baseline,
            target,
            min_gain,
            name,
            json,
            csv,
        } => commands::check::run(name, baseline, target, min_gain, json, csv, cli.verbose),
        Commands::Report { input, output } => {
            commands::report::run(input, output, cli.verbose)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
