//! Report-rendering command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use veq_eval::RegressionReport;

pub fn run(input: PathBuf, output: PathBuf, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("Loading report from: {}", input.display());
    }

    let report = RegressionReport::read_json(&input)
        .with_context(|| format!("reading report {}", input.display()))?;
    report
        .write_csv(&output)
        .with_context(|| format!("writing CSV {}", output.display()))?;

    println!(
        "{}: {} ({} baseline points, {} target points)",
        report.name,
        report.outcome,
        report.baseline_points.len(),
        report.target_points.len()
    );
    if let Some(bd) = report.bd_rate_percent {
        println!("BD-rate: {bd:+.4}% (threshold {})", report.min_gain);
    }
    if let Some(reason) = &report.skip_reason {
        println!("skipped: {reason}");
    }

    Ok(())
}
