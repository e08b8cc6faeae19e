//! BD-rate command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use veq_eval::{bd_rate, read_curve_csv};

pub fn run(baseline: PathBuf, target: PathBuf, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("Loading baseline curve from: {}", baseline.display());
        eprintln!("Loading target curve from: {}", target.display());
    }

    let baseline_curve = read_curve_csv(&baseline)
        .with_context(|| format!("reading baseline curve {}", baseline.display()))?;
    let target_curve = read_curve_csv(&target)
        .with_context(|| format!("reading target curve {}", target.display()))?;

    let result = bd_rate(&baseline_curve, &target_curve)?;

    print!("{}", result.diagnostic());
    if result.bd_rate_percent < 0.0 {
        println!(
            "target reaches equal quality at {:.2}% lower bitrate",
            -result.bd_rate_percent
        );
    } else {
        println!(
            "target needs {:.2}% more bitrate for equal quality",
            result.bd_rate_percent
        );
    }

    Ok(())
}
