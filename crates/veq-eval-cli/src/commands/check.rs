//! Gate-check command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use veq_eval::{check_curves, read_curve_csv, RegressionReport, Verdict};

/// Exit code for an inconclusive (regression-detected) comparison.
const EXIT_INCONCLUSIVE: u8 = 2;

#[allow(clippy::too_many_arguments)]
pub fn run(
    name: String,
    baseline: PathBuf,
    target: PathBuf,
    min_gain: f64,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    verbose: bool,
) -> Result<ExitCode> {
    if verbose {
        eprintln!("Gating {} against {} (min_gain {min_gain})", target.display(), baseline.display());
    }

    let baseline_curve = read_curve_csv(&baseline)
        .with_context(|| format!("reading baseline curve {}", baseline.display()))?;
    let target_curve = read_curve_csv(&target)
        .with_context(|| format!("reading target curve {}", target.display()))?;

    let verdict = check_curves(&baseline_curve, &target_curve, min_gain)?;
    print!("{}", verdict.diagnostic());

    let report = RegressionReport::from_verdict(
        name,
        baseline.display().to_string(),
        target.display().to_string(),
        min_gain,
        &verdict,
    );
    if let Some(path) = json {
        report.write_json(&path)?;
        if verbose {
            eprintln!("Wrote JSON report to: {}", path.display());
        }
    }
    if let Some(path) = csv {
        report.write_csv(&path)?;
        if verbose {
            eprintln!("Wrote CSV report to: {}", path.display());
        }
    }

    Ok(match verdict {
        Verdict::Pass(_) => ExitCode::SUCCESS,
        _ => ExitCode::from(EXIT_INCONCLUSIVE),
    })
}
