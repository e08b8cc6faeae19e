//! Bjøntegaard-Delta rate computation.
//!
//! BD-rate is the standard video-compression answer to "how much bitrate
//! does codec B need, relative to codec A, for the same quality?" — the
//! average percentage rate difference between two rate-distortion curves
//! over their common quality range.
//!
//! ## Methodology
//!
//! 1. Transform each arm's `(bitrate, PSNR)` points into
//!    `(PSNR, ln(bitrate))` space, treating quality as the independent
//!    variable.
//! 2. Least-squares fit a cubic polynomial through each arm's points
//!    (degree 3 needs at least [`MIN_CURVE_POINTS`] points).
//! 3. Intersect the two arms' quality ranges. No overlap means BD-rate is
//!    undefined; that is an explicit error carrying both arms' raw data,
//!    never a silent extrapolation.
//! 4. Integrate both cubics analytically over the overlap and average.
//! 5. `bd_rate = (exp(avg_b - avg_a) - 1) * 100`.
//!
//! Negative results mean the target arm reaches equal quality at lower
//! bitrate.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum points per curve for a stable cubic fit.
pub const MIN_CURVE_POINTS: usize = 4;

/// One measured rate/quality pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// Achieved bitrate in kilobits per second.
    pub bitrate_kbps: f64,
    /// Chroma-weighted PSNR in dB.
    pub psnr_db: f64,
}

impl MeasurementPoint {
    /// Create a new measurement point.
    #[must_use]
    pub fn new(bitrate_kbps: f64, psnr_db: f64) -> Self {
        Self {
            bitrate_kbps,
            psnr_db,
        }
    }
}

/// An ordered set of measurement points for one comparison arm.
///
/// Points are appended in increasing-target-bitrate order during the
/// encode sweep and the curve is discarded after the BD-rate computation;
/// nothing persists across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateDistortionCurve {
    points: Vec<MeasurementPoint>,
}

impl RateDistortionCurve {
    /// Create an empty curve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from `(bitrate_kbps, psnr_db)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self {
            points: pairs
                .iter()
                .map(|&(rate, psnr)| MeasurementPoint::new(rate, psnr))
                .collect(),
        }
    }

    /// Append a measurement point.
    pub fn push(&mut self, point: MeasurementPoint) {
        self.points.push(point);
    }

    /// Access the measurement points.
    #[must_use]
    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    /// Number of points on the curve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest quality on the curve in dB.
    #[must_use]
    pub fn min_quality(&self) -> f64 {
        self.points.iter().map(|p| p.psnr_db).fold(f64::INFINITY, f64::min)
    }

    /// Highest quality on the curve in dB.
    #[must_use]
    pub fn max_quality(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.psnr_db)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Validate the curve as one arm of a BD-rate comparison.
    fn validate(&self, arm: &str) -> Result<()> {
        if self.points.len() < MIN_CURVE_POINTS {
            return Err(Error::InsufficientPoints {
                arm: arm.to_string(),
                points: self.points.len(),
            });
        }
        for p in &self.points {
            if !p.psnr_db.is_finite() || !p.bitrate_kbps.is_finite() || p.bitrate_kbps <= 0.0 {
                return Err(Error::BdRate(format!(
                    "{arm} arm has a non-finite or non-positive point: \
                     {:.2} kbps / {:.2} dB",
                    p.bitrate_kbps, p.psnr_db
                )));
            }
        }
        Ok(())
    }

    /// Points sorted by ascending quality, as `(psnr_db, ln_rate)` pairs.
    fn log_domain_sorted(&self) -> Vec<(f64, f64)> {
        let mut pairs: Vec<(f64, f64)> = self
            .points
            .iter()
            .map(|p| (p.psnr_db, p.bitrate_kbps.ln()))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }
}

/// Result of a BD-rate comparison, with the raw curve data retained for
/// diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BdRateResult {
    /// Average percentage bitrate difference of target vs baseline at
    /// matched quality. Negative = target is more efficient.
    pub bd_rate_percent: f64,
    /// Lower bound of the common quality range used for integration, dB.
    pub overlap_min_db: f64,
    /// Upper bound of the common quality range used for integration, dB.
    pub overlap_max_db: f64,
    /// Baseline arm measurement points.
    pub baseline: Vec<MeasurementPoint>,
    /// Target arm measurement points.
    pub target: Vec<MeasurementPoint>,
}

impl BdRateResult {
    /// Render the rate/PSNR table plus the result, for logs and messages.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let mut out = curve_table(&self.baseline, &self.target);
        out.push_str(&format!(
            "overlap: [{:.2}, {:.2}] dB, BD-rate: {:+.4}%\n",
            self.overlap_min_db, self.overlap_max_db, self.bd_rate_percent
        ));
        out
    }
}

/// Format both arms' raw points as an aligned table.
pub(crate) fn curve_table(baseline: &[MeasurementPoint], target: &[MeasurementPoint]) -> String {
    let mut out = String::from("  arm      |  bitrate kbps |  psnr dB\n");
    for (label, points) in [("baseline", baseline), ("target", target)] {
        for p in points {
            out.push_str(&format!(
                "  {label:<8} | {:>13.2} | {:>8.3}\n",
                p.bitrate_kbps, p.psnr_db
            ));
        }
    }
    out
}

/// Compute the BD-rate of `target` relative to `baseline`.
///
/// Both curves need at least [`MIN_CURVE_POINTS`] points and their quality
/// ranges must overlap.
///
/// # Example
///
/// ```
/// use veq_eval::bdrate::{bd_rate, RateDistortionCurve};
///
/// let baseline = RateDistortionCurve::from_pairs(&[
///     (2000.0, 33.0),
///     (4000.0, 36.0),
///     (8000.0, 39.0),
///     (16000.0, 42.0),
/// ]);
/// // Same quality at 20% less bitrate everywhere.
/// let target = RateDistortionCurve::from_pairs(&[
///     (1600.0, 33.0),
///     (3200.0, 36.0),
///     (6400.0, 39.0),
///     (12800.0, 42.0),
/// ]);
///
/// let result = bd_rate(&baseline, &target).unwrap();
/// assert!((result.bd_rate_percent - (-20.0)).abs() < 0.01);
/// ```
pub fn bd_rate(
    baseline: &RateDistortionCurve,
    target: &RateDistortionCurve,
) -> Result<BdRateResult> {
    baseline.validate("baseline")?;
    target.validate("target")?;

    let base_pairs = baseline.log_domain_sorted();
    let tgt_pairs = target.log_domain_sorted();

    let lo = baseline.min_quality().max(target.min_quality());
    let hi = baseline.max_quality().min(target.max_quality());
    if lo >= hi {
        return Err(Error::NoQualityOverlap {
            baseline_min: baseline.min_quality(),
            baseline_max: baseline.max_quality(),
            target_min: target.min_quality(),
            target_max: target.max_quality(),
            diagnostic: curve_table(baseline.points(), target.points()),
        });
    }

    let base_fit = CubicFit::fit(&base_pairs)?;
    let tgt_fit = CubicFit::fit(&tgt_pairs)?;

    let width = hi - lo;
    let avg_base = base_fit.integral(lo, hi) / width;
    let avg_tgt = tgt_fit.integral(lo, hi) / width;

    Ok(BdRateResult {
        bd_rate_percent: ((avg_tgt - avg_base).exp() - 1.0) * 100.0,
        overlap_min_db: lo,
        overlap_max_db: hi,
        baseline: baseline.points().to_vec(),
        target: target.points().to_vec(),
    })
}

//=============================================================================
// Cubic least-squares fit
//=============================================================================

/// Cubic polynomial fit `y = c0 + c1*t + c2*t^2 + c3*t^3` with `t = x - shift`.
///
/// The independent variable is centered on the sample mean before the
/// normal equations are formed, which keeps the 4x4 system well
/// conditioned for PSNR values in the 30-100 dB range.
#[derive(Debug, Clone, Copy)]
struct CubicFit {
    shift: f64,
    coeffs: [f64; 4],
}

impl CubicFit {
    /// Fit a cubic through `(x, y)` points by least squares.
    fn fit(points: &[(f64, f64)]) -> Result<Self> {
        debug_assert!(points.len() >= MIN_CURVE_POINTS);

        let n = points.len() as f64;
        let shift = points.iter().map(|(x, _)| x).sum::<f64>() / n;

        // Power sums S_k = sum t^k for k = 0..=6 and moments T_k = sum t^k * y.
        let mut s = [0.0_f64; 7];
        let mut t_mom = [0.0_f64; 4];
        for &(x, y) in points {
            let t = x - shift;
            let mut tk = 1.0;
            for k in 0..7 {
                s[k] += tk;
                if k < 4 {
                    t_mom[k] += tk * y;
                }
                tk *= t;
            }
        }

        let mut matrix = [[0.0_f64; 4]; 4];
        for (row, matrix_row) in matrix.iter_mut().enumerate() {
            for (col, cell) in matrix_row.iter_mut().enumerate() {
                *cell = s[row + col];
            }
        }

        let coeffs = solve_4x4(matrix, t_mom).ok_or_else(|| {
            Error::BdRate(
                "degenerate rate-distortion data: cubic fit is singular \
                 (are all quality values distinct?)"
                    .to_string(),
            )
        })?;

        Ok(Self { shift, coeffs })
    }

    /// Definite integral of the fitted polynomial over `[lo, hi]`.
    fn integral(&self, lo: f64, hi: f64) -> f64 {
        let antiderivative = |x: f64| {
            let t = x - self.shift;
            let mut acc = 0.0;
            let mut tk = t;
            for (k, &c) in self.coeffs.iter().enumerate() {
                acc += c / (k as f64 + 1.0) * tk;
                tk *= t;
            }
            acc
        };
        antiderivative(hi) - antiderivative(lo)
    }

    #[cfg(test)]
    fn eval(&self, x: f64) -> f64 {
        let t = x - self.shift;
        self.coeffs[0] + t * (self.coeffs[1] + t * (self.coeffs[2] + t * self.coeffs[3]))
    }
}

/// Solve a 4x4 linear system by Gaussian elimination with partial pivoting.
///
/// Returns `None` for a (numerically) singular matrix.
fn solve_4x4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot_row = (col..4).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0_f64; 4];
    for row in (0..4).rev() {
        let mut acc = b[row];
        for col in row + 1..4 {
            acc -= a[row][col] * x[col];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_curve() -> RateDistortionCurve {
        RateDistortionCurve::from_pairs(&[
            (2000.0, 32.5),
            (4000.0, 35.8),
            (6000.0, 37.6),
            (8000.0, 38.9),
            (10000.0, 39.8),
            (12000.0, 40.5),
        ])
    }

    #[test]
    fn test_cubic_fit_recovers_exact_polynomial() {
        // y = 2 + 0.5*x - 0.01*x^2 + 0.0002*x^3 sampled at six points.
        let poly = |x: f64| 2.0 + 0.5 * x - 0.01 * x * x + 0.0002 * x * x * x;
        let points: Vec<(f64, f64)> = [30.0, 34.0, 38.0, 42.0, 46.0, 50.0]
            .iter()
            .map(|&x| (x, poly(x)))
            .collect();

        let fit = CubicFit::fit(&points).unwrap();
        for &(x, y) in &points {
            assert!((fit.eval(x) - y).abs() < 1e-8);
        }
        // Analytic integral of the same polynomial over [32, 48].
        let antider = |x: f64| {
            2.0 * x + 0.25 * x * x - 0.01 / 3.0 * x.powi(3) + 0.00005 * x.powi(4)
        };
        let expected = antider(48.0) - antider(32.0);
        assert!((fit.integral(32.0, 48.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_solve_4x4_singular() {
        let a = [[1.0, 2.0, 3.0, 4.0]; 4];
        assert!(solve_4x4(a, [1.0, 2.0, 3.0, 4.0]).is_none());
    }

    #[test]
    fn test_bd_rate_self_comparison_is_zero() {
        let curve = sample_curve();
        let result = bd_rate(&curve, &curve).unwrap();
        assert_eq!(result.bd_rate_percent, 0.0);
    }

    #[test]
    fn test_bd_rate_constant_rate_scaling() {
        let baseline = sample_curve();
        let target = RateDistortionCurve::from_pairs(
            &baseline
                .points()
                .iter()
                .map(|p| (p.bitrate_kbps * 0.8, p.psnr_db))
                .collect::<Vec<_>>(),
        );
        // log-rate shifts by a constant, so the fitted curves differ by
        // exactly ln(0.8) and BD-rate is exactly -20%.
        let result = bd_rate(&baseline, &target).unwrap();
        assert!((result.bd_rate_percent - (-20.0)).abs() < 1e-6);
    }

    #[test]
    fn test_bd_rate_antisymmetry_in_log_domain() {
        let a = sample_curve();
        let b = RateDistortionCurve::from_pairs(&[
            (1800.0, 33.1),
            (3900.0, 36.4),
            (5800.0, 38.0),
            (8100.0, 39.2),
            (9900.0, 40.1),
            (11800.0, 40.9),
        ]);
        let forward = bd_rate(&a, &b).unwrap().bd_rate_percent;
        let reverse = bd_rate(&b, &a).unwrap().bd_rate_percent;
        // Percentages are not antisymmetric: with d the average log-rate
        // delta, forward + reverse = exp(d) + exp(-d) - 2 > 0. The log-rate
        // deltas themselves are exactly equal and opposite, since swapping
        // the arms reuses the same fits over the same overlap range.
        let forward_log = (1.0 + forward / 100.0).ln();
        let reverse_log = (1.0 + reverse / 100.0).ln();
        assert!(
            (forward_log + reverse_log).abs() < 1e-9,
            "forward={forward} reverse={reverse}"
        );
    }

    #[test]
    fn test_bd_rate_insufficient_points() {
        let short = RateDistortionCurve::from_pairs(&[
            (2000.0, 33.0),
            (4000.0, 36.0),
            (8000.0, 39.0),
        ]);
        let result = bd_rate(&short, &sample_curve());
        assert!(matches!(
            result,
            Err(Error::InsufficientPoints { points: 3, .. })
        ));
    }

    #[test]
    fn test_bd_rate_no_overlap() {
        let low = RateDistortionCurve::from_pairs(&[
            (500.0, 20.0),
            (700.0, 22.0),
            (900.0, 24.0),
            (1100.0, 26.0),
        ]);
        let high = RateDistortionCurve::from_pairs(&[
            (4000.0, 36.0),
            (6000.0, 38.0),
            (8000.0, 40.0),
            (10000.0, 42.0),
        ]);
        let result = bd_rate(&low, &high);
        match result {
            Err(Error::NoQualityOverlap { diagnostic, .. }) => {
                assert!(diagnostic.contains("baseline"));
                assert!(diagnostic.contains("target"));
            }
            other => panic!("expected NoQualityOverlap, got {other:?}"),
        }
    }

    #[test]
    fn test_bd_rate_rejects_non_positive_rate() {
        let bad = RateDistortionCurve::from_pairs(&[
            (0.0, 33.0),
            (4000.0, 36.0),
            (6000.0, 38.0),
            (8000.0, 40.0),
        ]);
        assert!(matches!(bd_rate(&bad, &sample_curve()), Err(Error::BdRate(_))));
    }

    #[test]
    fn test_bd_rate_known_good_pair_is_improvement() {
        // Curve pair from a known-good hardware run: the target arm should
        // come out at least as efficient as the baseline.
        let baseline = RateDistortionCurve::from_pairs(&[
            (3124.0, 80.0),
            (4025.0, 85.0),
            (6031.0, 90.0),
            (8048.0, 93.0),
            (10071.0, 95.0),
            (12087.0, 96.0),
        ]);
        let target = RateDistortionCurve::from_pairs(&[
            (2590.2, 79.4),
            (3992.5, 85.52),
            (5937.0, 90.49),
            (7905.3, 93.42),
            (9884.7, 95.15),
            (11857.7, 96.28),
        ]);
        let result = bd_rate(&baseline, &target).unwrap();
        assert!(
            result.bd_rate_percent < 0.0,
            "expected improvement, got {:+.3}%",
            result.bd_rate_percent
        );
    }

    #[test]
    fn test_diagnostic_contains_all_points() {
        let curve = sample_curve();
        let result = bd_rate(&curve, &curve).unwrap();
        let diag = result.diagnostic();
        assert!(diag.contains("2000.00"));
        assert!(diag.contains("12000.00"));
        assert!(diag.contains("BD-rate"));
    }
}
