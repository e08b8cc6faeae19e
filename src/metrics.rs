//! PSNR metrics for YUV frame sequences.
//!
//! Fidelity here is plain PSNR against the raw reference, computed per
//! plane over the whole clip (global MSE, not per-frame averaging) and
//! collapsed into one number with 4:2:0 chroma weighting:
//!
//! `weighted = (6*Y + U + V) / 8`
//!
//! The 6/8 luma share reflects 4:2:0 subsampling, where luma carries
//! three quarters of the samples and nearly all perceived detail.

use crate::error::{Error, Result};
use crate::reference::YuvFrame;

/// Peak sample value for 8-bit content.
const PEAK: f64 = 255.0;

/// Per-plane PSNR values in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanePsnr {
    /// Luma PSNR.
    pub y: f64,
    /// Cb PSNR.
    pub u: f64,
    /// Cr PSNR.
    pub v: f64,
}

impl PlanePsnr {
    /// Chroma-subsampling-weighted composite PSNR: `(6*Y + U + V) / 8` dB.
    #[must_use]
    pub fn weighted(&self) -> f64 {
        weighted_psnr(self.y, self.u, self.v)
    }
}

/// Combine per-plane PSNR values with 4:2:0 luma-dominant weights.
#[must_use]
pub fn weighted_psnr(y: f64, u: f64, v: f64) -> f64 {
    (6.0 * y + u + v) / 8.0
}

/// PSNR from an accumulated squared-error sum.
///
/// Returns `f64::INFINITY` for identical planes.
fn psnr_from_sse(sse: f64, samples: f64) -> f64 {
    let mse = sse / samples;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (PEAK * PEAK / mse).log10()
    }
}

fn plane_sse(reference: &[u8], test: &[u8]) -> f64 {
    reference
        .iter()
        .zip(test.iter())
        .map(|(r, t)| {
            let diff = f64::from(*r) - f64::from(*t);
            diff * diff
        })
        .sum()
}

/// Calculate per-plane PSNR between reference and decoded frame sequences.
///
/// Frame counts must already match (the measurement collector enforces the
/// frame-count contract before metrics run); plane sizes are validated here
/// against the stated dimensions.
pub fn calculate_psnr(
    width: usize,
    height: usize,
    reference: &[YuvFrame],
    decoded: &[YuvFrame],
) -> Result<PlanePsnr> {
    if decoded.len() != reference.len() {
        return Err(Error::FrameCountMismatch {
            expected: reference.len(),
            actual: decoded.len(),
        });
    }

    let y_len = width * height;
    let c_len = (width / 2) * (height / 2);

    let mut sse_y = 0.0;
    let mut sse_u = 0.0;
    let mut sse_v = 0.0;

    for (ref_frame, dec_frame) in reference.iter().zip(decoded.iter()) {
        for frame in [ref_frame, dec_frame] {
            if frame.y.len() != y_len || frame.u.len() != c_len || frame.v.len() != c_len {
                return Err(Error::DimensionMismatch {
                    expected: (width, height),
                    actual: (frame.y.len(), frame.u.len()),
                });
            }
        }
        sse_y += plane_sse(&ref_frame.y, &dec_frame.y);
        sse_u += plane_sse(&ref_frame.u, &dec_frame.u);
        sse_v += plane_sse(&ref_frame.v, &dec_frame.v);
    }

    let frames = reference.len() as f64;
    Ok(PlanePsnr {
        y: psnr_from_sse(sse_y, frames * y_len as f64),
        u: psnr_from_sse(sse_u, frames * c_len as f64),
        v: psnr_from_sse(sse_v, frames * c_len as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frames(width: usize, height: usize, count: usize, value: u8) -> Vec<YuvFrame> {
        let frame = YuvFrame {
            y: vec![value; width * height],
            u: vec![value; (width / 2) * (height / 2)],
            v: vec![value; (width / 2) * (height / 2)],
        };
        vec![frame; count]
    }

    #[test]
    fn test_weighted_psnr_formula() {
        // (6*40 + 38 + 42) / 8 = 40.0 exactly.
        assert_eq!(weighted_psnr(40.0, 38.0, 42.0), 40.0);
    }

    #[test]
    fn test_psnr_identical() {
        let frames = flat_frames(16, 8, 3, 128);
        let psnr = calculate_psnr(16, 8, &frames, &frames).unwrap();
        assert!(psnr.y.is_infinite());
        assert!(psnr.weighted().is_infinite());
    }

    #[test]
    fn test_psnr_constant_offset() {
        let reference = flat_frames(16, 8, 3, 100);
        let degraded = flat_frames(16, 8, 3, 110);
        let psnr = calculate_psnr(16, 8, &reference, &degraded).unwrap();
        // Constant difference of 10: 10 * log10(255^2 / 100) = 28.13 dB.
        let expected = 10.0 * (255.0_f64 * 255.0 / 100.0).log10();
        assert!((psnr.y - expected).abs() < 1e-9);
        assert!((psnr.u - expected).abs() < 1e-9);
        assert!((psnr.weighted() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_psnr_frame_count_mismatch() {
        let reference = flat_frames(16, 8, 3, 100);
        let decoded = flat_frames(16, 8, 2, 100);
        let result = calculate_psnr(16, 8, &reference, &decoded);
        assert!(matches!(
            result,
            Err(Error::FrameCountMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_psnr_plane_size_mismatch() {
        let reference = flat_frames(16, 8, 1, 100);
        let wrong = flat_frames(8, 8, 1, 100);
        let result = calculate_psnr(16, 8, &reference, &wrong);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }
}
