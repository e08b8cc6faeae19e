//! Error types for veq-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for veq-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during quality-regression evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load a raw reference file.
    #[error("Reference load failed: {path}: {reason}")]
    ReferenceLoad {
        /// Path to the reference that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The encoder does not support the requested configuration.
    ///
    /// Hardware capability varies across devices; callers are expected to
    /// skip the measurement, never to treat this as a hard failure.
    #[error("Unsupported encoder configuration ({codec}): {config}")]
    UnsupportedConfig {
        /// Codec identifier.
        codec: String,
        /// Summary of the rejected configuration.
        config: String,
    },

    /// Error from a codec during encoding or decoding.
    #[error("Codec error ({codec}): {message}")]
    Codec {
        /// Codec identifier.
        codec: String,
        /// Error message from the codec.
        message: String,
    },

    /// The codec produced a different number of frames than requested.
    ///
    /// This is a codec contract violation (premature EOS or malfunction)
    /// and always fatal.
    #[error("Frame count mismatch: expected {expected} frames, got {actual}")]
    FrameCountMismatch {
        /// Number of frames the measurement requested.
        expected: usize,
        /// Number of frames the decoder produced.
        actual: usize,
    },

    /// Frame dimensions don't match between reference and decoded output.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height).
        expected: (usize, usize),
        /// Actual dimensions (width, height).
        actual: (usize, usize),
    },

    /// A rate-distortion curve has too few points for a cubic fit.
    #[error("Insufficient points for BD-rate: {arm} arm has {points} points, need at least 4")]
    InsufficientPoints {
        /// Which arm violated the precondition ("baseline" or "target").
        arm: String,
        /// Number of points present.
        points: usize,
    },

    /// The two arms' quality ranges do not overlap, so BD-rate is undefined.
    ///
    /// Carries both arms' raw data so the failure is diagnosable from the
    /// message alone. The fitted curves are never extrapolated to recover.
    #[error(
        "Quality ranges do not overlap: baseline [{baseline_min:.2}, {baseline_max:.2}] dB vs \
         target [{target_min:.2}, {target_max:.2}] dB\n{diagnostic}"
    )]
    NoQualityOverlap {
        /// Baseline arm minimum quality.
        baseline_min: f64,
        /// Baseline arm maximum quality.
        baseline_max: f64,
        /// Target arm minimum quality.
        target_min: f64,
        /// Target arm maximum quality.
        target_max: f64,
        /// Rate/quality table for both arms.
        diagnostic: String,
    },

    /// BD-rate computation failed for a reason other than overlap/points.
    #[error("BD-rate error: {0}")]
    BdRate(String),

    /// Invalid encoder configuration or sweep.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error importing curve CSV data.
    #[error("CSV import error at line {line}: {reason}")]
    CsvImport {
        /// Line number where the error occurred.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// Error writing report files.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether this error means "skip the measurement" rather than "fail".
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedConfig { .. })
    }
}
