//! Measurement collection with callback-based codec interface.
//!
//! External crates provide encode/decode callbacks for the codec under
//! test; the [`Measurer`] drives one encode per [`EncoderConfig`], writes
//! the muxed output to a scratch file, re-decodes it, and produces one
//! [`MeasurementPoint`] (achieved bitrate, weighted PSNR).
//!
//! Everything is synchronous: one measurement runs to completion before
//! the next begins, in increasing-bitrate order. Scratch files are deleted
//! immediately after the PSNR comparison; [`Measurer::cleanup`] sweeps
//! anything left behind on early-failure paths and runs again on drop.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::bdrate::MeasurementPoint;
use crate::config::EncoderConfig;
use crate::error::{Error, Result};
use crate::metrics::calculate_psnr;
use crate::reference::{RawReference, YuvFrame};

/// Encode callback type.
///
/// Takes the raw reference and one configuration, returns the muxed
/// encoded stream. An encoder that cannot satisfy the configuration must
/// return [`Error::UnsupportedConfig`], which callers treat as "skip",
/// never as a failure.
pub type EncodeFn = Box<dyn Fn(&RawReference, &EncoderConfig) -> Result<Vec<u8>> + Send + Sync>;

/// Decode callback type.
///
/// Takes an encoded stream, returns the decoded 4:2:0 frames.
pub type DecodeFn = Box<dyn Fn(&[u8]) -> Result<Vec<YuvFrame>> + Send + Sync>;

/// A codec under test: identifier plus encode/decode callbacks.
pub struct VideoCodec {
    id: String,
    version: String,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl VideoCodec {
    /// Register a codec with its encode and decode callbacks.
    #[must_use]
    pub fn new(id: &str, version: &str, encode: EncodeFn, decode: DecodeFn) -> Self {
        Self {
            id: id.to_string(),
            version: version.to_string(),
            encode,
            decode,
        }
    }

    /// Codec identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Codec version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Achieved bitrate in kbps from output size, frame rate and frame count.
///
/// # Example
///
/// ```
/// use veq_eval::measure::achieved_bitrate_kbps;
///
/// assert_eq!(achieved_bitrate_kbps(1_000_000, 30, 300), 800.0);
/// ```
#[must_use]
pub fn achieved_bitrate_kbps(output_bytes: u64, frame_rate: u32, frame_limit: usize) -> f64 {
    output_bytes as f64 * 8.0 * f64::from(frame_rate) / (1000.0 * frame_limit as f64)
}

/// Measurement collector: runs encodes and produces measurement points.
pub struct Measurer {
    scratch: TempDir,
    pending: HashSet<PathBuf>,
    sequence: usize,
}

impl Measurer {
    /// Create a collector with a fresh scratch directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            scratch: TempDir::new()?,
            pending: HashSet::new(),
            sequence: 0,
        })
    }

    /// Produce one measurement point for `config`.
    ///
    /// Encodes the first `frame_limit` frames' worth of the reference,
    /// measures the muxed output size, re-decodes and compares against the
    /// reference. Fails with [`Error::FrameCountMismatch`] if the decoder
    /// does not produce exactly `frame_limit` frames.
    pub fn measure(
        &mut self,
        codec: &VideoCodec,
        reference: &RawReference,
        config: &EncoderConfig,
        frame_limit: usize,
    ) -> Result<MeasurementPoint> {
        if frame_limit == 0 {
            return Err(Error::InvalidConfig("frame_limit must be positive".to_string()));
        }
        if reference.frame_count() < frame_limit {
            return Err(Error::InvalidConfig(format!(
                "reference has {} frames, frame_limit is {}",
                reference.frame_count(),
                frame_limit
            )));
        }
        if (config.width as usize, config.height as usize) != (reference.width(), reference.height())
        {
            return Err(Error::DimensionMismatch {
                expected: (reference.width(), reference.height()),
                actual: (config.width as usize, config.height as usize),
            });
        }

        let encoded = (codec.encode)(reference, config)?;

        // The muxed stream lands in a scratch file per measurement; the
        // achieved bitrate is measured from the file, and the file is
        // removed as soon as the comparison is done.
        self.sequence += 1;
        let path = self.scratch.path().join(format!(
            "{}-{}kbps-{:04}.bin",
            codec.id, config.bitrate_kbps, self.sequence
        ));
        fs::write(&path, &encoded)?;
        self.pending.insert(path.clone());

        let output_bytes = fs::metadata(&path)?.len();

        let decoded = (codec.decode)(&encoded)?;
        if decoded.len() != frame_limit {
            return Err(Error::FrameCountMismatch {
                expected: frame_limit,
                actual: decoded.len(),
            });
        }

        let psnr = calculate_psnr(
            reference.width(),
            reference.height(),
            &reference.frames()[..frame_limit],
            &decoded,
        )?;

        fs::remove_file(&path)?;
        self.pending.remove(&path);

        Ok(MeasurementPoint::new(
            achieved_bitrate_kbps(output_bytes, config.frame_rate, frame_limit),
            psnr.weighted(),
        ))
    }

    /// Number of scratch files not yet removed.
    #[must_use]
    pub fn pending_files(&self) -> usize {
        self.pending.len()
    }

    /// Delete any scratch files left by early-failure paths.
    pub fn cleanup(&mut self) {
        for path in self.pending.drain() {
            // Best effort: a missing file already satisfies the goal.
            let _ = fs::remove_file(path);
        }
    }
}

impl Drop for Measurer {
    fn drop(&mut self) {
        self.cleanup();
    }
}
