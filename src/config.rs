//! Encoder configuration and bitrate sweeps.
//!
//! An [`EncoderConfig`] pins down every encode parameter for one measurement
//! point. Within a comparison arm all parameters except the target bitrate
//! are held fixed, so quality differences are attributable solely to the
//! swept parameter. [`EncoderConfig::sweep`] builds such an arm.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rate-control mode for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitrateMode {
    /// Constant bitrate.
    #[default]
    Cbr,
    /// Variable bitrate.
    Vbr,
}

impl std::fmt::Display for BitrateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cbr => write!(f, "CBR"),
            Self::Vbr => write!(f, "VBR"),
        }
    }
}

/// Full encoder configuration for one measurement point.
///
/// Immutable once built; construct via [`EncoderConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Media type, e.g. `"video/avc"` or `"video/hevc"`.
    pub media_type: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target bitrate in kilobits per second.
    pub bitrate_kbps: u32,
    /// Rate-control mode.
    pub bitrate_mode: BitrateMode,
    /// Key-frame interval in seconds.
    pub key_frame_interval_secs: u32,
    /// Frame rate in frames per second.
    pub frame_rate: u32,
    /// Maximum number of consecutive B-frames.
    pub max_b_frames: u32,
}

impl EncoderConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }

    /// One-line summary used in diagnostics and unsupported-config errors.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} {}x{} @ {} kbps {} fps={} bframes={}",
            self.media_type,
            self.width,
            self.height,
            self.bitrate_kbps,
            self.bitrate_mode,
            self.frame_rate,
            self.max_b_frames
        )
    }

    /// Build one arm's configuration sweep: a copy of `self` per bitrate.
    ///
    /// Bitrates must be strictly increasing so measurement points land on
    /// the curve in order.
    pub fn sweep(&self, bitrates_kbps: &[u32]) -> Result<Vec<Self>> {
        if bitrates_kbps.is_empty() {
            return Err(Error::InvalidConfig("empty bitrate sweep".to_string()));
        }
        for pair in bitrates_kbps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::InvalidConfig(format!(
                    "bitrate sweep must be strictly increasing, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(bitrates_kbps
            .iter()
            .map(|&kbps| Self {
                bitrate_kbps: kbps,
                ..self.clone()
            })
            .collect())
    }
}

/// Builder for [`EncoderConfig`].
#[derive(Debug, Default)]
pub struct EncoderConfigBuilder {
    media_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bitrate_kbps: Option<u32>,
    bitrate_mode: Option<BitrateMode>,
    key_frame_interval_secs: Option<u32>,
    frame_rate: Option<u32>,
    max_b_frames: Option<u32>,
}

impl EncoderConfigBuilder {
    /// Set the media type (e.g. `"video/avc"`).
    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Set frame dimensions.
    #[must_use]
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the target bitrate in kbps.
    #[must_use]
    pub fn bitrate_kbps(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = Some(kbps);
        self
    }

    /// Set the rate-control mode.
    #[must_use]
    pub fn bitrate_mode(mut self, mode: BitrateMode) -> Self {
        self.bitrate_mode = Some(mode);
        self
    }

    /// Set the key-frame interval in seconds.
    #[must_use]
    pub fn key_frame_interval_secs(mut self, secs: u32) -> Self {
        self.key_frame_interval_secs = Some(secs);
        self
    }

    /// Set the frame rate in fps.
    #[must_use]
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    /// Set the maximum number of consecutive B-frames.
    #[must_use]
    pub fn max_b_frames(mut self, count: u32) -> Self {
        self.max_b_frames = Some(count);
        self
    }

    /// Build the configuration, validating that every field is concrete.
    pub fn build(self) -> Result<EncoderConfig> {
        let media_type = self
            .media_type
            .ok_or_else(|| Error::InvalidConfig("media_type is required".to_string()))?;
        let width = self
            .width
            .ok_or_else(|| Error::InvalidConfig("resolution is required".to_string()))?;
        let height = self
            .height
            .ok_or_else(|| Error::InvalidConfig("resolution is required".to_string()))?;
        let bitrate_kbps = self
            .bitrate_kbps
            .ok_or_else(|| Error::InvalidConfig("bitrate_kbps is required".to_string()))?;
        let frame_rate = self
            .frame_rate
            .ok_or_else(|| Error::InvalidConfig("frame_rate is required".to_string()))?;

        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution must be non-zero, got {width}x{height}"
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "4:2:0 content requires even dimensions, got {width}x{height}"
            )));
        }
        if bitrate_kbps == 0 {
            return Err(Error::InvalidConfig("bitrate_kbps must be positive".to_string()));
        }
        if frame_rate == 0 {
            return Err(Error::InvalidConfig("frame_rate must be positive".to_string()));
        }

        Ok(EncoderConfig {
            media_type,
            width,
            height,
            bitrate_kbps,
            bitrate_mode: self.bitrate_mode.unwrap_or_default(),
            key_frame_interval_secs: self.key_frame_interval_secs.unwrap_or(1),
            frame_rate,
            max_b_frames: self.max_b_frames.unwrap_or(0),
        })
    }
}
