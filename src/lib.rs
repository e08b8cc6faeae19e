//! # veq-eval
//!
//! Video encoder quality-regression harness.
//!
//! This library provides an **API-first design** where external crates
//! provide encode/decode callbacks for the codec under test, and this
//! library handles measurement (achieved bitrate, chroma-weighted PSNR),
//! BD-rate computation, and regression gating.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use veq_eval::{EncoderConfig, GateConfig, RawReference, RegressionGate, VideoCodec};
//!
//! let reference = RawReference::load_i420("source.yuv", 1920, 1080)?;
//!
//! let avc = VideoCodec::new("c2.android.avc.encoder", "1.0",
//!     Box::new(|image, config| { /* encode */ Ok(encoded) }),
//!     Box::new(|data| { /* decode */ Ok(frames) }));
//! let hevc = /* ... */;
//!
//! let base = EncoderConfig::builder()
//!     .media_type("video/avc")
//!     .resolution(1920, 1080)
//!     .bitrate_kbps(4000)
//!     .frame_rate(30)
//!     .build()?;
//! let ladder = [2000, 4000, 6000, 8000, 10000, 12000];
//!
//! let mut gate = RegressionGate::new(GateConfig::new(300))?;
//! let verdict = gate.run(
//!     &reference,
//!     &avc, &base.sweep(&ladder)?,
//!     &hevc, &base.sweep(&ladder)?,
//! )?;
//! println!("{}", verdict.diagnostic());
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`config`]: Encoder configurations and bitrate sweeps
//! - [`reference`]: Raw YUV reference material and its cache
//! - [`metrics`]: Per-plane and chroma-weighted PSNR
//! - [`measure`]: Callback-based measurement collection
//! - [`bdrate`]: Rate-distortion curves and BD-rate computation
//! - [`gate`]: Regression gate and verdict policy
//! - [`report`]: Report generation and curve CSV import

pub mod bdrate;
pub mod config;
pub mod error;
pub mod gate;
pub mod measure;
pub mod metrics;
pub mod reference;
pub mod report;

// Re-export commonly used types
pub use bdrate::{bd_rate, BdRateResult, MeasurementPoint, RateDistortionCurve, MIN_CURVE_POINTS};
pub use config::{BitrateMode, EncoderConfig};
pub use error::{Error, Result};
pub use gate::{check_curves, GateConfig, RegressionGate, Verdict};
pub use measure::{achieved_bitrate_kbps, DecodeFn, EncodeFn, Measurer, VideoCodec};
pub use metrics::{calculate_psnr, weighted_psnr, PlanePsnr};
pub use reference::{RawReference, ReferenceCache, YuvFrame};
pub use report::{read_curve_csv, Outcome, RegressionReport};
