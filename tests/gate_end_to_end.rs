//! End-to-end regression gate runs with synthetic codecs.
//!
//! The synthetic encoder's output size tracks the target bitrate exactly,
//! and its "decode" reproduces the reference shifted by a constant offset
//! that shrinks as bitrate (scaled by the codec's efficiency factor)
//! grows. That gives a smooth, monotone rate-distortion curve with
//! analytically known PSNR at every point.

use std::sync::Arc;

use veq_eval::{
    EncoderConfig, Error, GateConfig, RawReference, RegressionGate, Verdict, VideoCodec, YuvFrame,
};

const FRAME_LIMIT: usize = 6;
const LADDER_KBPS: [u32; 6] = [2000, 4000, 6000, 8000, 10000, 12000];

fn reference() -> Arc<RawReference> {
    let frames = (0..FRAME_LIMIT)
        .map(|i| {
            // Mid-range samples so a +offset never saturates at 255.
            let fill = |len: usize| {
                (0..len)
                    .map(|s| ((s * 3 + i * 11) % 150 + 30) as u8)
                    .collect::<Vec<u8>>()
            };
            YuvFrame {
                y: fill(16 * 8),
                u: fill(8 * 4),
                v: fill(8 * 4),
            }
        })
        .collect();
    Arc::new(RawReference::new(16, 8, frames).unwrap())
}

fn offset_for(efficiency: f64, bitrate_kbps: u32) -> u8 {
    ((48_000.0 / (efficiency * f64::from(bitrate_kbps))).round() as u8).max(1)
}

/// A codec with the given rate-quality efficiency. Higher efficiency means
/// the same offset (quality) at a lower bitrate.
fn synthetic_codec(id: &str, reference: Arc<RawReference>, efficiency: f64) -> VideoCodec {
    let decode_ref = Arc::clone(&reference);
    VideoCodec::new(
        id,
        "1.0",
        Box::new(move |_, config| {
            let size = config.bitrate_kbps as usize * 1000 * FRAME_LIMIT
                / (8 * config.frame_rate as usize);
            let mut data = vec![0u8; size.max(2)];
            data[0] = offset_for(efficiency, config.bitrate_kbps);
            Ok(data)
        }),
        Box::new(move |data| {
            let offset = data[0];
            Ok(decode_ref.frames()[..FRAME_LIMIT]
                .iter()
                .map(|f| YuvFrame {
                    y: f.y.iter().map(|&s| s + offset).collect(),
                    u: f.u.iter().map(|&s| s + offset).collect(),
                    v: f.v.iter().map(|&s| s + offset).collect(),
                })
                .collect())
        }),
    )
}

fn base_config() -> EncoderConfig {
    EncoderConfig::builder()
        .media_type("video/avc")
        .resolution(16, 8)
        .bitrate_kbps(4000)
        .frame_rate(30)
        .build()
        .unwrap()
}

#[test]
fn gate_passes_when_target_is_more_efficient() {
    let reference = reference();
    let baseline = synthetic_codec("baseline", Arc::clone(&reference), 1.0);
    let target = synthetic_codec("target", Arc::clone(&reference), 1.5);
    let sweep = base_config().sweep(&LADDER_KBPS).unwrap();

    let mut gate = RegressionGate::new(GateConfig::new(FRAME_LIMIT)).unwrap();
    let verdict = gate
        .run(&reference, &baseline, &sweep, &target, &sweep)
        .unwrap();

    match verdict {
        Verdict::Pass(result) => {
            assert!(
                result.bd_rate_percent < -10.0,
                "expected a clear improvement, got {:+.3}%",
                result.bd_rate_percent
            );
            assert_eq!(result.baseline.len(), LADDER_KBPS.len());
            assert_eq!(result.target.len(), LADDER_KBPS.len());
            // Achieved bitrates come out at exactly the targets.
            assert!((result.baseline[0].bitrate_kbps - 2000.0).abs() < 1e-9);
            assert!((result.baseline[5].bitrate_kbps - 12000.0).abs() < 1e-9);
        }
        other => panic!("expected Pass, got: {}", other.diagnostic()),
    }
}

#[test]
fn gate_reports_regression_as_inconclusive() {
    let reference = reference();
    let baseline = synthetic_codec("baseline", Arc::clone(&reference), 1.0);
    let regressed = synthetic_codec("regressed", Arc::clone(&reference), 0.6);
    let sweep = base_config().sweep(&LADDER_KBPS).unwrap();

    let mut gate = RegressionGate::new(GateConfig::new(FRAME_LIMIT)).unwrap();
    let verdict = gate
        .run(&reference, &baseline, &sweep, &regressed, &sweep)
        .unwrap();

    match verdict {
        Verdict::Inconclusive(result) => {
            assert!(result.bd_rate_percent > 0.0);
            // Diagnostics keep the full rate/PSNR tables for the log.
            let diag = result.diagnostic();
            assert!(diag.contains("baseline"));
            assert!(diag.contains("target"));
            assert!(diag.contains("BD-rate"));
        }
        other => panic!("expected Inconclusive, got: {}", other.diagnostic()),
    }
}

#[test]
fn gate_skips_when_encoder_lacks_capability() {
    let reference = reference();
    let baseline = synthetic_codec("baseline", Arc::clone(&reference), 1.0);

    // An encoder capped below the top of the ladder: unsupported config,
    // which must skip the whole comparison rather than fail it.
    let capped_ref = Arc::clone(&reference);
    let capped = VideoCodec::new(
        "capped",
        "1.0",
        Box::new(move |_, config| {
            if config.bitrate_kbps > 8000 {
                return Err(Error::UnsupportedConfig {
                    codec: "capped".to_string(),
                    config: config.summary(),
                });
            }
            let size = config.bitrate_kbps as usize * 1000 * FRAME_LIMIT
                / (8 * config.frame_rate as usize);
            let mut data = vec![0u8; size.max(2)];
            data[0] = offset_for(1.0, config.bitrate_kbps);
            Ok(data)
        }),
        Box::new(move |data| {
            let offset = data[0];
            Ok(capped_ref.frames()[..FRAME_LIMIT]
                .iter()
                .map(|f| YuvFrame {
                    y: f.y.iter().map(|&s| s + offset).collect(),
                    u: f.u.iter().map(|&s| s + offset).collect(),
                    v: f.v.iter().map(|&s| s + offset).collect(),
                })
                .collect())
        }),
    );

    let sweep = base_config().sweep(&LADDER_KBPS).unwrap();
    let mut gate = RegressionGate::new(GateConfig::new(FRAME_LIMIT)).unwrap();
    let verdict = gate
        .run(&reference, &baseline, &sweep, &capped, &sweep)
        .unwrap();

    match verdict {
        Verdict::Skipped { reason } => {
            assert!(reason.contains("Unsupported"), "reason: {reason}");
        }
        other => panic!("expected Skipped, got: {}", other.diagnostic()),
    }
}

#[test]
fn gate_rejects_mismatched_sweeps() {
    let reference = reference();
    let baseline = synthetic_codec("baseline", Arc::clone(&reference), 1.0);
    let target = synthetic_codec("target", Arc::clone(&reference), 1.5);
    let long = base_config().sweep(&LADDER_KBPS).unwrap();
    let short = base_config().sweep(&LADDER_KBPS[..4]).unwrap();

    let mut gate = RegressionGate::new(GateConfig::new(FRAME_LIMIT)).unwrap();
    let result = gate.run(&reference, &baseline, &long, &target, &short);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
