//! Report types and curve CSV import.
//!
//! A [`RegressionReport`] captures one gate run — both arms' measurement
//! points, the BD-rate, the threshold and the verdict — and serializes to
//! JSON or a flat CSV table. [`read_curve_csv`] imports externally
//! measured curves (schema: `bitrate_kbps,psnr_db`) so host-side results
//! can be gated offline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bdrate::{MeasurementPoint, RateDistortionCurve};
use crate::error::{Error, Result};
use crate::gate::Verdict;

/// Verdict label in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Target arm within tolerance.
    Pass,
    /// Regression detected; data retained, not a hard failure.
    Inconclusive,
    /// Unsupported configuration; comparison skipped.
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Inconclusive => write!(f, "inconclusive"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Serializable record of one regression-gate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Comparison name or identifier.
    pub name: String,

    /// Baseline arm label (e.g. codec id or "bframes=0").
    pub baseline_label: String,

    /// Target arm label.
    pub target_label: String,

    /// BD-rate threshold the gate applied.
    pub min_gain: f64,

    /// Gate outcome.
    pub outcome: Outcome,

    /// Computed BD-rate percentage, absent when skipped.
    pub bd_rate_percent: Option<f64>,

    /// Common quality range used for integration, dB, absent when skipped.
    pub overlap_db: Option<(f64, f64)>,

    /// Baseline arm measurement points.
    pub baseline_points: Vec<MeasurementPoint>,

    /// Target arm measurement points.
    pub target_points: Vec<MeasurementPoint>,

    /// Skip reason, present only for skipped runs.
    pub skip_reason: Option<String>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RegressionReport {
    /// Build a report from a gate verdict.
    #[must_use]
    pub fn from_verdict(
        name: impl Into<String>,
        baseline_label: impl Into<String>,
        target_label: impl Into<String>,
        min_gain: f64,
        verdict: &Verdict,
    ) -> Self {
        let (outcome, result, skip_reason) = match verdict {
            Verdict::Pass(result) => (Outcome::Pass, Some(result), None),
            Verdict::Inconclusive(result) => (Outcome::Inconclusive, Some(result), None),
            Verdict::Skipped { reason } => (Outcome::Skipped, None, Some(reason.clone())),
        };

        Self {
            name: name.into(),
            baseline_label: baseline_label.into(),
            target_label: target_label.into(),
            min_gain,
            outcome,
            bd_rate_percent: result.map(|r| r.bd_rate_percent),
            overlap_db: result.map(|r| (r.overlap_min_db, r.overlap_max_db)),
            baseline_points: result.map(|r| r.baseline.clone()).unwrap_or_default(),
            target_points: result.map(|r| r.target.clone()).unwrap_or_default(),
            skip_reason,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a report back from JSON.
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write both arms' points as a flat CSV table.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record(["name", "arm", "label", "bitrate_kbps", "psnr_db", "bd_rate_percent", "outcome"])?;
        let bd = self
            .bd_rate_percent
            .map_or(String::new(), |v| format!("{v:.4}"));
        for (arm, label, points) in [
            ("baseline", &self.baseline_label, &self.baseline_points),
            ("target", &self.target_label, &self.target_points),
        ] {
            for p in points {
                wtr.write_record([
                    self.name.clone(),
                    arm.to_string(),
                    label.clone(),
                    format!("{:.2}", p.bitrate_kbps),
                    format!("{:.3}", p.psnr_db),
                    bd.clone(),
                    self.outcome.to_string(),
                ])?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Import a rate-distortion curve from CSV (`bitrate_kbps,psnr_db` rows).
pub fn read_curve_csv(path: impl AsRef<Path>) -> Result<RateDistortionCurve> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut curve = RateDistortionCurve::new();
    for (index, record) in rdr.deserialize::<MeasurementPoint>().enumerate() {
        // Line 1 is the header row.
        let point = record.map_err(|e| Error::CsvImport {
            line: index + 2,
            reason: e.to_string(),
        })?;
        curve.push(point);
    }
    Ok(curve)
}

// Custom serialization keeps timestamps as RFC 3339 strings in JSON.
mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
