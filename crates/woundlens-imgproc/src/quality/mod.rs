//! Per-frame capture quality gate.
//!
//! A luma plane from the camera preview is scored on four independent checks
//! and the capture button is enabled only when all of them pass:
//!
//! - **tilt**: device pitch and roll are both within [`MAX_TILT_DEGREES`]
//! - **light**: the mean luma lies in [`MIN_LIGHT_LUMA`, `MAX_LIGHT_LUMA`]
//! - **glare**: at most [`MAX_GLARE_FRACTION`] of the samples are saturated
//! - **blur**: the Laplacian variance reaches [`MIN_BLUR_SCORE`]
//!
//! # Example
//!
//! ```
//! use woundlens_image::LumaPlane;
//! use woundlens_imgproc::quality::QualityGate;
//!
//! let data = vec![128u8; 640 * 480];
//! let plane = LumaPlane::packed(&data, 640, 480);
//!
//! let result = QualityGate::default().evaluate(2.0, -1.5, &plane);
//!
//! assert!(result.tilt_pass && result.light_pass && result.glare_pass);
//! // a flat frame has no detail at all
//! assert!(!result.blur_pass && !result.overall_pass);
//! ```

mod blur;

pub use blur::{
    blur_score, downsample, grid_size, laplacian_variance, DownsampledGrid, BLUR_MIN_DIMENSION,
    BLUR_TARGET_WIDTH,
};

use serde::{Deserialize, Serialize};
use woundlens_image::LumaPlane;

/// Default spacing in pixels between luma samples on both axes.
pub const DEFAULT_SAMPLE_STRIDE: usize = 4;

/// Luma at or above which a sample counts as glare.
pub const GLARE_LUMA: u8 = 250;

/// Maximum absolute pitch and roll in degrees.
pub const MAX_TILT_DEGREES: f64 = 10.0;

/// Lower bound of the accepted mean luma.
pub const MIN_LIGHT_LUMA: f64 = 60.0;

/// Upper bound of the accepted mean luma.
pub const MAX_LIGHT_LUMA: f64 = 200.0;

/// Maximum accepted fraction of glare samples.
pub const MAX_GLARE_FRACTION: f64 = 0.03;

/// Minimum accepted blur score.
pub const MIN_BLUR_SCORE: f64 = 18.0;

/// Outcome of one quality evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcResult {
    /// Device pitch in degrees.
    pub pitch_deg: f64,
    /// Device roll in degrees.
    pub roll_deg: f64,
    /// Mean luma of the strided samples.
    pub mean_luma: f64,
    /// Fraction of strided samples at or above [`GLARE_LUMA`].
    pub glare_pct: f64,
    /// Laplacian variance of the downsampled grid.
    pub blur_score: f64,
    /// Tilt check.
    pub tilt_pass: bool,
    /// Lighting check.
    pub light_pass: bool,
    /// Glare check.
    pub glare_pass: bool,
    /// Sharpness check.
    pub blur_pass: bool,
    /// All four checks passed.
    pub overall_pass: bool,
}

impl QcResult {
    /// The result reported for frames that cannot be analyzed.
    pub fn worst_case(pitch_deg: f64, roll_deg: f64) -> Self {
        Self {
            pitch_deg,
            roll_deg,
            mean_luma: 0.0,
            glare_pct: 1.0,
            blur_score: 0.0,
            tilt_pass: false,
            light_pass: false,
            glare_pass: false,
            blur_pass: false,
            overall_pass: false,
        }
    }

    /// Status label stored with a capture.
    pub fn status(&self) -> QcStatus {
        if self.overall_pass {
            QcStatus::Pass
        } else {
            QcStatus::Warn
        }
    }

    /// Snapshot of the result stored alongside a capture.
    ///
    /// Measurements are rounded the way they are displayed: two decimals,
    /// six for the glare fraction.
    pub fn guidance_metrics(&self, timestamp_millis: i64, qc_status: QcStatus) -> GuidanceMetrics {
        GuidanceMetrics {
            timestamp_millis,
            pitch_deg: round_to(self.pitch_deg, 2),
            roll_deg: round_to(self.roll_deg, 2),
            mean_luma: round_to(self.mean_luma, 2),
            glare_pct: round_to(self.glare_pct, 6),
            blur_score: round_to(self.blur_score, 2),
            tilt_pass: self.tilt_pass,
            light_pass: self.light_pass,
            glare_pass: self.glare_pass,
            blur_pass: self.blur_pass,
            overall_pass: self.overall_pass,
            qc_status,
        }
    }
}

/// Whether a capture was taken with all checks passing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QcStatus {
    /// Every check passed.
    Pass,
    /// At least one check failed; the capture was taken anyway.
    Warn,
}

/// Guidance metrics persisted with a capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GuidanceMetrics {
    pub timestamp_millis: i64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub mean_luma: f64,
    pub glare_pct: f64,
    pub blur_score: f64,
    pub tilt_pass: bool,
    pub light_pass: bool,
    pub glare_pass: bool,
    pub blur_pass: bool,
    pub overall_pass: bool,
    pub qc_status: QcStatus,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Stateless scorer for preview frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityGate {
    sample_stride: usize,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
        }
    }
}

impl QualityGate {
    /// Use a different luma sampling stride; zero is treated as one.
    pub fn with_sample_stride(mut self, stride: usize) -> Self {
        self.sample_stride = stride.max(1);
        self
    }

    /// The luma sampling stride.
    pub fn sample_stride(&self) -> usize {
        self.sample_stride
    }

    /// Score a frame.
    ///
    /// * `pitch_deg` - Device pitch in degrees.
    /// * `roll_deg` - Device roll in degrees.
    /// * `plane` - The luma plane of the frame.
    ///
    /// Empty planes and planes whose layout does not fit their buffer yield
    /// [`QcResult::worst_case`].
    pub fn evaluate(&self, pitch_deg: f64, roll_deg: f64, plane: &LumaPlane) -> QcResult {
        if let Err(err) = plane.validate() {
            log::warn!("unreadable luma plane: {err}");
            return QcResult::worst_case(pitch_deg, roll_deg);
        }
        if plane.width() == 0 || plane.height() == 0 {
            log::warn!("empty luma plane {}x{}", plane.width(), plane.height());
            return QcResult::worst_case(pitch_deg, roll_deg);
        }

        let (mean_luma, glare_pct) = self.luma_stats(plane);
        let blur_score = blur_score(plane);

        let tilt_pass = pitch_deg.abs() <= MAX_TILT_DEGREES && roll_deg.abs() <= MAX_TILT_DEGREES;
        let light_pass = (MIN_LIGHT_LUMA..=MAX_LIGHT_LUMA).contains(&mean_luma);
        let glare_pass = glare_pct <= MAX_GLARE_FRACTION;
        let blur_pass = blur_score >= MIN_BLUR_SCORE;

        QcResult {
            pitch_deg,
            roll_deg,
            mean_luma,
            glare_pct,
            blur_score,
            tilt_pass,
            light_pass,
            glare_pass,
            blur_pass,
            overall_pass: tilt_pass && light_pass && glare_pass && blur_pass,
        }
    }

    // mean luma and glare fraction over the strided samples
    fn luma_stats(&self, plane: &LumaPlane) -> (f64, f64) {
        let mut sum = 0u64;
        let mut glare = 0u64;
        let mut count = 0u64;

        for y in (0..plane.height()).step_by(self.sample_stride) {
            for x in (0..plane.width()).step_by(self.sample_stride) {
                let Some(luma) = plane.get(x, y) else {
                    continue;
                };
                sum += u64::from(luma);
                glare += u64::from(luma >= GLARE_LUMA);
                count += 1;
            }
        }

        if count == 0 {
            return (0.0, 1.0);
        }
        (sum as f64 / count as f64, glare as f64 / count as f64)
    }
}
