//! Session acceptance checks.
//!
//! A fixed, ordered battery of checks per camera against the reconstructed
//! timestamp array, the raw metadata counters, and the barcode-derived
//! lost-frame count. The first failing check raises with a message naming
//! the camera and the violated quantity; checks are not aggregated.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{CameraRole, FrameTimestampArray, VideoMetadata};

/// Acceptance tolerances.
///
/// These are empirically tuned constants, carried as configuration rather
/// than derived from first principles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Nominal camera frame rate, frames per second.
    #[serde(default = "default_nominal_frame_rate")]
    pub nominal_frame_rate: f64,

    /// Allowed deviation from the nominal frame rate.
    #[serde(default = "default_frame_rate_tolerance")]
    pub frame_rate_tolerance: f64,

    /// Lost-frame percentage above which a session is rejected.
    #[serde(default = "default_max_lost_frame_percentage")]
    pub max_lost_frame_percentage: f64,

    /// Allowed |expected-from-sync − actual-in-video| frame count gap.
    #[serde(default = "default_max_expected_minus_actual")]
    pub max_expected_minus_actual_frames: i64,
}

fn default_nominal_frame_rate() -> f64 {
    60.0
}

fn default_frame_rate_tolerance() -> f64 {
    0.05
}

fn default_max_lost_frame_percentage() -> f64 {
    0.05
}

fn default_max_expected_minus_actual() -> i64 {
    20
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            nominal_frame_rate: default_nominal_frame_rate(),
            frame_rate_tolerance: default_frame_rate_tolerance(),
            max_lost_frame_percentage: default_max_lost_frame_percentage(),
            max_expected_minus_actual_frames: default_max_expected_minus_actual(),
        }
    }
}

impl ValidationSettings {
    /// Whether a declared frame rate is within tolerance of nominal.
    pub fn is_acceptable_frame_rate(&self, frame_rate: f64) -> bool {
        (frame_rate - self.nominal_frame_rate).abs() <= self.frame_rate_tolerance
    }

    /// Whether a lost-frame percentage is low enough to accept.
    pub fn is_acceptable_lost_frame_percentage(&self, percentage: f64) -> bool {
        percentage < self.max_lost_frame_percentage
    }

    /// Whether the expected-minus-actual frame count gap is small enough.
    pub fn is_acceptable_expected_minus_actual(&self, expected_minus_actual: i64) -> bool {
        expected_minus_actual.abs() < self.max_expected_minus_actual_frames
    }
}

/// The quantity a validation check inspects, in battery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationCheck {
    /// Some real sync-derived timestamps exist.
    SyncCoverage,
    /// Video frame count vs. metadata-declared recorded count.
    FrameCountDiscrepancy,
    /// Video recording started no earlier than the timing source.
    StartOrder,
    /// Barcode-derived lost-frame count agrees with metadata.
    BarcodeLostFrames,
    /// Declared frame rate within tolerance.
    FrameRate,
    /// Lost-frame percentage below threshold.
    LostFramePercentage,
    /// Expected-from-sync vs. actual-in-video frame count gap.
    ExpectedMinusActual,
}

impl std::fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationCheck::SyncCoverage => "sync coverage",
            ValidationCheck::FrameCountDiscrepancy => "frame count discrepancy",
            ValidationCheck::StartOrder => "start order",
            ValidationCheck::BarcodeLostFrames => "barcode lost frames",
            ValidationCheck::FrameRate => "frame rate",
            ValidationCheck::LostFramePercentage => "lost frame percentage",
            ValidationCheck::ExpectedMinusActual => "expected minus actual frame count",
        };
        write!(f, "{name}")
    }
}

/// A failed acceptance check.
///
/// Fatal to overall session acceptance, but other cameras' independently
/// computed results stay valid.
#[derive(Debug, thiserror::Error)]
#[error("validation failed for camera '{camera}' ({check}): {message}")]
pub struct ValidationError {
    pub camera: CameraRole,
    pub check: ValidationCheck,
    pub message: String,
}

/// Everything the battery inspects for one camera.
#[derive(Debug, Clone, Copy)]
pub struct CameraCheckInputs<'a> {
    pub camera: CameraRole,
    /// Corrected per-frame timestamps.
    pub frame_times: &'a FrameTimestampArray,
    pub metadata: &'a VideoMetadata,
    /// Physical frames in the video file.
    pub num_frames_in_video: u64,
    pub video_start_time: NaiveDateTime,
    pub sync_start_time: NaiveDateTime,
    /// Barcode-derived lost-frame count, when the imprint is available.
    pub barcode_lost_frames: Option<i64>,
    /// Frames the timing system says should exist (transfers − lost + 1).
    pub num_frames_expected_from_sync: i64,
    /// Sync-derived timestamp count without correction applied.
    pub num_frames_from_sync: usize,
}

/// Run the ordered check battery for one camera.
///
/// Stops at the first failing check, so the error always names exactly one
/// violated invariant.
pub fn validate_camera(
    inputs: &CameraCheckInputs<'_>,
    settings: &ValidationSettings,
) -> Result<(), ValidationError> {
    let camera = inputs.camera;
    let fail = |check: ValidationCheck, message: String| ValidationError {
        camera,
        check,
        message,
    };

    // 1. some real sync-derived timestamps exist
    if inputs.frame_times.is_empty() || inputs.frame_times.all_nan() {
        return Err(fail(
            ValidationCheck::SyncCoverage,
            "no frames recorded on sync".to_string(),
        ));
    }

    // 2. the video may only exceed the declared count by the metadata frame
    let declared = inputs.metadata.frames_recorded;
    if inputs.num_frames_in_video as i64 - declared as i64 > 1 {
        return Err(fail(
            ValidationCheck::FrameCountDiscrepancy,
            format!(
                "frame count from video file ({}) does not match metadata ({declared})",
                inputs.num_frames_in_video
            ),
        ));
    }

    // 3. acquisition must start no earlier than the shared clock
    if inputs.video_start_time < inputs.sync_start_time {
        return Err(fail(
            ValidationCheck::StartOrder,
            format!(
                "video start time {} is before sync start time {}",
                inputs.video_start_time, inputs.sync_start_time
            ),
        ));
    }

    // 4. barcode evidence must agree with the metadata, when available
    if let Some(from_barcode) = inputs.barcode_lost_frames {
        let from_metadata = inputs.metadata.lost_frames.len() as i64;
        if from_barcode != from_metadata {
            return Err(fail(
                ValidationCheck::BarcodeLostFrames,
                format!(
                    "lost frame count from barcodes ({from_barcode}) does not match \
                     metadata ({from_metadata})"
                ),
            ));
        }
    }

    // 5. declared frame rate within tolerance
    if !settings.is_acceptable_frame_rate(inputs.metadata.fps) {
        return Err(fail(
            ValidationCheck::FrameRate,
            format!("invalid frame rate: {}", inputs.metadata.fps),
        ));
    }

    // 6. lost-frame percentage below threshold
    let lost_percentage = inputs.metadata.lost_frame_percentage();
    if !settings.is_acceptable_lost_frame_percentage(lost_percentage) {
        return Err(fail(
            ValidationCheck::LostFramePercentage,
            format!("lost frame percentage too high: {lost_percentage}"),
        ));
    }

    // 7. expected vs. actual frame count gap, waived when the uncorrected
    //    sync count matches the expected count exactly
    let expected_minus_actual =
        inputs.num_frames_expected_from_sync - inputs.num_frames_in_video as i64;
    if !settings.is_acceptable_expected_minus_actual(expected_minus_actual)
        && inputs.num_frames_from_sync as i64 != inputs.num_frames_expected_from_sync
    {
        return Err(fail(
            ValidationCheck::ExpectedMinusActual,
            format!("expected minus actual frame count too high: {expected_minus_actual}"),
        ));
    }

    Ok(())
}
