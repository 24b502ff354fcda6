//! Per-camera diagnostic counters.

use serde::Serialize;

use crate::alignment::{reconstruct_frame_times, AlignmentError};
use crate::models::{CameraRole, LineMapping, VideoMetadata};
use crate::sync::SyncSource;

/// Signature exposures at recording start the duration estimate looks at.
const SIGNATURE_EXPOSURE_COUNT: usize = 10;

/// Frame accounting for one camera, combining timing-source counters,
/// metadata counters, and the physical video frame count.
///
/// Feeds the expected-vs-actual and lost-percentage acceptance checks, and
/// is useful on its own when triaging a rejected session.
#[derive(Debug, Clone, Serialize)]
pub struct AugmentedCameraInfo {
    /// Exposing-line rising edges recorded on sync.
    pub num_frames_exposed: usize,
    /// Readout-line rising edges recorded on sync (frame transfers).
    pub num_frames_transferred: usize,
    /// Physical frames in the video file.
    pub num_frames_in_video: u64,
    /// Frames the timing system says should exist: transfers − lost + 1.
    pub num_frames_expected_from_sync: i64,
    /// Gap between the timing system's expectation and the video file.
    pub expected_minus_actual: i64,
    /// Sync-derived timestamp count without correction applied.
    pub num_frames_from_sync: usize,
    /// Median of the first signature exposure durations, seconds, rounded
    /// to 3 decimals.
    pub signature_exposure_duration_secs: f64,
    /// Declared lost frames as a percentage of recorded frames.
    pub lost_frame_percentage: f64,
}

/// Compute the counters for one camera, using the resolved line mapping.
pub fn augment_camera_info(
    sync: &dyn SyncSource,
    mapping: &LineMapping,
    camera: CameraRole,
    metadata: &VideoMetadata,
    num_frames_in_video: u64,
) -> Result<AugmentedCameraInfo, AlignmentError> {
    let exposing_rising = sync.rising_edges(&mapping.exposing_line(camera))?;
    let exposing_falling = sync.falling_edges(&mapping.exposing_line(camera))?;
    let transfer_rising = sync.rising_edges(&mapping.readout_line(camera))?;

    let num_frames_exposed = exposing_rising.len();
    let num_frames_transferred = transfer_rising.len();
    let num_frames_expected_from_sync =
        num_frames_transferred as i64 - metadata.frames_lost_count as i64 + 1;

    let num_frames_from_sync =
        reconstruct_frame_times(sync, mapping, camera, metadata, num_frames_in_video, false)?
            .len();

    let signature_durations: Vec<f64> = exposing_rising
        .iter()
        .zip(exposing_falling.iter())
        .take(SIGNATURE_EXPOSURE_COUNT)
        .map(|(r, f)| f - r)
        .collect();

    Ok(AugmentedCameraInfo {
        num_frames_exposed,
        num_frames_transferred,
        num_frames_in_video,
        num_frames_expected_from_sync,
        expected_minus_actual: num_frames_expected_from_sync - num_frames_in_video as i64,
        num_frames_from_sync,
        signature_exposure_duration_secs: round_to_3(median(&signature_durations)),
        lost_frame_percentage: metadata.lost_frame_percentage(),
    })
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BarcodeGeometry, CameraMap};
    use crate::sync::EdgeTable;

    fn metadata(lost: Vec<usize>) -> VideoMetadata {
        VideoMetadata {
            frames_recorded: 9,
            frames_lost_count: lost.len() as u64,
            lost_frames: lost,
            fps: 60.0,
            start_time: "2023-08-03T12:04:30".parse().unwrap(),
            initial_exposure_ms: 15.0,
            barcode_geometry: BarcodeGeometry::default(),
            barcode_imprint_enabled: false,
            camera_input: None,
        }
    }

    fn table() -> EdgeTable {
        let rising: Vec<f64> = (0..10).map(|i| 1.0 + i as f64 / 60.0).collect();
        let falling: Vec<f64> = rising.iter().map(|r| r + 0.015).collect();
        let transfers: Vec<f64> = rising.iter().map(|r| r + 0.001).collect();
        EdgeTable::new("sync-a", "2023-08-03T12:04:15".parse().unwrap())
            .with_line("eye_cam_exposing", rising, falling)
            .with_line("eye_cam_frame_readout", transfers, vec![])
    }

    #[test]
    fn counters_add_up() {
        let info = augment_camera_info(
            &table(),
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata(vec![]),
            10,
        )
        .unwrap();

        assert_eq!(info.num_frames_exposed, 10);
        assert_eq!(info.num_frames_transferred, 10);
        assert_eq!(info.num_frames_expected_from_sync, 11);
        assert_eq!(info.expected_minus_actual, 1);
        // 10 edges + metadata frame, uncorrected
        assert_eq!(info.num_frames_from_sync, 11);
        assert_eq!(info.signature_exposure_duration_secs, 0.015);
        assert_eq!(info.lost_frame_percentage, 0.0);
    }

    #[test]
    fn lost_frames_shift_expectation_and_uncorrected_count() {
        let info = augment_camera_info(
            &table(),
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata(vec![3, 4]),
            9,
        )
        .unwrap();

        assert_eq!(info.num_frames_expected_from_sync, 9);
        assert_eq!(info.expected_minus_actual, 0);
        // two lost positions removed before the metadata frame is prepended
        assert_eq!(info.num_frames_from_sync, 9);
    }

    #[test]
    fn median_of_even_count_averages_middles() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[2.0]), 2.0);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn mapping_redirects_counters_to_wired_line() {
        // augmented counters follow the resolved mapping, so a mis-wired
        // eye camera is counted from the line it is actually plugged into
        let mut table = table();
        table.insert_line("face_cam_exposing", vec![2.0], vec![2.015]);
        table.insert_line("face_cam_frame_readout", vec![2.001], vec![]);
        let mapping = LineMapping::new(CameraMap::new(
            crate::models::SyncLineRole::Face,
            crate::models::SyncLineRole::Eye,
            crate::models::SyncLineRole::Beh,
        ));
        let info = augment_camera_info(&table, &mapping, CameraRole::Eye, &metadata(vec![]), 2)
            .unwrap();
        assert_eq!(info.num_frames_exposed, 1);
        assert_eq!(info.num_frames_transferred, 1);
    }
}
