//! Frame time reconstruction.
//!
//! Builds the authoritative per-camera array of sync-clock frame timestamps
//! from the (correctly identified) exposing-line rising edges. The recorder
//! prepends a non-data metadata frame to every video, drops frames it could
//! not keep up with, and historically had two pulse-accounting defects:
//! it could stop emitting timing pulses slightly before stopping capture
//! (video frames with no pulse), and it could record extra pulses with no
//! matching frame. Correction pads or truncates accordingly so the output
//! length always equals the physical frame count.

use std::collections::HashSet;

use super::AlignmentError;
use crate::models::{CameraMap, CameraRole, FrameTimestampArray, LineMapping, VideoMetadata};
use crate::sync::SyncSource;

/// Remove the entries at the lost-frame positions, preserving order.
///
/// `lost` holds 0-indexed positions into `times`; removing an empty set
/// returns the input unchanged.
pub fn remove_lost_frame_times(times: &[f64], lost: &[usize]) -> Vec<f64> {
    let lost: HashSet<usize> = lost.iter().copied().collect();
    times
        .iter()
        .enumerate()
        .filter(|(index, _)| !lost.contains(index))
        .map(|(_, time)| *time)
        .collect()
}

/// Reconstruct the per-frame timestamp array for one camera.
///
/// With `apply_correction` (the default mode) the result length is asserted
/// to equal `frames_in_video` exactly, since downstream consumers index
/// frames by position. Without it the raw, possibly length-mismatched array
/// is returned for diagnostic comparison only.
pub fn reconstruct_frame_times(
    sync: &dyn SyncSource,
    mapping: &LineMapping,
    camera: CameraRole,
    metadata: &VideoMetadata,
    frames_in_video: u64,
    apply_correction: bool,
) -> Result<FrameTimestampArray, AlignmentError> {
    let exposing_line = mapping.exposing_line(camera);
    let edges = sync.rising_edges(&exposing_line)?;

    let mut times = remove_lost_frame_times(&edges, &metadata.lost_frames);
    // metadata frame occupies video index 0 and has no sync pulse
    times.insert(0, f64::NAN);

    if apply_correction {
        let expected = frames_in_video as usize;
        if expected > times.len() {
            // frames present in the video but never registered on sync
            times.resize(expected, f64::NAN);
        } else if times.len() > expected {
            // sync pulses that do not correspond to frames in the video
            times.truncate(expected);
        }
        if times.len() != expected {
            return Err(AlignmentError::UnreconciledFrameCount {
                camera,
                expected: frames_in_video,
                actual: times.len(),
            });
        }
    }

    Ok(FrameTimestampArray::from_times(times))
}

/// Reconstruct timestamp arrays for all three cameras.
///
/// Logs a warning when the resolved mapping is not the identity: the session
/// is still usable, but the rig is wired incorrectly and should be checked
/// if the recording is recent.
pub fn reconstruct_all(
    sync: &dyn SyncSource,
    mapping: &LineMapping,
    metadata: &CameraMap<VideoMetadata>,
    frames_in_video: &CameraMap<u64>,
    apply_correction: bool,
) -> Result<CameraMap<FrameTimestampArray>, AlignmentError> {
    if !mapping.is_identity() {
        tracing::warn!(
            "camera lines are plugged into sync incorrectly - accommodating, but if this \
             is a recent session check the rig: {mapping}"
        );
    }
    CameraMap::try_from_fn(|camera| {
        reconstruct_frame_times(
            sync,
            mapping,
            camera,
            metadata.get(camera),
            *frames_in_video.get(camera),
            apply_correction,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarcodeGeometry;
    use crate::sync::EdgeTable;

    fn metadata_with_lost(lost_frames: Vec<usize>) -> VideoMetadata {
        VideoMetadata {
            frames_recorded: 99,
            frames_lost_count: lost_frames.len() as u64,
            lost_frames,
            fps: 60.0,
            start_time: "2023-08-03T12:04:30".parse().unwrap(),
            initial_exposure_ms: 15.0,
            barcode_geometry: BarcodeGeometry::default(),
            barcode_imprint_enabled: false,
            camera_input: None,
        }
    }

    fn table_with_eye_edges(edges: Vec<f64>) -> EdgeTable {
        EdgeTable::new("sync-a", "2023-08-03T12:04:15".parse().unwrap()).with_line(
            "eye_cam_exposing",
            edges,
            vec![],
        )
    }

    fn hundred_edges() -> Vec<f64> {
        (1..=100).map(|i| i as f64 * 0.1).collect()
    }

    #[test]
    fn removal_preserves_order_and_removes_exact_indices() {
        let times = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(remove_lost_frame_times(&times, &[1, 3]), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn removing_empty_set_returns_input_unchanged() {
        let times = vec![1.0, 2.0, 3.0];
        assert_eq!(remove_lost_frame_times(&times, &[]), times);
    }

    #[test]
    fn reconstructs_exact_length_with_lost_frame() {
        // 100 raw edges, frame 5 lost, video holds 99 data frames + metadata
        let table = table_with_eye_edges(hundred_edges());
        let metadata = metadata_with_lost(vec![5]);
        let times = reconstruct_frame_times(
            &table,
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata,
            100,
            true,
        )
        .unwrap();

        assert_eq!(times.len(), 100);
        assert!(times[0].is_nan());
        // edges shift down across the removed position: the raw 0.6 is gone
        assert!((times[5] - 0.5).abs() < 1e-9);
        assert!((times[6] - 0.7).abs() < 1e-9);
        assert!(!times.as_slice().iter().any(|t| (t - 0.6).abs() < 1e-6));
    }

    #[test]
    fn pads_with_nan_when_video_outruns_sync() {
        // recorder stopped pulsing before it stopped capturing
        let table = table_with_eye_edges(vec![0.1, 0.2, 0.3]);
        let times = reconstruct_frame_times(
            &table,
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata_with_lost(vec![]),
            7,
            true,
        )
        .unwrap();
        assert_eq!(times.len(), 7);
        assert!(times[4].is_nan() && times[6].is_nan());
        assert_eq!(times.num_timestamped(), 3);
    }

    #[test]
    fn truncates_when_sync_outruns_video() {
        // extra unmatched pulses at the end of the recording
        let table = table_with_eye_edges(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let times = reconstruct_frame_times(
            &table,
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata_with_lost(vec![]),
            4,
            true,
        )
        .unwrap();
        assert_eq!(times.len(), 4);
        assert_eq!(times[3], 0.3);
    }

    #[test]
    fn uncorrected_mode_keeps_raw_length() {
        let table = table_with_eye_edges(vec![0.1, 0.2, 0.3]);
        let times = reconstruct_frame_times(
            &table,
            &LineMapping::identity(),
            CameraRole::Eye,
            &metadata_with_lost(vec![]),
            7,
            false,
        )
        .unwrap();
        // 3 edges + metadata frame, no padding to the video's 7
        assert_eq!(times.len(), 4);
    }

    #[test]
    fn mapping_redirects_to_the_wired_line() {
        let mut table = table_with_eye_edges(vec![0.1, 0.2, 0.3]);
        table.insert_line("face_cam_exposing", vec![5.1, 5.2, 5.3], vec![]);
        // eye is physically wired to the face line
        let mapping = LineMapping::new(CameraMap::new(
            crate::models::SyncLineRole::Face,
            crate::models::SyncLineRole::Eye,
            crate::models::SyncLineRole::Beh,
        ));
        let times = reconstruct_frame_times(
            &table,
            &mapping,
            CameraRole::Eye,
            &metadata_with_lost(vec![]),
            4,
            true,
        )
        .unwrap();
        assert_eq!(times[1], 5.1);
    }
}
