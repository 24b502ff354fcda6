//! Line identity resolver.
//!
//! Cameras can be plugged into the wrong sync line. Each camera is
//! configured with a deliberately distinguishing initial exposure time (the
//! "fingerprint", milliseconds, recorded in its metadata sidecar), and emits
//! a burst of fingerprint exposures at recording start. Measuring the actual
//! initial exposure duration on every physical exposing line and matching it
//! against the nominal fingerprints recovers the true wiring.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::AlignmentError;
use crate::models::{CameraMap, CameraRole, LineMapping, SyncLineRole, VideoMetadata};
use crate::sync::SyncSource;

/// Number of signature exposures emitted at recording start that the
/// duration measurement averages over.
const FINGERPRINT_EDGE_PAIRS: usize = 8;

/// Resolved mappings keyed by (timing-source identity, sorted video
/// identity set). Resolution is expensive and invariant per session, and
/// recordings are immutable once written, so entries never invalidate.
static MAPPING_CACHE: Lazy<Mutex<HashMap<(String, Vec<String>), LineMapping>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolve the mapping, consulting the session-keyed cache first.
///
/// `video_ids` identifies the video set the metadata came from; together
/// with the timing-source identity it forms the cache key.
pub fn resolve_line_mapping_cached(
    sync: &dyn SyncSource,
    metadata: &CameraMap<VideoMetadata>,
    video_ids: &[&str],
) -> Result<LineMapping, AlignmentError> {
    let mut ids: Vec<String> = video_ids.iter().map(|id| id.to_string()).collect();
    ids.sort();
    let key = (sync.source_id().to_string(), ids);

    if let Some(mapping) = MAPPING_CACHE.lock().get(&key) {
        return Ok(*mapping);
    }
    let mapping = resolve_line_mapping(sync, metadata)?;
    MAPPING_CACHE.lock().insert(key, mapping);
    Ok(mapping)
}

/// Determine which physical line role actually drives each camera.
///
/// Validates the wiring-order assumption first: sorting all six
/// first-rising-edge times, each role's readout line must start immediately
/// after its own exposing line. Then matches each camera's nominal
/// fingerprint duration against the measured signature duration of every
/// exposing line, taking the numerically closest line.
///
/// Ties keep the first line in canonical order; matching is not
/// deduplicated, so fingerprints configured too close together can collapse
/// onto one line. That degenerate outcome is detected after the fact and
/// fails resolution rather than silently mis-assigning.
pub fn resolve_line_mapping(
    sync: &dyn SyncSource,
    metadata: &CameraMap<VideoMetadata>,
) -> Result<LineMapping, AlignmentError> {
    validate_line_start_order(sync)?;

    let actual_durations: Vec<(SyncLineRole, f64)> = SyncLineRole::ALL
        .into_iter()
        .map(|line_role| Ok((line_role, measure_signature_duration_ms(sync, line_role)?)))
        .collect::<Result<_, AlignmentError>>()?;

    let mapping = LineMapping::new(CameraMap::try_from_fn(|camera| {
        let nominal = metadata.get(camera).initial_exposure_ms;
        closest_line(nominal, &actual_durations)
    })?);

    if !mapping.is_bijection() {
        let line_role = duplicated_line(&mapping);
        return Err(AlignmentError::AmbiguousFingerprints { line_role });
    }

    tracing::debug!("resolved camera line mapping: {mapping}");
    Ok(mapping)
}

/// Check that each role's readout line starts immediately after its own
/// exposing line in the six-way first-rising-edge ordering.
///
/// Exposing and readout signals for one physical camera are derived from the
/// same electrical events, so their starts must be adjacent; anything else
/// means the lines were connected to sync independently and fingerprint
/// matching cannot be trusted.
fn validate_line_start_order(sync: &dyn SyncSource) -> Result<(), AlignmentError> {
    let mut starts: Vec<(String, f64)> = Vec::with_capacity(6);
    for line_role in SyncLineRole::ALL {
        for label in [line_role.exposing_line(), line_role.readout_line()] {
            let time = first_rising_edge(sync, &label)?;
            starts.push((label, time));
        }
    }
    starts.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let order = |label: &str| -> usize {
        starts
            .iter()
            .position(|(l, _)| l == label)
            .unwrap_or(usize::MAX)
    };

    for line_role in SyncLineRole::ALL {
        let exposing_line = line_role.exposing_line();
        let readout_line = line_role.readout_line();
        let exposing_index = order(&exposing_line);
        let readout_index = order(&readout_line);
        if readout_index != exposing_index + 1 {
            return Err(AlignmentError::WiringAssumptionViolation {
                exposing_line,
                readout_line,
                exposing_index,
                readout_index,
            });
        }
    }
    Ok(())
}

fn first_rising_edge(sync: &dyn SyncSource, label: &str) -> Result<f64, AlignmentError> {
    sync.rising_edges(label)?
        .first()
        .copied()
        .ok_or_else(|| AlignmentError::EmptyLine {
            line: label.to_string(),
        })
}

/// Measure the signature initial exposure duration of one exposing line:
/// the mean of the first eight rising/falling pairs, in milliseconds,
/// rounded to the nearest integer as the recorder's fingerprints are.
fn measure_signature_duration_ms(
    sync: &dyn SyncSource,
    line_role: SyncLineRole,
) -> Result<f64, AlignmentError> {
    let label = line_role.exposing_line();
    let rising = sync.rising_edges(&label)?;
    let falling = sync.falling_edges(&label)?;

    let pairs = rising.len().min(falling.len()).min(FINGERPRINT_EDGE_PAIRS);
    if pairs == 0 {
        return Err(AlignmentError::EmptyLine { line: label });
    }

    let mean_secs: f64 = rising
        .iter()
        .zip(falling.iter())
        .take(pairs)
        .map(|(r, f)| f - r)
        .sum::<f64>()
        / pairs as f64;
    Ok((mean_secs * 1000.0).round())
}

fn closest_line(
    nominal_ms: f64,
    actual_durations: &[(SyncLineRole, f64)],
) -> Result<SyncLineRole, AlignmentError> {
    let mut best: Option<(SyncLineRole, f64)> = None;
    for (line_role, actual_ms) in actual_durations {
        let distance = (nominal_ms - actual_ms).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((*line_role, distance));
        }
    }
    // actual_durations always holds the three line roles
    best.map(|(line_role, _)| line_role)
        .ok_or(AlignmentError::EmptyLine {
            line: "cam_exposing".to_string(),
        })
}

fn duplicated_line(mapping: &LineMapping) -> SyncLineRole {
    for line_role in SyncLineRole::ALL {
        let assignments = CameraRole::ALL
            .into_iter()
            .filter(|camera| mapping.line_role(*camera) == line_role)
            .count();
        if assignments > 1 {
            return line_role;
        }
    }
    // unreachable when called on a non-bijective mapping, but total anyway
    SyncLineRole::Beh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarcodeGeometry;
    use crate::sync::EdgeTable;

    fn metadata_with_fingerprint(exposure_ms: f64) -> VideoMetadata {
        VideoMetadata {
            frames_recorded: 100,
            frames_lost_count: 0,
            lost_frames: vec![],
            fps: 60.0,
            start_time: "2023-08-03T12:04:30".parse().unwrap(),
            initial_exposure_ms: exposure_ms,
            barcode_geometry: BarcodeGeometry::default(),
            barcode_imprint_enabled: false,
            camera_input: None,
        }
    }

    fn session_metadata() -> CameraMap<VideoMetadata> {
        CameraMap::new(
            metadata_with_fingerprint(15.0),
            metadata_with_fingerprint(25.0),
            metadata_with_fingerprint(35.0),
        )
    }

    /// Edge arrays for one camera's exposing + readout lines: the exposing
    /// line starts at `start` with signature exposures of `duration_ms`,
    /// the readout line starts just after it.
    fn camera_lines(start: f64, duration_ms: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let rising: Vec<f64> = (0..10).map(|i| start + i as f64 / 60.0).collect();
        let falling: Vec<f64> = rising.iter().map(|r| r + duration_ms / 1000.0).collect();
        let readout_rising: Vec<f64> = rising.iter().map(|r| r + 0.001).collect();
        (rising, falling, readout_rising)
    }

    fn table_with(durations: CameraMap<f64>) -> EdgeTable {
        let mut table = EdgeTable::new("sync-a", "2023-08-03T12:04:15".parse().unwrap());
        for (index, line_role) in SyncLineRole::ALL.into_iter().enumerate() {
            let start = 1.0 + index as f64 * 0.01;
            let nominal = *durations.get(line_role.camera_role());
            let (rising, falling, readout) = camera_lines(start, nominal);
            table.insert_line(line_role.exposing_line(), rising, falling);
            table.insert_line(line_role.readout_line(), readout, vec![]);
        }
        table
    }

    #[test]
    fn correct_wiring_resolves_to_identity() {
        let table = table_with(CameraMap::new(15.0, 25.0, 35.0));
        let mapping = resolve_line_mapping(&table, &session_metadata()).unwrap();
        assert!(mapping.is_identity());
    }

    #[test]
    fn swapped_wiring_is_detected() {
        // eye's fingerprint shows up on the face line and vice versa
        let table = table_with(CameraMap::new(25.0, 15.0, 35.0));
        let mapping = resolve_line_mapping(&table, &session_metadata()).unwrap();
        assert!(!mapping.is_identity());
        assert!(mapping.is_bijection());
        assert_eq!(mapping.line_role(CameraRole::Eye), SyncLineRole::Face);
        assert_eq!(mapping.line_role(CameraRole::Face), SyncLineRole::Eye);
        assert_eq!(mapping.line_role(CameraRole::Behavior), SyncLineRole::Beh);
    }

    #[test]
    fn swapping_lines_and_fingerprints_restores_identity() {
        // symmetry: swapping two lines' wiring and their nominal
        // fingerprints reproduces the original logical mapping
        let table = table_with(CameraMap::new(25.0, 15.0, 35.0));
        let metadata = CameraMap::new(
            metadata_with_fingerprint(25.0),
            metadata_with_fingerprint(15.0),
            metadata_with_fingerprint(35.0),
        );
        let mapping = resolve_line_mapping(&table, &metadata).unwrap();
        assert!(mapping.is_identity());
    }

    #[test]
    fn readout_not_adjacent_to_exposing_aborts() {
        let mut table = table_with(CameraMap::new(15.0, 25.0, 35.0));
        // push the eye readout start past every other line's start
        let (rising, ..) = camera_lines(9.0, 15.0);
        table.insert_line(SyncLineRole::Eye.readout_line(), rising, vec![]);

        let err = resolve_line_mapping(&table, &session_metadata()).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::WiringAssumptionViolation { .. }
        ));
        assert!(err.to_string().contains("eye_cam_frame_readout"));
    }

    #[test]
    fn indistinguishable_fingerprints_abort() {
        // two lines measure identically; both eye and face collapse onto the
        // first of them
        let table = table_with(CameraMap::new(20.0, 20.0, 35.0));
        let metadata = CameraMap::new(
            metadata_with_fingerprint(20.0),
            metadata_with_fingerprint(20.0),
            metadata_with_fingerprint(35.0),
        );
        let err = resolve_line_mapping(&table, &metadata).unwrap_err();
        assert!(matches!(err, AlignmentError::AmbiguousFingerprints { .. }));
    }

    #[test]
    fn missing_line_surfaces_sync_error() {
        let table = table_with(CameraMap::new(15.0, 25.0, 35.0));
        let table = {
            let mut fresh = EdgeTable::new("sync-b", table.start_time());
            for label in table.line_labels() {
                if label != "eye_cam_exposing" {
                    fresh.insert_line(
                        label.clone(),
                        table.rising_edges(&label).unwrap(),
                        table.falling_edges(&label).unwrap(),
                    );
                }
            }
            fresh
        };
        let err = resolve_line_mapping(&table, &session_metadata()).unwrap_err();
        assert!(matches!(err, AlignmentError::Sync(_)));
    }

    #[test]
    fn cached_resolution_is_stable_per_session() {
        let table = table_with(CameraMap::new(15.0, 25.0, 35.0));
        let metadata = session_metadata();
        let videos = ["eye.mp4", "face.mp4", "behavior.mp4"];
        let first = resolve_line_mapping_cached(&table, &metadata, &videos).unwrap();
        let second = resolve_line_mapping_cached(&table, &metadata, &videos).unwrap();
        assert_eq!(first, second);
    }
}
