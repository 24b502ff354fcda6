//! Session-level orchestration.
//!
//! A [`SessionDataset`] owns one timing source and the three camera
//! recordings of a session, and computes derived values on demand. Every
//! derived value is a pure function of the immutable recordings, so results
//! are memoized for the session's lifetime and never invalidated.

mod augmented;
mod lick;

pub use augmented::{augment_camera_info, AugmentedCameraInfo};
pub use lick::{lick_frames_from_metadata, lick_frames_from_sync, LICK_SENSOR_LINE};

use chrono::NaiveDateTime;
use once_cell::sync::OnceCell;

use crate::alignment::{
    reconstruct_all, reconstruct_frame_times, resolve_line_mapping_cached, AlignmentError,
};
use crate::barcode::{lost_frames_from_barcode, BarcodeError};
use crate::config::Settings;
use crate::models::{
    CameraMap, CameraRole, FrameTimestampArray, LineMapping, MetadataError, VideoMetadata,
};
use crate::sync::{SyncError, SyncSource};
use crate::validation::{validate_camera, CameraCheckInputs, ValidationError};
use crate::video::VideoSource;

/// Errors surfaced by session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Barcode(#[from] BarcodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Lick events cannot be indexed against a timestamp array that carries
    /// no real timestamps.
    #[error("behavior camera has no sync-timestamped frames to index licks against")]
    NoTimestampedFrames,
}

/// One camera's video plus its ingested metadata sidecar.
pub struct CameraRecording {
    pub video: Box<dyn VideoSource>,
    pub metadata: VideoMetadata,
}

impl CameraRecording {
    /// Pair a video source with its metadata.
    pub fn new(video: impl VideoSource + 'static, metadata: VideoMetadata) -> Self {
        Self {
            video: Box::new(video),
            metadata,
        }
    }
}

/// All data for one recording session: the shared timing source and one
/// recording per camera role.
///
/// Derived values are computed on first access and cached; the underlying
/// recordings are immutable once written, so no invalidation path exists.
pub struct SessionDataset {
    sync: Box<dyn SyncSource>,
    cameras: CameraMap<CameraRecording>,
    settings: Settings,
    line_mapping: OnceCell<LineMapping>,
    frame_times: OnceCell<CameraMap<FrameTimestampArray>>,
    augmented: OnceCell<CameraMap<AugmentedCameraInfo>>,
    barcode_lost_frames: OnceCell<CameraMap<Option<i64>>>,
}

impl SessionDataset {
    /// Assemble a session from its timing source and camera recordings.
    pub fn new(sync: impl SyncSource + 'static, cameras: CameraMap<CameraRecording>) -> Self {
        Self::with_settings(sync, cameras, Settings::default())
    }

    /// Assemble a session with explicit settings.
    pub fn with_settings(
        sync: impl SyncSource + 'static,
        cameras: CameraMap<CameraRecording>,
        settings: Settings,
    ) -> Self {
        Self {
            sync: Box::new(sync),
            cameras,
            settings,
            line_mapping: OnceCell::new(),
            frame_times: OnceCell::new(),
            augmented: OnceCell::new(),
            barcode_lost_frames: OnceCell::new(),
        }
    }

    /// The session's timing source.
    pub fn sync(&self) -> &dyn SyncSource {
        self.sync.as_ref()
    }

    /// One camera's recording.
    pub fn camera(&self, role: CameraRole) -> &CameraRecording {
        self.cameras.get(role)
    }

    /// The session's settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn metadata_map(&self) -> CameraMap<VideoMetadata> {
        self.cameras.map(|_, recording| recording.metadata.clone())
    }

    /// Physical frame count per camera video.
    pub fn video_frame_counts(&self) -> CameraMap<u64> {
        self.cameras.map(|_, recording| recording.video.frame_count())
    }

    /// Wall-clock recording start per camera, from metadata.
    pub fn video_start_times(&self) -> CameraMap<NaiveDateTime> {
        self.cameras.map(|_, recording| recording.metadata.start_time)
    }

    /// The resolved camera-to-line mapping for this session.
    pub fn line_mapping(&self) -> Result<LineMapping, AlignmentError> {
        self.line_mapping
            .get_or_try_init(|| {
                let video_ids: Vec<&str> = self
                    .cameras
                    .values()
                    .into_iter()
                    .map(|recording| recording.video.source_id())
                    .collect();
                resolve_line_mapping_cached(self.sync.as_ref(), &self.metadata_map(), &video_ids)
            })
            .map(|mapping| *mapping)
    }

    /// Corrected per-frame sync-clock timestamps for each camera.
    ///
    /// Array lengths equal the physical frame counts (unless correction has
    /// been disabled in the settings).
    pub fn frame_times(&self) -> Result<&CameraMap<FrameTimestampArray>, AlignmentError> {
        self.frame_times.get_or_try_init(|| {
            let mapping = self.line_mapping()?;
            reconstruct_all(
                self.sync.as_ref(),
                &mapping,
                &self.metadata_map(),
                &self.video_frame_counts(),
                self.settings.reconstruction.apply_correction,
            )
        })
    }

    /// Uncorrected timestamps for one camera: raw edge count minus lost
    /// frames plus the metadata frame, with no length reconciliation.
    /// Diagnostic only; not cached.
    pub fn frame_times_uncorrected(
        &self,
        camera: CameraRole,
    ) -> Result<FrameTimestampArray, AlignmentError> {
        let mapping = self.line_mapping()?;
        let recording = self.cameras.get(camera);
        reconstruct_frame_times(
            self.sync.as_ref(),
            &mapping,
            camera,
            &recording.metadata,
            recording.video.frame_count(),
            false,
        )
    }

    /// Diagnostic frame counters per camera.
    pub fn augmented_camera_info(&self) -> Result<&CameraMap<AugmentedCameraInfo>, AlignmentError> {
        self.augmented.get_or_try_init(|| {
            let mapping = self.line_mapping()?;
            CameraMap::try_from_fn(|camera| {
                let recording = self.cameras.get(camera);
                augment_camera_info(
                    self.sync.as_ref(),
                    &mapping,
                    camera,
                    &recording.metadata,
                    recording.video.frame_count(),
                )
            })
        })
    }

    /// Barcode-derived lost-frame count per camera, `None` where the
    /// recording carries no frame-id imprint.
    pub fn lost_frames_from_barcodes(&self) -> Result<&CameraMap<Option<i64>>, SessionError> {
        self.barcode_lost_frames.get_or_try_init(|| {
            CameraMap::try_from_fn(|camera| {
                let recording = self.cameras.get(camera);
                match lost_frames_from_barcode(recording.video.as_ref(), &recording.metadata) {
                    Ok(count) => Ok(Some(count)),
                    Err(BarcodeError::NotEnabled) => {
                        tracing::debug!(
                            "camera '{camera}' has no frame-id imprint; skipping barcode cross-check"
                        );
                        Ok(None)
                    }
                    Err(error) => Err(SessionError::from(error)),
                }
            })
        })
    }

    /// Behavior-camera frame index (or raw metadata event value) per lick.
    ///
    /// Uses the timing source's lick line when present, otherwise falls back
    /// to the behavior metadata's `CameraInput` encoding.
    pub fn lick_frames(&self) -> Result<Vec<u64>, SessionError> {
        if self.sync.has_line(LICK_SENSOR_LINE) {
            let behavior_times = self.frame_times()?.get(CameraRole::Behavior);
            lick_frames_from_sync(self.sync.as_ref(), behavior_times)
        } else {
            Ok(lick_frames_from_metadata(
                &self.cameras.get(CameraRole::Behavior).metadata,
            )?)
        }
    }

    /// Check that all data required for processing is present and
    /// consistent.
    ///
    /// Runs the ordered acceptance battery per camera; the first failing
    /// check raises with the camera and violated quantity. A mis-wired but
    /// otherwise consistent session passes (with a warning at
    /// reconstruction time).
    pub fn validate(&self) -> Result<(), SessionError> {
        let frame_times = self.frame_times()?;
        let augmented = self.augmented_camera_info()?;
        let barcode_lost_frames = self.lost_frames_from_barcodes()?;
        let sync_start_time = self.sync.start_time();

        for camera in CameraRole::ALL {
            let recording = self.cameras.get(camera);
            let info = augmented.get(camera);
            validate_camera(
                &CameraCheckInputs {
                    camera,
                    frame_times: frame_times.get(camera),
                    metadata: &recording.metadata,
                    num_frames_in_video: recording.video.frame_count(),
                    video_start_time: recording.metadata.start_time,
                    sync_start_time,
                    barcode_lost_frames: *barcode_lost_frames.get(camera),
                    num_frames_expected_from_sync: info.num_frames_expected_from_sync,
                    num_frames_from_sync: info.num_frames_from_sync,
                },
                &self.settings.validation,
            )?;
            tracing::debug!("camera '{camera}' passed validation");
        }
        Ok(())
    }
}
