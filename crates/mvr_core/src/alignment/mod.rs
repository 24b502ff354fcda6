//! Sync-clock alignment engine.
//!
//! Two components live here:
//! - the line identity resolver, which recovers the true mapping between
//!   logical camera roles and the physical sync lines driving them
//!   (cameras can be plugged into the wrong line), and
//! - the frame time reconstructor, which turns raw exposing-line edges into
//!   one sync-clock timestamp per physical video frame, accounting for lost
//!   frames, the prepended metadata frame, and the recorder's historical
//!   start/stop pulse defects.

mod frame_times;
mod resolver;

pub use frame_times::{reconstruct_all, reconstruct_frame_times, remove_lost_frame_times};
pub use resolver::{resolve_line_mapping, resolve_line_mapping_cached};

use crate::models::{CameraRole, MetadataError, SyncLineRole};
use crate::sync::SyncError;

/// Errors raised during line resolution and frame-time reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    /// The readout line did not start immediately after its own exposing
    /// line in the first-rising-edge ordering. The wiring assumption the
    /// resolver depends on does not hold; resolution aborts rather than
    /// guessing (are lines connected to sync separately?).
    #[error(
        "expected {readout_line} (start order {readout_index}) to start immediately after \
         {exposing_line} (start order {exposing_index}); sync wiring assumption does not hold"
    )]
    WiringAssumptionViolation {
        exposing_line: String,
        readout_line: String,
        exposing_index: usize,
        readout_index: usize,
    },

    /// Fingerprint matching assigned the same physical line to more than one
    /// camera; the configured exposure fingerprints are too close to
    /// distinguish.
    #[error("fingerprint matching is ambiguous: line '{line_role}_cam_exposing' matched more than one camera")]
    AmbiguousFingerprints { line_role: SyncLineRole },

    /// A line needed for resolution recorded no edges.
    #[error("sync line '{line}' recorded no edges")]
    EmptyLine { line: String },

    /// After correction the timestamp array still disagrees with the
    /// physical frame count.
    #[error("expected {expected} frame times for camera '{camera}', got {actual} after correction")]
    UnreconciledFrameCount {
        camera: CameraRole,
        expected: u64,
        actual: usize,
    },

    /// Timing-source failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Metadata ingestion failure.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
