//! Lick-sensor event lookup.
//!
//! Sessions with a lick sensor record its transitions either as a digital
//! line on the timing source (preferred) or, in older recordings, as an
//! encoded `CameraInput` string in the behavior camera's metadata.

use crate::models::{parse_camera_input, FrameTimestampArray, MetadataError, VideoMetadata};
use crate::sync::SyncSource;

use super::SessionError;

/// Sync line carrying lick-sensor transitions.
pub const LICK_SENSOR_LINE: &str = "lick_sensor";

/// Behavior-camera frame index for each lick event on the sync clock.
///
/// Each lick time maps to the frame whose timestamp is nearest, skipping
/// frames with no sync-derived timestamp.
pub fn lick_frames_from_sync(
    sync: &dyn SyncSource,
    behavior_times: &FrameTimestampArray,
) -> Result<Vec<u64>, SessionError> {
    let lick_times = sync.rising_edges(LICK_SENSOR_LINE)?;
    lick_times
        .iter()
        .map(|time| {
            behavior_times
                .closest_index(*time)
                .map(|index| index as u64)
                .ok_or(SessionError::NoTimestampedFrames)
        })
        .collect()
}

/// Lick events from the behavior camera's metadata encoding.
///
/// Fallback for sessions whose timing source has no lick line. Fails with
/// [`MetadataError::LickInputNotRecorded`] when the sensor was not wired.
pub fn lick_frames_from_metadata(metadata: &VideoMetadata) -> Result<Vec<u64>, MetadataError> {
    match &metadata.camera_input {
        Some(values) => parse_camera_input(values),
        None => Err(MetadataError::LickInputNotRecorded),
    }
}
