//! Frame-id barcode decoding.
//!
//! An independent cross-check of frame identity: the recorder imprints each
//! data frame with a binary barcode encoding the frame's index. Decoding the
//! last frame's barcode and subtracting its physical position yields a
//! frame-loss count sourced purely from pixel evidence, corroborating the
//! metadata-declared one.
//!
//! There is no barcode on the metadata frame (frame 0); the first proper
//! barcode carries the value 1.

mod decode;

pub use decode::{crop_barcode_strip, decode_barcode_strip};

#[cfg(test)]
pub(crate) use decode::test_support;

use crate::models::{BarcodeGeometry, VideoMetadata};
use crate::video::{VideoError, VideoSource};

/// Errors raised while decoding frame barcodes.
#[derive(Debug, thiserror::Error)]
pub enum BarcodeError {
    /// Frame-id imprinting was not enabled for this recording; there is no
    /// barcode to decode. Recoverable: callers may skip the cross-check.
    #[error("frame-id imprint not enabled in video; no barcode present")]
    NotEnabled,

    /// The video has no frames to decode.
    #[error("video '{source_id}' holds no frames")]
    EmptyVideo { source_id: String },

    /// The declared barcode region does not fit inside the frame.
    #[error(
        "barcode region {geometry:?} does not fit inside a {frame_width}x{frame_height} frame"
    )]
    RegionOutOfBounds {
        geometry: BarcodeGeometry,
        frame_width: u32,
        frame_height: u32,
    },

    /// The cropped strip is too small to hold the bit layout.
    #[error("barcode strip is {width}x{height} but the bit layout needs {required} columns")]
    StripTooNarrow {
        width: u32,
        height: u32,
        required: u32,
    },

    /// A non-metadata frame decoded to the reserved metadata value.
    #[error("barcode in frame {frame_number} decoded to 0, which only the metadata frame may hold")]
    UnexpectedMetadataValue { frame_number: u64 },

    /// Frame retrieval failure.
    #[error(transparent)]
    Video(#[from] VideoError),
}

/// Decode the frame index imprinted in one frame of a video.
///
/// Fails with [`BarcodeError::NotEnabled`] unless the metadata declares the
/// imprint. Frame 0 (the metadata frame) decodes to 0; any other frame
/// decoding to 0 is a defect and is surfaced, not silently fixed.
pub fn frame_number_from_barcode(
    video: &dyn VideoSource,
    metadata: &VideoMetadata,
    frame_number: u64,
) -> Result<u64, BarcodeError> {
    if !metadata.barcode_imprint_enabled {
        return Err(BarcodeError::NotEnabled);
    }
    let frame = video.luma_frame(frame_number)?;
    let strip = crop_barcode_strip(&frame, &metadata.barcode_geometry)?;
    let value = decode_barcode_strip(&strip)?;
    if value == 0 && frame_number != 0 {
        return Err(BarcodeError::UnexpectedMetadataValue { frame_number });
    }
    Ok(value)
}

/// Frame-loss count according to barcode evidence.
///
/// Decodes the barcode of the last physical frame and subtracts the frame's
/// 0-indexed position: with no frames lost the imprinted index equals the
/// position exactly, so any surplus is the number of frames the recorder
/// skipped.
pub fn lost_frames_from_barcode(
    video: &dyn VideoSource,
    metadata: &VideoMetadata,
) -> Result<i64, BarcodeError> {
    let frame_count = video.frame_count();
    if frame_count == 0 {
        return Err(BarcodeError::EmptyVideo {
            source_id: video.source_id().to_string(),
        });
    }
    let last_index = frame_count - 1;
    let value = frame_number_from_barcode(video, metadata, last_index)?;
    Ok(value as i64 - last_index as i64)
}
