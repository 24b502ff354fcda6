//! Video-source collaborator interface.
//!
//! Container decoding is out of scope for this crate; the core needs only a
//! total frame count and random access to single-frame luminance planes,
//! expressed by the [`VideoSource`] trait. [`FrameBuffer`] is the provided
//! in-memory implementation.

mod frame_buffer;

use image::GrayImage;

pub use frame_buffer::FrameBuffer;

/// Errors raised by a video source.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    /// A frame could not be read.
    #[error("frame {index} unavailable in video '{source_id}': {message}")]
    FrameUnavailable {
        source_id: String,
        index: u64,
        message: String,
    },
}

/// A readable video recording.
pub trait VideoSource {
    /// Stable identity of this video (typically its path), used as a cache
    /// key and in diagnostics.
    fn source_id(&self) -> &str;

    /// Total number of physical frames, including the metadata frame.
    fn frame_count(&self) -> u64;

    /// Luminance plane of the frame at a 0-indexed position.
    fn luma_frame(&self, index: u64) -> Result<GrayImage, VideoError>;
}
