//! In-memory video-source implementation.

use image::GrayImage;

use super::{VideoError, VideoSource};

/// An in-memory video: a declared frame count plus optional pixel data.
///
/// Callers that only consume frame counts (frame-time reconstruction) can
/// construct one without pixel data; barcode decoding needs real frames.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    id: String,
    frames: Vec<GrayImage>,
    frame_count: u64,
}

impl FrameBuffer {
    /// Create a buffer holding the given frames.
    pub fn new(id: impl Into<String>, frames: Vec<GrayImage>) -> Self {
        let frame_count = frames.len() as u64;
        Self {
            id: id.into(),
            frames,
            frame_count,
        }
    }

    /// Create a pixel-less buffer that only declares a frame count.
    ///
    /// Frame reads fail; only [`VideoSource::frame_count`] is usable.
    pub fn with_frame_count(id: impl Into<String>, frame_count: u64) -> Self {
        Self {
            id: id.into(),
            frames: Vec::new(),
            frame_count,
        }
    }
}

impl VideoSource for FrameBuffer {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn luma_frame(&self, index: u64) -> Result<GrayImage, VideoError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get(i))
            .cloned()
            .ok_or_else(|| VideoError::FrameUnavailable {
                source_id: self.id.clone(),
                index,
                message: if self.frames.is_empty() {
                    "buffer holds no pixel data".to_string()
                } else {
                    "index past last buffered frame".to_string()
                },
            })
    }
}
