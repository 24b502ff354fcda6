//! Data models for MVR session processing.
//!
//! This module contains the core data structures used throughout the crate:
//! - Camera identity enums and the total camera-name parser
//! - The fixed three-slot [`CameraMap`] container
//! - The resolved camera-to-sync-line [`LineMapping`]
//! - Typed, validated video metadata ingested from the sidecar JSON
//! - Per-frame sync-clock timestamp arrays

mod camera;
mod camera_map;
mod mapping;
mod metadata;
mod timestamps;

pub use camera::{parse_camera_role, CameraRole, CameraRoleParseError, SyncLineRole};
pub use camera_map::CameraMap;
pub use mapping::LineMapping;
pub use metadata::{
    expand_lost_frame_spans, parse_camera_input, BarcodeGeometry, MetadataError, VideoMetadata,
};
pub use timestamps::FrameTimestampArray;
