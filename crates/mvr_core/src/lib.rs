//! MVR Core - alignment and verification engine for multi-camera recordings.
//!
//! Reconciles video recordings captured by independently-clocked cameras with
//! a shared hardware timing reference ("sync" clock). For each camera the
//! crate produces a trustworthy per-frame timestamp array and a frame-loss
//! accounting, and can decode the frame-index barcode imprinted in each frame
//! as an independent cross-check.
//!
//! This crate contains business logic only, with zero UI dependencies. File
//! discovery, video container decoding, and timing-signal container parsing
//! live behind the [`sync::SyncSource`] and [`video::VideoSource`] traits.

pub mod alignment;
pub mod barcode;
pub mod config;
pub mod logging;
pub mod models;
pub mod session;
pub mod sync;
pub mod validation;
pub mod video;

pub use models::{
    parse_camera_role, CameraMap, CameraRole, FrameTimestampArray, LineMapping, SyncLineRole,
    VideoMetadata,
};
pub use session::SessionDataset;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
