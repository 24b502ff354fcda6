//! Camera identity types.
//!
//! Two distinct identities exist for every camera: the logical role the video
//! belongs to ([`CameraRole`]) and the physical sync line role that carries
//! its timing pulses ([`SyncLineRole`]). They differ because cameras can be
//! plugged into the wrong sync line; the resolver in
//! [`crate::alignment`] recovers the true correspondence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical camera role within a session.
///
/// The set is closed: exactly one video/metadata pair exists per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraRole {
    Eye,
    Face,
    Behavior,
}

impl CameraRole {
    /// All roles, in canonical iteration order.
    pub const ALL: [CameraRole; 3] = [CameraRole::Eye, CameraRole::Face, CameraRole::Behavior];

    /// The sync line role this camera is *nominally* wired to.
    ///
    /// Actual wiring may differ; see [`crate::models::LineMapping`].
    pub fn line_role(&self) -> SyncLineRole {
        match self {
            CameraRole::Eye => SyncLineRole::Eye,
            CameraRole::Face => SyncLineRole::Face,
            CameraRole::Behavior => SyncLineRole::Beh,
        }
    }
}

impl std::fmt::Display for CameraRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraRole::Eye => write!(f, "eye"),
            CameraRole::Face => write!(f, "face"),
            CameraRole::Behavior => write!(f, "behavior"),
        }
    }
}

impl std::str::FromStr for CameraRole {
    type Err = CameraRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_camera_role(s)
    }
}

/// Role prefix as used in sync line labels (`beh`, `eye`, `face`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLineRole {
    Beh,
    Eye,
    Face,
}

impl SyncLineRole {
    /// All line roles, in canonical iteration order.
    pub const ALL: [SyncLineRole; 3] = [SyncLineRole::Beh, SyncLineRole::Eye, SyncLineRole::Face];

    /// Label of the exposing line for this role
    /// (high while the sensor integrates light for one frame).
    pub fn exposing_line(&self) -> String {
        format!("{self}_cam_exposing")
    }

    /// Label of the frame readout line for this role
    /// (marks sensor-to-memory frame transfer).
    pub fn readout_line(&self) -> String {
        format!("{self}_cam_frame_readout")
    }

    /// The camera role this line role nominally belongs to.
    pub fn camera_role(&self) -> CameraRole {
        match self {
            SyncLineRole::Beh => CameraRole::Behavior,
            SyncLineRole::Eye => CameraRole::Eye,
            SyncLineRole::Face => CameraRole::Face,
        }
    }
}

impl std::fmt::Display for SyncLineRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncLineRole::Beh => write!(f, "beh"),
            SyncLineRole::Eye => write!(f, "eye"),
            SyncLineRole::Face => write!(f, "face"),
        }
    }
}

/// Error returned when a label cannot be matched to a camera role.
#[derive(Debug, Clone, Error)]
#[error("could not extract camera name from '{0}'")]
pub struct CameraRoleParseError(pub String);

/// Parse a camera role from a free-form label (video file stem, sync line
/// name, ...).
///
/// Matches case-insensitively on the first of `eye`, `face`, `beh` found as
/// a substring. Total: a label matching none of them is an error, never a
/// silent default.
pub fn parse_camera_role(label: &str) -> Result<CameraRole, CameraRoleParseError> {
    let lower = label.to_lowercase();
    for (needle, role) in [
        ("eye", CameraRole::Eye),
        ("face", CameraRole::Face),
        ("beh", CameraRole::Behavior),
    ] {
        if lower.contains(needle) {
            return Ok(role);
        }
    }
    Err(CameraRoleParseError(label.to_string()))
}
