//! Resolved camera-to-sync-line mapping.

use serde::Serialize;

use super::camera::{CameraRole, SyncLineRole};
use super::camera_map::CameraMap;

/// Mapping from logical camera role to the physical sync line role that
/// actually carries its timing pulses for one session.
///
/// Derived once per session by the resolver in [`crate::alignment`] and
/// immutable afterwards. A correctly wired rig yields the identity mapping;
/// a valid mapping is always a bijection over the three roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMapping {
    map: CameraMap<SyncLineRole>,
}

impl LineMapping {
    /// Wrap a resolved role-to-line assignment.
    pub fn new(map: CameraMap<SyncLineRole>) -> Self {
        Self { map }
    }

    /// The mapping for a correctly wired rig.
    pub fn identity() -> Self {
        Self {
            map: CameraMap::from_fn(|role| role.line_role()),
        }
    }

    /// The physical line role driving this camera.
    pub fn line_role(&self, camera: CameraRole) -> SyncLineRole {
        *self.map.get(camera)
    }

    /// Label of the exposing line that actually carries this camera's pulses.
    pub fn exposing_line(&self, camera: CameraRole) -> String {
        self.line_role(camera).exposing_line()
    }

    /// Label of the readout line that actually carries this camera's pulses.
    pub fn readout_line(&self, camera: CameraRole) -> String {
        self.line_role(camera).readout_line()
    }

    /// Whether every camera is wired to its own nominal line.
    pub fn is_identity(&self) -> bool {
        CameraRole::ALL
            .into_iter()
            .all(|role| self.line_role(role) == role.line_role())
    }

    /// Whether the three assigned line roles are pairwise distinct.
    pub fn is_bijection(&self) -> bool {
        let assigned = self.map.values();
        assigned[0] != assigned[1] && assigned[0] != assigned[2] && assigned[1] != assigned[2]
    }

    /// Iterate over `(camera, line role)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CameraRole, SyncLineRole)> + '_ {
        self.map.iter().map(|(role, line)| (role, *line))
    }
}

impl std::fmt::Display for LineMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (camera, line) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{camera} -> {line}")?;
            first = false;
        }
        Ok(())
    }
}
