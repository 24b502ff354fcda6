//! Fixed-size container keyed by camera role.

use serde::{Deserialize, Serialize};

use super::camera::CameraRole;

/// One value per camera role.
///
/// Replaces open-ended role-keyed maps: all three slots always exist, so
/// lookups are total and need no `Option` handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraMap<T> {
    pub eye: T,
    pub face: T,
    pub behavior: T,
}

impl<T> CameraMap<T> {
    /// Create a map from the three values.
    pub fn new(eye: T, face: T, behavior: T) -> Self {
        Self {
            eye,
            face,
            behavior,
        }
    }

    /// Build a map by calling `f` once per role, in canonical order.
    pub fn from_fn(mut f: impl FnMut(CameraRole) -> T) -> Self {
        Self {
            eye: f(CameraRole::Eye),
            face: f(CameraRole::Face),
            behavior: f(CameraRole::Behavior),
        }
    }

    /// Build a map by calling a fallible `f` once per role, in canonical
    /// order, stopping at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(CameraRole) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            eye: f(CameraRole::Eye)?,
            face: f(CameraRole::Face)?,
            behavior: f(CameraRole::Behavior)?,
        })
    }

    /// Get the value for a role.
    pub fn get(&self, role: CameraRole) -> &T {
        match role {
            CameraRole::Eye => &self.eye,
            CameraRole::Face => &self.face,
            CameraRole::Behavior => &self.behavior,
        }
    }

    /// Get the value for a role mutably.
    pub fn get_mut(&mut self, role: CameraRole) -> &mut T {
        match role {
            CameraRole::Eye => &mut self.eye,
            CameraRole::Face => &mut self.face,
            CameraRole::Behavior => &mut self.behavior,
        }
    }

    /// Apply `f` to every slot, producing a new map.
    pub fn map<U>(&self, mut f: impl FnMut(CameraRole, &T) -> U) -> CameraMap<U> {
        CameraMap {
            eye: f(CameraRole::Eye, &self.eye),
            face: f(CameraRole::Face, &self.face),
            behavior: f(CameraRole::Behavior, &self.behavior),
        }
    }

    /// Iterate over `(role, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CameraRole, &T)> + '_ {
        CameraRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// The three values in canonical order.
    pub fn values(&self) -> [&T; 3] {
        [&self.eye, &self.face, &self.behavior]
    }
}
