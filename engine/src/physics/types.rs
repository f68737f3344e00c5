//! Physics math types
//!
//! Vectors and quaternions come from glam. [`Transform`] pairs a position
//! with an orientation and is the pose type used by bodies, constraint frames
//! and overlap queries.

pub use glam::{Quat, Vec3};

use serde::{Deserialize, Serialize};

/// World "up" used by ground and slope classification.
pub const UP: Vec3 = Vec3::Y;

/// Rigid pose: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation in meters
    pub position: Vec3,
    /// Orientation (kept normalized)
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a transform from a position and an orientation.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// A pure translation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Map a point from local space to world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Map a point from world space to local space.
    #[inline]
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Rotate a direction from local space to world space.
    #[inline]
    pub fn rotate(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Rotate a direction from world space to local space.
    #[inline]
    pub fn inverse_rotate(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * world
    }

    /// `self * child`: express a child frame given relative to `self` in world space.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }
}

/// Returns true if every component of `v` is finite.
#[inline]
pub(crate) fn is_finite_vec(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
