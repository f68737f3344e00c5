//! Scene queries
//!
//! [`CollisionQuery`] is the narrow read-only view the character controller
//! needs from a world: a raycast and the position of whatever the ray hit.
//! [`PhysicsWorld`](super::PhysicsWorld) implements it; tests can substitute
//! a hand-built scene.

use glam::Vec3;

use super::object::{CollisionGroups, CollisionObjectHandle};

/// Closest hit of a segment query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    /// Object that was hit
    pub object: CollisionObjectHandle,
    /// World-space hit point
    pub point: Vec3,
    /// Outward surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the segment start
    pub distance: f32,
    /// `distance / segment length`, in `[0, 1]`
    pub fraction: f32,
}

/// Read-only scene access used by the character controller.
pub trait CollisionQuery {
    /// Closest solid hit on the segment `from → to` among objects matching `mask`.
    fn raycast(&self, from: Vec3, to: Vec3, mask: CollisionGroups) -> Option<RaycastResult>;

    /// Current position of a collision object, if it still exists.
    fn object_position(&self, object: CollisionObjectHandle) -> Option<Vec3>;
}
