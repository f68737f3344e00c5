//! Collision objects
//!
//! Everything the world can query or report contacts for is a collision
//! object: rigid bodies plus ghost objects (kinematic-only volumes such as a
//! character capsule). Both kinds share the [`Collidable`] view and one handle
//! space, so query results can name either.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::RayHit;
use super::shape::{CollisionShape, ShapeRef};
use super::types::Transform;

bitflags! {
    /// Collision filter bits.
    ///
    /// A pair is tested only when each object's groups intersect the other's
    /// mask. Query masks use [`CollisionGroups::ALL`] to match everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionGroups: u32 {
        /// Ordinary dynamic bodies
        const DEFAULT = 1;
        /// Immovable level geometry
        const STATIC = 1 << 1;
        /// Script-driven movers (platforms, doors)
        const KINEMATIC = 1 << 2;
        /// Character controller volumes
        const CHARACTER = 1 << 3;
        /// Sensor volumes
        const SENSOR = 1 << 4;
        /// Match-all sentinel
        const ALL = u32::MAX;
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stable identifier of a rigid body inside one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle(pub(crate) u32);

/// Stable identifier of a ghost object inside one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GhostHandle(pub(crate) u32);

/// Identifier of any collision object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollisionObjectHandle {
    /// A simulated rigid body
    Body(BodyHandle),
    /// A kinematic-only ghost object
    Ghost(GhostHandle),
}

impl BodyHandle {
    /// Raw numeric id, unique across bodies and ghosts of one world.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl GhostHandle {
    /// Raw numeric id, unique across bodies and ghosts of one world.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl CollisionObjectHandle {
    /// The body handle, if this names a body.
    pub fn body(self) -> Option<BodyHandle> {
        match self {
            Self::Body(h) => Some(h),
            Self::Ghost(_) => None,
        }
    }
}

impl From<BodyHandle> for CollisionObjectHandle {
    fn from(h: BodyHandle) -> Self {
        Self::Body(h)
    }
}

impl From<GhostHandle> for CollisionObjectHandle {
    fn from(h: GhostHandle) -> Self {
        Self::Ghost(h)
    }
}

impl fmt::Display for CollisionObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(h) => write!(f, "body#{}", h.0),
            Self::Ghost(h) => write!(f, "ghost#{}", h.0),
        }
    }
}

/// Read-only collision view shared by bodies and ghosts.
pub trait Collidable {
    /// World pose
    fn transform(&self) -> &Transform;
    /// Attached geometry
    fn shape(&self) -> &dyn CollisionShape;
    /// Groups this object belongs to
    fn collision_groups(&self) -> CollisionGroups;
    /// Groups this object collides with
    fn collision_mask(&self) -> CollisionGroups;
    /// Sensors report overlaps but are never treated as solid contacts
    fn is_trigger(&self) -> bool;

    /// World-space bounding sphere `(center, radius)`.
    fn bounding_sphere(&self) -> (Vec3, f32) {
        (self.transform().position, self.shape().bounding_radius())
    }

    /// Whether a query with `mask` should see this object.
    fn matches_mask(&self, mask: CollisionGroups) -> bool {
        mask == CollisionGroups::ALL || self.collision_groups().intersects(mask)
    }

    /// World-space ray test against the attached shape.
    fn ray_test(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let t = self.transform();
        let local_origin = t.inverse_transform_point(origin);
        let local_dir = t.inverse_rotate(direction);
        let hit = self.shape().ray_intersect(local_origin, local_dir, max_distance)?;
        Some(RayHit::new(hit.distance, t.rotate(hit.normal).normalize_or_zero()))
    }
}

/// Whether two objects' filters allow a contact between them.
pub(crate) fn filters_allow(a: &dyn Collidable, b: &dyn Collidable) -> bool {
    a.collision_groups().intersects(b.collision_mask())
        && b.collision_groups().intersects(a.collision_mask())
}

/// A kinematic-only collision volume.
///
/// Ghosts are never integrated; the owner moves them explicitly with
/// [`set_collision_object_position`](super::PhysicsWorld::set_collision_object_position).
#[derive(Debug, Clone)]
pub struct GhostObject {
    pub(crate) transform: Transform,
    pub(crate) shape: ShapeRef,
    pub(crate) groups: CollisionGroups,
    pub(crate) mask: CollisionGroups,
    pub(crate) trigger: bool,
}

impl GhostObject {
    /// Create a ghost with the given shape at `position`.
    pub fn new(shape: ShapeRef, position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            shape,
            groups: CollisionGroups::CHARACTER,
            mask: CollisionGroups::ALL,
            trigger: false,
        }
    }

    /// Convenience constructor for any concrete shape.
    pub fn with_shape(shape: impl CollisionShape + 'static, position: Vec3) -> Self {
        Self::new(Arc::new(shape), position)
    }

    /// Set the filter groups and mask.
    pub fn with_groups(mut self, groups: CollisionGroups, mask: CollisionGroups) -> Self {
        self.groups = groups;
        self.mask = mask;
        self
    }

    /// Mark as a sensor volume.
    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    /// Set the orientation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

impl Collidable for GhostObject {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn shape(&self) -> &dyn CollisionShape {
        self.shape.as_ref()
    }

    fn collision_groups(&self) -> CollisionGroups {
        self.groups
    }

    fn collision_mask(&self) -> CollisionGroups {
        self.mask
    }

    fn is_trigger(&self) -> bool {
        self.trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::Cuboid;

    #[test]
    fn test_all_mask_matches_everything() {
        let ghost = GhostObject::with_shape(Cuboid::new(Vec3::ONE), Vec3::ZERO)
            .with_groups(CollisionGroups::SENSOR, CollisionGroups::ALL);
        assert!(ghost.matches_mask(CollisionGroups::ALL));
        assert!(ghost.matches_mask(CollisionGroups::SENSOR | CollisionGroups::STATIC));
        assert!(!ghost.matches_mask(CollisionGroups::STATIC));
    }

    #[test]
    fn test_ray_test_uses_rotation() {
        // A long thin box rotated a quarter turn so its long axis lies along Z
        let ghost = GhostObject::with_shape(Cuboid::new(Vec3::new(5.0, 0.5, 0.5)), Vec3::ZERO)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let hit = ghost.ray_test(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, 20.0).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(CollisionObjectHandle::Body(BodyHandle(3)).to_string(), "body#3");
        assert_eq!(CollisionObjectHandle::from(GhostHandle(7)).to_string(), "ghost#7");
    }
}
