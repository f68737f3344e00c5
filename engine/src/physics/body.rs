//! Rigid bodies
//!
//! A [`RigidBody`] carries its pose, velocities and mass properties. Bodies are
//! built with the constructors below, then moved into a
//! [`PhysicsWorld`](super::PhysicsWorld) which hands back a stable
//! [`BodyHandle`].
//!
//! # Example
//!
//! ```ignore
//! use kinema_engine::physics::{RigidBody, Sphere, PhysicsWorld};
//! use glam::Vec3;
//!
//! let ball = RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::new(0.0, 10.0, 0.0));
//! let handle = world.add_rigid_body(ball)?;
//! ```

use std::sync::Arc;

use glam::{Quat, Vec3};

use super::object::{BodyHandle, Collidable, CollisionGroups};
use super::shape::{CollisionShape, ShapeRef, default_shape};
use super::types::Transform;

/// How the world treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// Never moves
    Static,
    /// Moved by the caller, never by gravity or integration
    Kinematic,
    /// Simulated (requires mass > 0)
    #[default]
    Dynamic,
}

/// A simulated body.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) id: Option<BodyHandle>,
    pub(crate) transform: Transform,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) mass: f32,
    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) body_type: BodyType,
    pub(crate) trigger: bool,
    pub(crate) groups: CollisionGroups,
    pub(crate) mask: CollisionGroups,
    pub(crate) shape: ShapeRef,
    /// Force accumulated since the last step (N)
    pub(crate) force: Vec3,
    /// Torque accumulated since the last step (N·m)
    pub(crate) torque: Vec3,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            id: None,
            transform: Transform::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            body_type: BodyType::Dynamic,
            trigger: false,
            groups: CollisionGroups::DEFAULT,
            mask: CollisionGroups::ALL,
            shape: default_shape(),
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }
}

impl RigidBody {
    /// A dynamic body with the given mass. A mass of 0 leaves it unsimulated.
    pub fn dynamic(mass: f32, shape: impl CollisionShape + 'static) -> Self {
        Self {
            mass,
            shape: Arc::new(shape),
            ..Default::default()
        }
    }

    /// An immovable body.
    pub fn fixed(shape: impl CollisionShape + 'static) -> Self {
        Self {
            mass: 0.0,
            body_type: BodyType::Static,
            groups: CollisionGroups::STATIC,
            shape: Arc::new(shape),
            ..Default::default()
        }
    }

    /// A body moved only by the caller (e.g. a moving platform).
    pub fn kinematic(shape: impl CollisionShape + 'static) -> Self {
        Self {
            mass: 0.0,
            body_type: BodyType::Kinematic,
            groups: CollisionGroups::KINEMATIC,
            shape: Arc::new(shape),
            ..Default::default()
        }
    }

    /// Replace the shape with an already shared one.
    pub fn with_shared_shape(mut self, shape: ShapeRef) -> Self {
        self.shape = shape;
        self
    }

    /// Set the initial position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the initial orientation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation.normalize();
        self
    }

    /// Set the initial linear velocity.
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the initial angular velocity.
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Set linear and angular damping coefficients (1/s).
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set the filter groups and mask.
    pub fn with_groups(mut self, groups: CollisionGroups, mask: CollisionGroups) -> Self {
        self.groups = groups;
        self.mask = mask;
        self
    }

    /// Mark as a sensor: overlaps are reported to trigger listeners only.
    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    /// Handle assigned on registration, `None` before.
    pub fn id(&self) -> Option<BodyHandle> {
        self.id
    }

    /// World pose.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Teleport the body.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// World position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Move the body without affecting its velocity.
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// World orientation.
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Set the orientation without affecting angular velocity.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation.normalize();
    }

    /// Linear velocity (m/s).
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    /// Overwrite the linear velocity.
    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    /// Angular velocity (rad/s, world axis).
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Overwrite the angular velocity.
    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    /// Mass in kilograms (0 for static/kinematic bodies).
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Linear damping coefficient.
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Angular damping coefficient.
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Body type tag.
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Shared shape handle.
    pub fn shared_shape(&self) -> &ShapeRef {
        &self.shape
    }

    /// Whether gravity and integration apply to this body.
    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.body_type == BodyType::Dynamic && self.mass > 0.0
    }

    /// Inverse mass, 0 for anything not simulated.
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.is_simulated() { 1.0 / self.mass } else { 0.0 }
    }

    /// Inverse of the isotropic inertia of a solid sphere with the shape's bounding radius.
    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        if !self.is_simulated() {
            return 0.0;
        }
        let r = self.shape.bounding_radius().max(1e-3);
        1.0 / (0.4 * self.mass * r * r)
    }

    /// Accumulate a force through the center of mass until the next step.
    pub fn apply_central_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Accumulate a torque until the next step.
    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Instantly change momentum through the center of mass.
    pub fn apply_central_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inverse_mass();
    }

    /// Instantly change angular momentum.
    pub fn apply_torque_impulse(&mut self, impulse: Vec3) {
        self.angular_velocity += impulse * self.inverse_inertia();
    }

    /// Apply accumulated forces, then damping: `v = (v + F/m·dt)·(1 − damping·dt)`.
    ///
    /// Clears the accumulators. No-op for bodies that are not simulated.
    pub(crate) fn integrate_velocity(&mut self, dt: f32) {
        if self.is_simulated() {
            self.linear_velocity += self.force * (self.inverse_mass() * dt);
            self.angular_velocity += self.torque * (self.inverse_inertia() * dt);
            self.linear_velocity *= (1.0 - self.linear_damping * dt).max(0.0);
            self.angular_velocity *= (1.0 - self.angular_damping * dt).max(0.0);
        }
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Advance the pose with the current velocities (semi-implicit Euler).
    pub(crate) fn integrate_transform(&mut self, dt: f32) {
        if !self.is_simulated() {
            return;
        }
        self.transform.position += self.linear_velocity * dt;
        let spin = Quat::from_scaled_axis(self.angular_velocity * dt);
        self.transform.rotation = (spin * self.transform.rotation).normalize();
    }
}

impl Collidable for RigidBody {
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
    use crate::physics::shape::Sphere;

    #[test]
    fn test_only_dynamic_with_mass_is_simulated() {
        assert!(RigidBody::dynamic(1.0, Sphere::new(0.5)).is_simulated());
        assert!(!RigidBody::dynamic(0.0, Sphere::new(0.5)).is_simulated());
        assert!(!RigidBody::fixed(Sphere::new(0.5)).is_simulated());
        assert!(!RigidBody::kinematic(Sphere::new(0.5)).is_simulated());
    }

    #[test]
    fn test_static_body_ignores_impulses() {
        let mut body = RigidBody::fixed(Sphere::new(1.0));
        body.apply_central_impulse(Vec3::new(10.0, 0.0, 0.0));
        body.integrate_velocity(0.1);
        body.integrate_transform(0.1);
        assert_eq!(body.linear_velocity(), Vec3::ZERO);
        assert_eq!(body.position(), Vec3::ZERO);
    }

    #[test]
    fn test_damping_applied_after_force() {
        let mut body = RigidBody::dynamic(2.0, Sphere::new(0.5)).with_damping(0.5, 0.0);
        body.apply_central_force(Vec3::new(0.0, -20.0, 0.0));
        body.integrate_velocity(0.1);
        // (0 + (-20/2)*0.1) * (1 - 0.5*0.1)
        assert!((body.linear_velocity().y - (-0.95)).abs() < 1e-6);
        assert_eq!(body.force, Vec3::ZERO);
    }

    #[test]
    fn test_orientation_follows_angular_velocity() {
        let mut body = RigidBody::dynamic(1.0, Sphere::new(0.5))
            .with_angular_velocity(Vec3::new(0.0, std::f32::consts::PI, 0.0));
        for _ in 0..10 {
            body.integrate_transform(0.05);
        }
        // Half a second at pi rad/s is a quarter turn about Y
        let (axis, angle) = body.rotation().to_axis_angle();
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
        assert!((axis - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_torque_spins_up_body_with_shared_shape() {
        let shape: ShapeRef = Arc::new(Sphere::new(1.0));
        let mut body =
            RigidBody::dynamic(2.5, Sphere::new(0.1)).with_shared_shape(Arc::clone(&shape));
        assert_eq!(body.shape().bounding_radius(), 1.0);

        // I = 0.4 * 2.5 * 1² = 1
        body.apply_torque(Vec3::new(0.0, 0.0, 3.0));
        body.integrate_velocity(0.5);
        assert!((body.angular_velocity().z - 1.5).abs() < 1e-5);
        assert_eq!(body.torque, Vec3::ZERO);
    }
}
