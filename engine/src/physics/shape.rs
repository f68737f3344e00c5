//! Collision shapes
//!
//! The world only needs three things from a shape: a bounding radius for
//! overlap tests, a half height for character sweeps, and a local-space ray
//! test. Anything implementing [`CollisionShape`] can be attached to a body.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use super::collision::{
    RayHit, aabb_surface_normal, ray_aabb_intersect, ray_capsule_intersect, ray_sphere_intersect,
};

/// Geometry descriptor consumed by the world.
pub trait CollisionShape: fmt::Debug + Send + Sync {
    /// Radius of a sphere centered on the body origin that contains the shape.
    fn bounding_radius(&self) -> f32;

    /// Half of the shape's extent along its local Y axis.
    fn half_height(&self) -> f32;

    /// Ray test in the shape's local frame (`direction` normalized).
    ///
    /// The default treats the shape as its bounding sphere.
    fn ray_intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        ray_sphere_intersect(origin, direction, Vec3::ZERO, self.bounding_radius(), max_distance)
    }
}

/// Shared handle to a shape; several bodies may reuse one descriptor.
pub type ShapeRef = Arc<dyn CollisionShape>;

/// Sphere centered on the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Radius in meters
    pub radius: f32,
}

impl Sphere {
    /// Creates a sphere shape.
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl CollisionShape for Sphere {
    fn bounding_radius(&self) -> f32 {
        self.radius
    }

    fn half_height(&self) -> f32 {
        self.radius
    }

    fn ray_intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        ray_sphere_intersect(origin, direction, Vec3::ZERO, self.radius, max_distance)
    }
}

/// Box centered on the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    /// Half size along each local axis
    pub half_extents: Vec3,
}

impl Cuboid {
    /// Creates a box shape from its half extents.
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }
}

impl CollisionShape for Cuboid {
    fn bounding_radius(&self) -> f32 {
        self.half_extents.length()
    }

    fn half_height(&self) -> f32 {
        self.half_extents.y
    }

    fn ray_intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let (min, max) = (-self.half_extents, self.half_extents);
        let t = ray_aabb_intersect(origin, direction, min, max)?;
        if t > max_distance {
            return None;
        }
        let normal = aabb_surface_normal(origin + direction * t, min, max);
        Some(RayHit::new(t, normal))
    }
}

/// Capsule aligned with the local Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// Radius of the rounded ends and the cylinder
    pub radius: f32,
    /// Half length of the core segment (excluding the caps)
    pub half_length: f32,
}

impl Capsule {
    /// Creates a capsule from its radius and core half length.
    pub fn new(radius: f32, half_length: f32) -> Self {
        Self {
            radius,
            half_length,
        }
    }

    /// Creates a capsule with the given total height (caps included).
    pub fn from_height(radius: f32, height: f32) -> Self {
        Self::new(radius, (height * 0.5 - radius).max(0.0))
    }
}

impl CollisionShape for Capsule {
    fn bounding_radius(&self) -> f32 {
        self.half_length + self.radius
    }

    fn half_height(&self) -> f32 {
        self.half_length + self.radius
    }

    fn ray_intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        ray_capsule_intersect(origin, direction, self.radius, self.half_length, max_distance)
    }
}

/// Unit sphere used for bodies created without an explicit shape.
pub fn default_shape() -> ShapeRef {
    Arc::new(Sphere::new(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_ray_reports_face_normal() {
        let ground = Cuboid::new(Vec3::new(10.0, 0.5, 10.0));
        let hit = ground
            .ray_intersect(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 10.0)
            .unwrap();
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_capsule_from_height() {
        let capsule = Capsule::from_height(0.3, 1.8);
        assert!((capsule.half_length - 0.6).abs() < 1e-6);
        assert!((capsule.half_height() - 0.9).abs() < 1e-6);
    }

    #[derive(Debug)]
    struct Blob;

    impl CollisionShape for Blob {
        fn bounding_radius(&self) -> f32 {
            2.0
        }

        fn half_height(&self) -> f32 {
            2.0
        }
    }

    #[test]
    fn test_default_ray_uses_bounding_sphere() {
        let hit = Blob.ray_intersect(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 10.0).unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }
}
