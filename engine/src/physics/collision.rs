//! Collision primitives
//!
//! Low-level geometric tests shared by the collision shapes, the world queries
//! and the per-step pair detection. All functions work in whatever space the
//! caller provides; shapes call them in their local frame.
//!
//! # Ray conventions
//!
//! Rays are `origin + direction * t` with a normalized `direction`. A test
//! returns the smallest `t` in `[0, max_distance]` where the ray enters the
//! solid. Rays that start inside a solid report no hit for that solid, which
//! lets a character standing in contact with the floor still cast rays past it.
//!
//! # Example
//!
//! ```ignore
//! use kinema_engine::physics::collision::ray_aabb_intersect;
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 0.0, -5.0);
//! let direction = Vec3::new(0.0, 0.0, 1.0);
//! if let Some(t) = ray_aabb_intersect(origin, direction, Vec3::splat(-1.0), Vec3::ONE) {
//!     let hit_point = origin + direction * t;
//! }
//! ```

use glam::{Quat, Vec3};

/// A ray hit expressed in the space the test was run in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray
    pub distance: f32,
    /// Outward surface normal at the hit point (normalized)
    pub normal: Vec3,
}

impl RayHit {
    /// Creates a new RayHit.
    pub fn new(distance: f32, normal: Vec3) -> Self {
        Self { distance, normal }
    }
}

/// Ray vs axis-aligned box using the slab method.
///
/// Finds the entry and exit times for each pair of axis-aligned planes and
/// intersects the intervals.
///
/// # Returns
///
/// * `Some(t)` - Distance to the entry point (t >= 0)
/// * `None` - No intersection, box behind the ray, or ray starts inside the box
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    // Near-zero direction components get a huge inverse so that axis never limits the interval
    let inv = |d: f32| {
        if d.abs() > 1e-10 {
            1.0 / d
        } else {
            f32::MAX * if d < 0.0 { -1.0 } else { 1.0 }
        }
    };
    let inv_dir = Vec3::new(inv(ray_dir.x), inv(ray_dir.y), inv(ray_dir.z));

    let t1 = (aabb_min - ray_origin) * inv_dir;
    let t2 = (aabb_max - ray_origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_min >= 0.0 {
        Some(t_min)
    } else {
        None
    }
}

/// Outward normal of the AABB face closest to `point`.
///
/// Picks the axis with the largest coordinate after normalizing the point into
/// unit-cube space.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(f32::EPSILON));
    let normalized = (point - center) / half_extents;
    let abs = normalized.abs();

    if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs.y >= abs.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Ray vs sphere.
pub fn ray_sphere_intersect(
    origin: Vec3,
    direction: Vec3,
    center: Vec3,
    radius: f32,
    max_distance: f32,
) -> Option<RayHit> {
    let m = origin - center;
    let c = m.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = m.dot(direction);
    if b > 0.0 {
        // Outside and pointing away
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    if t > max_distance {
        return None;
    }
    let normal = (origin + direction * t - center).normalize_or(direction * -1.0);
    Some(RayHit::new(t, normal))
}

/// Ray vs Y-aligned capsule centered at the origin.
///
/// The capsule's core segment runs from `(0, -half_length, 0)` to
/// `(0, half_length, 0)`.
pub fn ray_capsule_intersect(
    origin: Vec3,
    direction: Vec3,
    radius: f32,
    half_length: f32,
    max_distance: f32,
) -> Option<RayHit> {
    let seg_y = origin.y.clamp(-half_length, half_length);
    if (origin - Vec3::new(0.0, seg_y, 0.0)).length_squared() < radius * radius {
        return None;
    }

    let mut best: Option<RayHit> = None;
    let mut keep = |hit: RayHit| {
        if best.is_none_or(|b| hit.distance < b.distance) {
            best = Some(hit);
        }
    };

    // Cylinder body
    let a = direction.x * direction.x + direction.z * direction.z;
    if a > 1e-12 {
        let b = 2.0 * (origin.x * direction.x + origin.z * direction.z);
        let c = origin.x * origin.x + origin.z * origin.z - radius * radius;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let t = (-b - disc.sqrt()) / (2.0 * a);
            let p = origin + direction * t;
            if t >= 0.0 && t <= max_distance && p.y.abs() <= half_length {
                keep(RayHit::new(t, Vec3::new(p.x, 0.0, p.z) / radius));
            }
        }
    }

    // End caps
    for cap in [half_length, -half_length] {
        if let Some(hit) =
            ray_sphere_intersect(origin, direction, Vec3::new(0.0, cap, 0.0), radius, max_distance)
        {
            keep(hit);
        }
    }

    best
}

/// Sphere vs sphere overlap.
///
/// Returns `(normal from a to b, penetration depth, contact point)`.
pub fn sphere_sphere_contact(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
) -> Option<(Vec3, f32, Vec3)> {
    let delta = center_b - center_a;
    let dist_sq = delta.length_squared();
    let reach = radius_a + radius_b;
    if dist_sq > reach * reach {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
    let depth = reach - dist;
    // Midway through the overlap region
    let point = center_a + normal * (radius_a - depth * 0.5);
    Some((normal, depth, point))
}

/// Oriented box vs sphere overlap.
pub fn obb_sphere_overlap(
    box_center: Vec3,
    half_extents: Vec3,
    box_rotation: Quat,
    sphere_center: Vec3,
    sphere_radius: f32,
) -> bool {
    let local = box_rotation.inverse() * (sphere_center - box_center);
    let closest = local.clamp(-half_extents, half_extents);
    (local - closest).length_squared() <= sphere_radius * sphere_radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_aabb_from_front() {
        let origin = Vec3::new(0.0, 0.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        let result = ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::ONE);
        let t = result.unwrap();
        assert!((t - 4.0).abs() < 0.001, "Expected t=4.0, got t={}", t);
    }

    #[test]
    fn test_ray_misses_aabb() {
        let origin = Vec3::new(0.0, 5.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::ONE).is_none());
    }

    #[test]
    fn test_ray_starting_inside_aabb_is_ignored() {
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_aabb_intersect(Vec3::ZERO, dir, Vec3::splat(-1.0), Vec3::ONE).is_none());
    }

    #[test]
    fn test_ray_aabb_behind_origin() {
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::ONE).is_none());
    }

    #[test]
    fn test_surface_normal_faces() {
        let (min, max) = (Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(aabb_surface_normal(Vec3::new(1.0, 0.0, 0.0), min, max), Vec3::X);
        assert_eq!(aabb_surface_normal(Vec3::new(-1.0, 0.0, 0.0), min, max), Vec3::NEG_X);
        assert_eq!(aabb_surface_normal(Vec3::new(0.0, 1.0, 0.0), min, max), Vec3::Y);
        assert_eq!(aabb_surface_normal(Vec3::new(0.0, 0.0, -1.0), min, max), Vec3::NEG_Z);
    }

    #[test]
    fn test_ray_sphere_hit_distance_and_normal() {
        let hit = ray_sphere_intersect(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::Z,
            Vec3::ZERO,
            1.0,
            100.0,
        )
        .unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_respects_max_distance() {
        let hit = ray_sphere_intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0, 3.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_capsule_side_and_cap() {
        // Side hit
        let side = ray_capsule_intersect(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 0.5, 1.0, 100.0)
            .unwrap();
        assert!((side.distance - 4.5).abs() < 1e-5);
        assert!((side.normal - Vec3::NEG_X).length() < 1e-5);

        // Top cap hit from above
        let top = ray_capsule_intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 0.5, 1.0, 100.0)
            .unwrap();
        assert!((top.distance - 3.5).abs() < 1e-5);
        assert!((top.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_sphere_sphere_contact_depth() {
        let (normal, depth, _) =
            sphere_sphere_contact(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(normal, Vec3::X);
        assert!((depth - 0.5).abs() < 1e-6);
        assert!(sphere_sphere_contact(Vec3::ZERO, 1.0, Vec3::new(3.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_obb_sphere_overlap_rotated() {
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        // Corner of a rotated unit box reaches ~1.414 along X
        assert!(obb_sphere_overlap(Vec3::ZERO, Vec3::ONE, rot, Vec3::new(1.6, 0.0, 0.0), 0.3));
        let beside = Vec3::new(1.6, 0.0, 0.0);
        assert!(!obb_sphere_overlap(Vec3::ZERO, Vec3::ONE, Quat::IDENTITY, beside, 0.3));
    }
}
