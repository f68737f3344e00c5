//! Collide-and-slide movement
//!
//! Horizontal movement is swept up to [`MAX_SLIDE_ITERATIONS`] times per frame.
//! After each hit the character stops `skin_width` short of the surface and the
//! leftover displacement is projected onto the surface's tangent plane. A steep
//! surface (slope above `max_slope_angle`) may not be climbed: when the
//! projected slide would go up it, the leftover is redirected down the slope
//! instead.
//!
//! Vertical movement is a single sweep that reports what stopped it.

use glam::Vec3;

use super::config::CharacterConfig;
use super::slope_angle;
use super::sweep::SweepTester;
use crate::physics::object::CollisionObjectHandle;
use crate::physics::query::CollisionQuery;
use crate::physics::types::UP;

/// Sweeps per horizontal move.
pub const MAX_SLIDE_ITERATIONS: usize = 4;

/// Displacements shorter than this are treated as no movement.
const MIN_MOVE_DISTANCE: f32 = 1e-5;

/// What a vertical move ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalContact {
    /// Landed on a walkable surface while moving down
    Ground {
        normal: Vec3,
        object: CollisionObjectHandle,
    },
    /// Hit a surface too steep to stand on while moving down
    SteepSurface {
        normal: Vec3,
        object: CollisionObjectHandle,
    },
    /// Hit something while moving up
    Ceiling,
}

impl VerticalContact {
    /// Whether this contact supports the character.
    pub fn is_ground(&self) -> bool {
        matches!(self, Self::Ground { .. })
    }
}

/// Result of a vertical move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMove {
    pub position: Vec3,
    pub contact: Option<VerticalContact>,
}

/// Movement algorithms for one capsule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementSystem {
    sweep: SweepTester,
    skin_width: f32,
    max_slope_angle: f32,
}

impl MovementSystem {
    pub fn new(sweep: SweepTester, skin_width: f32, max_slope_angle: f32) -> Self {
        Self {
            sweep,
            skin_width,
            max_slope_angle,
        }
    }

    pub fn from_config(config: &CharacterConfig) -> Self {
        Self::new(
            SweepTester::from_config(config),
            config.skin_width,
            config.max_slope_angle,
        )
    }

    pub fn sweep_tester(&self) -> &SweepTester {
        &self.sweep
    }

    /// Slide `movement` from `start`, returning the final feet position.
    pub fn perform_horizontal(
        &self,
        query: &dyn CollisionQuery,
        start: Vec3,
        movement: Vec3,
    ) -> Vec3 {
        let mut position = start;
        let mut remaining = movement;

        for _ in 0..MAX_SLIDE_ITERATIONS {
            let distance = remaining.length();
            if distance < MIN_MOVE_DISTANCE {
                break;
            }
            let direction = remaining / distance;
            let result = self.sweep.sweep(query, position, direction, distance);
            let Some(hit) = result.hit else {
                position += remaining;
                break;
            };

            let travel = (result.distance - self.skin_width).clamp(0.0, distance);
            position += direction * travel;
            let leftover = direction * (distance - travel);

            remaining = self.slide(leftover, hit.normal);
            if remaining.length() < MIN_MOVE_DISTANCE {
                break;
            }
        }
        position
    }

    /// Leftover displacement after touching a surface with `normal`.
    fn slide(&self, leftover: Vec3, normal: Vec3) -> Vec3 {
        let tangent = leftover - normal * leftover.dot(normal);
        if slope_angle(normal) <= self.max_slope_angle || tangent.dot(UP) <= 0.0 {
            return tangent;
        }
        // Steepest descent along the surface
        let downhill = (normal * normal.dot(UP) - UP).normalize_or_zero();
        downhill * leftover.length()
    }

    /// Move vertically by `dy` (negative is down) with one sweep.
    pub fn perform_vertical(
        &self,
        query: &dyn CollisionQuery,
        start: Vec3,
        dy: f32,
    ) -> VerticalMove {
        if dy.abs() < MIN_MOVE_DISTANCE {
            return VerticalMove {
                position: start,
                contact: None,
            };
        }
        let moving_down = dy < 0.0;
        let direction = if moving_down { -UP } else { UP };
        let distance = dy.abs();
        let result = self.sweep.sweep(query, start, direction, distance);
        let Some(hit) = result.hit else {
            return VerticalMove {
                position: start + direction * distance,
                contact: None,
            };
        };

        let travel = (result.distance - self.skin_width).clamp(0.0, distance);
        let contact = if !moving_down {
            VerticalContact::Ceiling
        } else if slope_angle(hit.normal) <= self.max_slope_angle {
            VerticalContact::Ground {
                normal: hit.normal,
                object: hit.object,
            }
        } else {
            VerticalContact::SteepSurface {
                normal: hit.normal,
                object: hit.object,
            }
        };
        VerticalMove {
            position: start + direction * travel,
            contact: Some(contact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> MovementSystem {
        MovementSystem::new(SweepTester::new(0.3, 1.8), 0.02, 45f32.to_radians())
    }

    #[test]
    fn test_slide_along_wall_removes_normal_component() {
        let leftover = Vec3::new(-1.0, 0.0, 1.0);
        let slid = system().slide(leftover, Vec3::X);
        assert!(slid.dot(Vec3::X).abs() < 1e-6);
        assert!((slid.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_steep_slope_redirects_downhill() {
        // 60 degree ramp rising towards -X
        let normal = Vec3::new(60f32.to_radians().sin(), 60f32.to_radians().cos(), 0.0);
        let slid = system().slide(Vec3::new(-1.0, 0.0, 0.0), normal);
        assert!(slid.y < 0.0);
        assert!(slid.x > 0.0);
        assert!(slid.dot(normal).abs() < 1e-5);
    }

    #[test]
    fn test_walkable_slope_is_climbed() {
        let normal = Vec3::new(20f32.to_radians().sin(), 20f32.to_radians().cos(), 0.0);
        let slid = system().slide(Vec3::new(-1.0, 0.0, 0.0), normal);
        assert!(slid.y > 0.0);
    }
}
