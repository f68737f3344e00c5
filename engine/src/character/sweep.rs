//! Capsule sweep
//!
//! Approximates sweeping the character capsule by one ray from its vertical
//! center. The ray is lengthened by the capsule's extent in the sweep
//! direction (its radius sideways, half its height straight up or down), and
//! that extent is subtracted again from the hit distance.

use glam::Vec3;

use super::config::CharacterConfig;
use crate::physics::object::{CollisionGroups, CollisionObjectHandle};
use crate::physics::query::CollisionQuery;
use crate::physics::types::UP;

/// What the sweep ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepContact {
    pub normal: Vec3,
    pub point: Vec3,
    pub object: CollisionObjectHandle,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    /// Free travel before touching `hit`, or the full requested distance
    pub distance: f32,
    pub hit: Option<SweepContact>,
}

impl SweepResult {
    fn clear(distance: f32) -> Self {
        Self {
            distance,
            hit: None,
        }
    }
}

/// Stateless swept-capsule test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepTester {
    pub radius: f32,
    pub height: f32,
    pub mask: CollisionGroups,
}

impl SweepTester {
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            mask: CharacterConfig::default().query_mask,
        }
    }

    pub fn from_config(config: &CharacterConfig) -> Self {
        Self {
            radius: config.radius,
            height: config.height,
            mask: config.query_mask,
        }
    }

    /// Capsule extent from its center along unit `direction`.
    pub fn extent(&self, direction: Vec3) -> f32 {
        let half_length = (self.height * 0.5 - self.radius).max(0.0);
        self.radius + direction.dot(UP).abs() * half_length
    }

    /// Sweep the capsule with feet at `start` by `distance` along `direction`.
    pub fn sweep(
        &self,
        query: &dyn CollisionQuery,
        start: Vec3,
        direction: Vec3,
        distance: f32,
    ) -> SweepResult {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !(distance > 0.0) {
            return SweepResult::clear(0.0);
        }
        let extent = self.extent(direction);
        let center = start + UP * (self.height * 0.5);
        let end = center + direction * (distance + extent);
        match query.raycast(center, end, self.mask) {
            Some(hit) => SweepResult {
                distance: (hit.distance - extent).max(0.0),
                hit: Some(SweepContact {
                    normal: hit.normal,
                    point: hit.point,
                    object: hit.object,
                }),
            },
            None => SweepResult::clear(distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::query::RaycastResult;
    use crate::physics::object::BodyHandle;

    /// Wall occupying x >= 2.
    struct Wall;

    impl CollisionQuery for Wall {
        fn raycast(&self, from: Vec3, to: Vec3, _mask: CollisionGroups) -> Option<RaycastResult> {
            if to.x < 2.0 || from.x >= 2.0 {
                return None;
            }
            let t = (2.0 - from.x) / (to.x - from.x);
            let length = (to - from).length();
            Some(RaycastResult {
                object: BodyHandle(1).into(),
                point: from.lerp(to, t),
                normal: Vec3::NEG_X,
                distance: length * t,
                fraction: t,
            })
        }

        fn object_position(&self, _object: CollisionObjectHandle) -> Option<Vec3> {
            None
        }
    }

    #[test]
    fn test_extent_depends_on_direction() {
        let tester = SweepTester::new(0.3, 1.8);
        assert!((tester.extent(Vec3::X) - 0.3).abs() < 1e-6);
        assert!((tester.extent(Vec3::NEG_Y) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_hit_distance_excludes_radius() {
        let tester = SweepTester::new(0.3, 1.8);
        let result = tester.sweep(&Wall, Vec3::ZERO, Vec3::X, 5.0);
        assert!((result.distance - 1.7).abs() < 1e-5);
        assert_eq!(result.hit.map(|h| h.normal), Some(Vec3::NEG_X));
    }

    #[test]
    fn test_miss_reports_full_distance() {
        let tester = SweepTester::new(0.3, 1.8);
        let result = tester.sweep(&Wall, Vec3::ZERO, Vec3::Z, 5.0);
        assert_eq!(result.distance, 5.0);
        assert!(result.hit.is_none());
    }
}
