//! Ground detection
//!
//! A single ray from `step_height` above the feet down to `step_height +
//! skin_width` below them. The character stands when the ray hits a walkable
//! surface no lower than `step_height` under the feet.

use glam::Vec3;

use super::config::CharacterConfig;
use super::slope_angle;
use crate::physics::object::{CollisionGroups, CollisionObjectHandle};
use crate::physics::query::CollisionQuery;
use crate::physics::types::UP;

/// Support under the character this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundInfo {
    pub is_on_ground: bool,
    /// Surface normal, [`UP`] when airborne
    pub ground_normal: Vec3,
    pub ground_object: Option<CollisionObjectHandle>,
    /// Height of the feet above the surface; negative when sunk into it,
    /// infinite when airborne
    pub ground_distance: f32,
    pub ground_hit_point: Option<Vec3>,
}

impl Default for GroundInfo {
    fn default() -> Self {
        Self::airborne()
    }
}

impl GroundInfo {
    /// No support.
    pub fn airborne() -> Self {
        Self {
            is_on_ground: false,
            ground_normal: UP,
            ground_object: None,
            ground_distance: f32::INFINITY,
            ground_hit_point: None,
        }
    }

    /// Slope of the supporting surface in radians.
    pub fn slope_angle(&self) -> f32 {
        slope_angle(self.ground_normal)
    }
}

/// Stateless downward ground check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundDetector {
    pub step_height: f32,
    pub skin_width: f32,
    pub max_slope_angle: f32,
    pub mask: CollisionGroups,
}

impl GroundDetector {
    pub fn new(step_height: f32, skin_width: f32, max_slope_angle: f32) -> Self {
        Self {
            step_height,
            skin_width,
            max_slope_angle,
            mask: CharacterConfig::default().query_mask,
        }
    }

    pub fn from_config(config: &CharacterConfig) -> Self {
        Self {
            step_height: config.step_height,
            skin_width: config.skin_width,
            max_slope_angle: config.max_slope_angle,
            mask: config.query_mask,
        }
    }

    /// Set which groups count as ground.
    pub fn with_mask(mut self, mask: CollisionGroups) -> Self {
        self.mask = mask;
        self
    }

    /// Classify the support under feet at `position`.
    pub fn check(&self, query: &dyn CollisionQuery, position: Vec3) -> GroundInfo {
        let from = position + UP * self.step_height;
        let to = position - UP * (self.step_height + self.skin_width);
        let Some(hit) = query.raycast(from, to, self.mask) else {
            return GroundInfo::airborne();
        };

        let ground_distance = hit.distance - self.step_height;
        let walkable = slope_angle(hit.normal) <= self.max_slope_angle;
        if !walkable || ground_distance > self.step_height {
            return GroundInfo::airborne();
        }
        GroundInfo {
            is_on_ground: true,
            ground_normal: hit.normal,
            ground_object: Some(hit.object),
            ground_distance,
            ground_hit_point: Some(hit.point),
        }
    }
}
