//! Moving platform tracking
//!
//! Remembers the object the character stood on last frame. While that object
//! stays the same, its per-frame displacement times the assumed frame rate is
//! the velocity the character inherits. Any change of support, including
//! stepping off onto nothing, resets the velocity to zero.

use glam::Vec3;

use super::config::CharacterConfig;
use crate::physics::object::CollisionObjectHandle;
use crate::physics::query::CollisionQuery;

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformTracker {
    platform: Option<CollisionObjectHandle>,
    last_position: Vec3,
    velocity: Vec3,
    frame_rate: f32,
}

impl Default for PlatformTracker {
    fn default() -> Self {
        Self::new(CharacterConfig::default().platform_frame_rate)
    }
}

impl PlatformTracker {
    pub fn new(frame_rate: f32) -> Self {
        Self {
            platform: None,
            last_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            frame_rate,
        }
    }

    pub fn from_config(config: &CharacterConfig) -> Self {
        Self::new(config.platform_frame_rate)
    }

    /// Track `ground_object` and return the carried velocity.
    pub fn update(
        &mut self,
        query: &dyn CollisionQuery,
        ground_object: Option<CollisionObjectHandle>,
    ) -> Vec3 {
        let position = ground_object.and_then(|object| query.object_position(object));

        if ground_object == self.platform {
            if let Some(position) = position {
                self.velocity = (position - self.last_position) * self.frame_rate;
                self.last_position = position;
            } else {
                self.velocity = Vec3::ZERO;
            }
            return self.velocity;
        }

        if let Some(object) = ground_object {
            log::trace!("Platform: now tracking {object}");
        }
        self.platform = ground_object;
        self.last_position = position.unwrap_or(Vec3::ZERO);
        self.velocity = Vec3::ZERO;
        self.velocity
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn platform(&self) -> Option<CollisionObjectHandle> {
        self.platform
    }

    pub fn reset(&mut self) {
        self.platform = None;
        self.last_position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::object::{BodyHandle, CollisionGroups};
    use crate::physics::query::RaycastResult;
    use std::cell::Cell;

    /// Two objects: 1 moves along +X each call, 2 stays put.
    struct Conveyor {
        x: Cell<f32>,
    }

    impl CollisionQuery for Conveyor {
        fn raycast(&self, _from: Vec3, _to: Vec3, _mask: CollisionGroups) -> Option<RaycastResult> {
            None
        }

        fn object_position(&self, object: CollisionObjectHandle) -> Option<Vec3> {
            match object.body()?.0 {
                1 => {
                    let x = self.x.get();
                    self.x.set(x + 0.05);
                    Some(Vec3::new(x, 0.0, 0.0))
                }
                2 => Some(Vec3::new(0.0, 0.0, 5.0)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_constant_velocity_is_recovered() {
        let scene = Conveyor { x: Cell::new(0.0) };
        let mut tracker = PlatformTracker::new(60.0);
        let moving = Some(BodyHandle(1).into());

        assert_eq!(tracker.update(&scene, moving), Vec3::ZERO);
        let velocity = tracker.update(&scene, moving);
        assert!((velocity.x - 3.0).abs() < 1e-4);
        assert_eq!(tracker.platform(), moving);
    }

    #[test]
    fn test_switching_platform_resets_velocity() {
        let scene = Conveyor { x: Cell::new(0.0) };
        let mut tracker = PlatformTracker::new(60.0);
        let moving = Some(BodyHandle(1).into());
        tracker.update(&scene, moving);
        tracker.update(&scene, moving);
        assert!(tracker.velocity().x > 0.0);

        assert_eq!(tracker.update(&scene, Some(BodyHandle(2).into())), Vec3::ZERO);
        assert_eq!(tracker.update(&scene, Some(BodyHandle(2).into())), Vec3::ZERO);
        assert_eq!(tracker.update(&scene, None), Vec3::ZERO);
        assert_eq!(tracker.platform(), None);
    }
}
