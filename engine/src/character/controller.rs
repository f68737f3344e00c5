//! Character Controller
//!
//! Composes ground detection, jumping, platform carry and collide-and-slide
//! movement into one per-frame update.
//!
//! # Frame order
//!
//! 1. Check for ground at the current feet position (never while rising)
//! 2. Update the coyote window from this and last frame's ground state
//! 3. Track the supporting object and read its velocity
//! 4. Start a jump if requested and allowed
//! 5. Apply gravity (or zero the fall speed while standing)
//! 6. Lift the feet out of the ground if they sank into it
//! 7. Slide the horizontal displacement plus platform carry
//! 8. Move vertically: snap down onto the ground while standing,
//!    otherwise fall or rise by `vertical_velocity * dt`
//! 9. React to what the vertical move hit

use glam::Vec3;

use super::config::CharacterConfig;
use super::ground::{GroundDetector, GroundInfo};
use super::jump::JumpSystem;
use super::movement::{MovementSystem, VerticalContact};
use super::platform::PlatformTracker;
use crate::physics::query::CollisionQuery;
use crate::physics::shape::Capsule;
use crate::physics::types::UP;

/// What one [`CharacterController::update`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterState {
    /// Feet position after the move
    pub position: Vec3,
    pub vertical_velocity: f32,
    /// Ground state at the start of the frame
    pub ground: GroundInfo,
    /// Velocity inherited from the supporting platform
    pub platform_velocity: Vec3,
    /// A jump started this frame
    pub jumped: bool,
}

/// Kinematic capsule character.
#[derive(Debug, Clone)]
pub struct CharacterController {
    config: CharacterConfig,
    position: Vec3,
    vertical_velocity: f32,
    ground: GroundInfo,
    was_on_ground: bool,
    detector: GroundDetector,
    movement: MovementSystem,
    jump: JumpSystem,
    platform: PlatformTracker,
}

impl CharacterController {
    /// Create a controller with its feet at `position`.
    pub fn new(config: CharacterConfig, position: Vec3) -> Self {
        Self {
            detector: GroundDetector::from_config(&config),
            movement: MovementSystem::from_config(&config),
            jump: JumpSystem::from_config(&config),
            platform: PlatformTracker::from_config(&config),
            config,
            position,
            vertical_velocity: 0.0,
            ground: GroundInfo::airborne(),
            was_on_ground: false,
        }
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleport. Clears fall speed and platform tracking.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.vertical_velocity = 0.0;
        self.platform.reset();
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn ground(&self) -> &GroundInfo {
        &self.ground
    }

    pub fn is_on_ground(&self) -> bool {
        self.ground.is_on_ground
    }

    pub fn jump_system(&self) -> &JumpSystem {
        &self.jump
    }

    pub fn platform_tracker(&self) -> &PlatformTracker {
        &self.platform
    }

    /// Shape for a ghost object that stands in for the character in the world.
    pub fn ghost_shape(&self) -> Capsule {
        Capsule::from_height(self.config.radius, self.config.height)
    }

    /// Capsule center, where the ghost object should be placed.
    pub fn ghost_position(&self) -> Vec3 {
        self.position + UP * self.config.half_height()
    }

    /// Advance the character by one frame.
    ///
    /// `displacement` is the desired horizontal move for this frame; its
    /// vertical part is ignored. Non-positive or non-finite `dt` leaves the
    /// character untouched.
    pub fn update(
        &mut self,
        query: &dyn CollisionQuery,
        dt: f32,
        displacement: Vec3,
        jump_pressed: bool,
    ) -> CharacterState {
        if !(dt.is_finite() && dt > 0.0) {
            return self.state(Vec3::ZERO, false);
        }

        self.ground = self.detector.check(query, self.position);
        if self.vertical_velocity > 0.0 {
            // Still rising from a jump
            self.ground = GroundInfo::airborne();
        }
        let on_ground = self.ground.is_on_ground;
        self.jump.update(dt, on_ground, self.was_on_ground, self.vertical_velocity);

        let support = if on_ground { self.ground.ground_object } else { None };
        let platform_velocity = self.platform.update(query, support);

        let jumped = jump_pressed && self.jump.can_jump(on_ground);
        if jumped {
            let impulse = self.jump.jump(None);
            self.vertical_velocity = impulse.vertical;
            log::trace!("Character: jump at {:?}", self.position);
        } else if on_ground && self.vertical_velocity <= 0.0 {
            self.vertical_velocity = 0.0;
        } else {
            self.vertical_velocity -= self.config.gravity * dt;
        }

        if on_ground && self.ground.ground_distance < 0.0 {
            self.position.y -= self.ground.ground_distance;
        }

        let carry = platform_velocity * dt;
        let horizontal = Vec3::new(displacement.x + carry.x, 0.0, displacement.z + carry.z);
        self.position = self.movement.perform_horizontal(query, self.position, horizontal);

        let standing = on_ground && !jumped;
        if standing {
            self.follow_ground(query, carry.y);
        } else {
            self.move_vertically(query, self.vertical_velocity * dt);
        }

        self.was_on_ground = on_ground;
        self.state(platform_velocity, jumped)
    }

    /// Keep the feet on the ground, riding any vertical platform motion.
    fn follow_ground(&mut self, query: &dyn CollisionQuery, rise: f32) {
        if rise > 0.0 {
            self.position = self.movement.perform_vertical(query, self.position, rise).position;
        }
        let reach = self.config.step_height + rise.min(0.0).abs();
        let snap = self.movement.perform_vertical(query, self.position, -reach);
        // Walking off a ledge: stay put and start falling next frame
        if matches!(snap.contact, Some(VerticalContact::Ground { .. })) {
            self.position = snap.position;
        }
    }

    fn move_vertically(&mut self, query: &dyn CollisionQuery, dy: f32) {
        let step = self.movement.perform_vertical(query, self.position, dy);
        self.position = step.position;
        match step.contact {
            Some(VerticalContact::Ground { .. }) => {
                self.vertical_velocity = self.vertical_velocity.max(0.0);
            }
            Some(VerticalContact::Ceiling) => {
                self.vertical_velocity = self.vertical_velocity.min(0.0);
            }
            Some(VerticalContact::SteepSurface { .. }) | None => {}
        }
    }

    fn state(&self, platform_velocity: Vec3, jumped: bool) -> CharacterState {
        CharacterState {
            position: self.position,
            vertical_velocity: self.vertical_velocity,
            ground: self.ground,
            platform_velocity,
            jumped,
        }
    }

    /// Forget motion state, keeping the position.
    pub fn reset(&mut self) {
        self.vertical_velocity = 0.0;
        self.ground = GroundInfo::airborne();
        self.was_on_ground = false;
        self.jump.reset();
        self.platform.reset();
    }
}
