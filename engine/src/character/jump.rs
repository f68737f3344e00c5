//! Jumping with coyote time
//!
//! The jump window is a small state machine:
//!
//! - **Grounded**: jumping is always allowed.
//! - **Airborne with grace**: the character walked off a ledge less than
//!   `coyote_time` seconds ago. Jumping is still allowed.
//! - **Airborne, expired**: no jump until the character lands again.
//!
//! Leaving the ground by jumping does not open a grace window.

use glam::Vec3;

use super::config::CharacterConfig;
use crate::physics::types::UP;

/// Share of the jump speed given to a directional jump's horizontal part.
pub const HORIZONTAL_JUMP_FACTOR: f32 = 0.5;

/// Velocity produced by a jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpImpulse {
    /// Upward speed, always the configured jump speed
    pub vertical: f32,
    /// Horizontal velocity, zero for a straight-up jump
    pub horizontal: Vec3,
}

/// Coyote-time tracker and jump emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpSystem {
    jump_speed: f32,
    coyote_time: f32,
    jump_timeout: f32,
    was_jumping: bool,
}

impl JumpSystem {
    pub fn new(jump_speed: f32, coyote_time: f32) -> Self {
        Self {
            jump_speed,
            coyote_time,
            jump_timeout: 0.0,
            was_jumping: false,
        }
    }

    pub fn from_config(config: &CharacterConfig) -> Self {
        Self::new(config.jump_speed, config.coyote_time)
    }

    pub fn jump_speed(&self) -> f32 {
        self.jump_speed
    }

    pub fn coyote_time(&self) -> f32 {
        self.coyote_time
    }

    /// Seconds left in the current grace window.
    pub fn jump_timeout(&self) -> f32 {
        self.jump_timeout
    }

    /// True from a jump until the next landing.
    pub fn is_jumping(&self) -> bool {
        self.was_jumping
    }

    pub fn can_jump(&self, is_on_ground: bool) -> bool {
        is_on_ground || self.jump_timeout > 0.0
    }

    /// Advance the grace window by `dt`.
    pub fn update(
        &mut self,
        dt: f32,
        is_on_ground: bool,
        was_on_ground: bool,
        vertical_velocity: f32,
    ) {
        if is_on_ground {
            if vertical_velocity <= 0.0 {
                self.was_jumping = false;
            }
            self.jump_timeout = 0.0;
            return;
        }

        if was_on_ground && !self.was_jumping {
            // Walked off a ledge this frame
            self.jump_timeout = self.coyote_time;
            log::trace!("Jump: left ground, coyote window {:.3}s", self.coyote_time);
            return;
        }

        self.jump_timeout = (self.jump_timeout - dt).max(0.0);
    }

    /// Emit a jump. Callers gate this with [`can_jump`](Self::can_jump).
    ///
    /// A `direction` with a horizontal part adds half the jump speed along it.
    pub fn jump(&mut self, direction: Option<Vec3>) -> JumpImpulse {
        let horizontal = direction
            .map(|d| (d - UP * d.dot(UP)).normalize_or_zero())
            .unwrap_or(Vec3::ZERO)
            * (self.jump_speed * HORIZONTAL_JUMP_FACTOR);

        self.was_jumping = true;
        self.jump_timeout = 0.0;
        JumpImpulse {
            vertical: self.jump_speed,
            horizontal,
        }
    }

    /// [`jump`](Self::jump), then hand the impulse to `on_jump`.
    pub fn jump_with<F>(&mut self, direction: Option<Vec3>, on_jump: F) -> JumpImpulse
    where
        F: FnOnce(&JumpImpulse),
    {
        let impulse = self.jump(direction);
        on_jump(&impulse);
        impulse
    }

    pub fn reset(&mut self) {
        self.jump_timeout = 0.0;
        self.was_jumping = false;
    }
}
