//! Kinematic character controller
//!
//! A capsule-shaped character that is moved by the game, not by the solver.
//! Each frame the controller:
//!
//! 1. checks for ground below the feet ([`GroundDetector`])
//! 2. updates the coyote-time window and handles jump requests ([`JumpSystem`])
//! 3. picks up the velocity of a moving platform it stands on ([`PlatformTracker`])
//! 4. slides the horizontal displacement along obstacles ([`MovementSystem`])
//! 5. applies the vertical displacement and classifies what it hit
//!
//! Every algorithm only needs a [`CollisionQuery`](crate::physics::CollisionQuery),
//! so they run against a [`PhysicsWorld`](crate::physics::PhysicsWorld) or any
//! hand-built scene. None of them can fail: a missed ray is a valid answer.
//!
//! Positions are at the character's feet (bottom of the capsule).
//!
//! # Usage
//!
//! ```rust,ignore
//! use kinema_engine::character::{CharacterConfig, CharacterController};
//!
//! let mut controller = CharacterController::new(CharacterConfig::default(), spawn_point);
//!
//! // Each frame:
//! let state = controller.update(&world, delta_time, desired_displacement, jump_pressed);
//! world.set_collision_object_position(ghost, controller.ghost_position())?;
//! ```

pub mod config;
pub mod controller;
pub mod ground;
pub mod jump;
pub mod movement;
pub mod platform;
pub mod sweep;

pub use config::CharacterConfig;
pub use controller::{CharacterController, CharacterState};
pub use ground::{GroundDetector, GroundInfo};
pub use jump::{JumpImpulse, JumpSystem};
pub use movement::{MovementSystem, VerticalContact, VerticalMove};
pub use platform::PlatformTracker;
pub use sweep::{SweepContact, SweepResult, SweepTester};

use glam::Vec3;

use crate::physics::types::UP;

/// Angle between a surface normal and world up, in radians.
#[inline]
pub fn slope_angle(normal: Vec3) -> f32 {
    normal.dot(UP).clamp(-1.0, 1.0).acos()
}
