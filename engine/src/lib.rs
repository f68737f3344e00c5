//! Kinema Engine Library
//!
//! A fixed-step rigid-body physics core with mechanical joints and a kinematic
//! character controller.
//!
//! # Modules
//!
//! - [`physics`] - Bodies, shapes, the world step loop, queries and constraints
//! - [`character`] - Ground detection, swept movement, jumping and platform carry
//!
//! # Example
//!
//! ```ignore
//! use kinema_engine::physics::{Constraint, Hinge, PhysicsWorld, RigidBody, Sphere};
//! use kinema_engine::character::{CharacterConfig, CharacterController};
//! use glam::Vec3;
//!
//! let mut world = PhysicsWorld::new();
//!
//! // A door hanging from a fixed frame
//! let frame = world.add_rigid_body(RigidBody::fixed(Sphere::new(0.1)))?;
//! let door = world.add_rigid_body(
//!     RigidBody::dynamic(10.0, Sphere::new(0.5)).with_position(Vec3::new(1.0, 0.0, 0.0)),
//! )?;
//! let hinge = Hinge::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), Vec3::Y, Vec3::Y);
//! world.add_constraint(Constraint::new(frame, Some(door), hinge))?;
//!
//! // A player walking around the scene
//! let mut player = CharacterController::new(CharacterConfig::default(), Vec3::new(0.0, 0.0, 3.0));
//!
//! // Each frame:
//! world.advance(frame_time)?;
//! let state = player.update(&world, frame_time, walk_input * frame_time, jump_pressed);
//! ```

pub mod character;
pub mod physics;

// Re-export the types most callers need at crate level
pub use character::{CharacterConfig, CharacterController, CharacterState};
pub use physics::{
    BodyHandle, BodyType, CollisionGroups, Constraint, ConstraintHandle, PhysicsError,
    PhysicsResult, PhysicsWorld, RigidBody, WorldConfig,
};
