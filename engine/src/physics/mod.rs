//! Rigid-body physics
//!
//! Fixed-step simulation of rigid bodies under gravity, impulse-based joints,
//! and the scene queries the character controller is built on.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s, angular velocities in rad/s
//! - Accelerations in m/s²
//! - Mass in kg
//!
//! # Submodules
//!
//! - [`types`] - Math types (Vec3, Quat) re-exported from glam, plus [`Transform`]
//! - [`collision`] - Ray and overlap primitives (slab AABB, sphere, capsule, OBB)
//! - [`shape`] - The [`CollisionShape`] trait and the built-in shapes
//! - [`object`] - Handles, collision filters and ghost objects
//! - [`body`] - [`RigidBody`]
//! - [`constraints`] - Joints: point-to-point, hinge, slider, cone-twist, 6-DOF
//! - [`world`] - [`PhysicsWorld`]: storage, stepping, queries, contact dispatch
//! - [`events`] - Contact data and listener types
//! - [`query`] - The read-only [`CollisionQuery`] view
//! - [`config`] - [`WorldConfig`] and JSON loading
//! - [`error`] - [`PhysicsError`]
//!
//! # Threading
//!
//! Nothing here is thread-safe. Step, mutate and query one world from a single
//! thread.

pub mod body;
pub mod collision;
pub mod config;
pub mod constraints;
pub mod error;
pub mod events;
pub mod object;
pub mod query;
pub mod shape;
pub mod types;
pub mod world;

pub use body::{BodyType, RigidBody};
pub use collision::RayHit;
pub use config::{BroadphaseType, WorldConfig};
pub use constraints::{
    AxisMotor, ConeTwist, Constraint, ConstraintHandle, ConstraintKind, ConstraintParam,
    Generic6Dof, Hinge, PointToPoint, Slider, SwingTwist,
};
pub use error::{PhysicsError, PhysicsResult};
pub use events::{CollisionCallback, CollisionContact};
pub use object::{
    BodyHandle, Collidable, CollisionGroups, CollisionObjectHandle, GhostHandle, GhostObject,
};
pub use query::{CollisionQuery, RaycastResult};
pub use shape::{Capsule, CollisionShape, Cuboid, ShapeRef, Sphere};
pub use types::{Quat, Transform, UP, Vec3};
pub use world::PhysicsWorld;
