//! World configuration
//!
//! [`WorldConfig`] holds the global simulation parameters. It can be built in
//! code or loaded from a JSON file; missing fields fall back to defaults.
//!
//! ```json
//! { "gravity": [0.0, -9.81, 0.0], "time_step": 0.016666668, "max_sub_steps": 4 }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::{PhysicsError, PhysicsResult};
use super::types::is_finite_vec;

/// Default fixed step (60 Hz)
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Default solver iteration count (informational, see [`WorldConfig::solver_iterations`])
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 10;

/// Default cap on fixed sub-steps taken by one [`advance`](super::PhysicsWorld::advance) call
pub const DEFAULT_MAX_SUB_STEPS: u32 = 5;

/// Broadphase algorithm tag.
///
/// Recorded for tooling and diagnostics only; pair detection is always brute force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadphaseType {
    /// Test every pair
    #[default]
    BruteForce,
    /// Sort-and-sweep along one axis
    SweepAndPrune,
    /// Incrementally updated AABB tree
    DynamicAabbTree,
}

/// Global simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity acceleration (m/s²)
    pub gravity: Vec3,
    /// Fixed step used by [`advance`](super::PhysicsWorld::advance) (seconds)
    pub time_step: f32,
    /// Solver iteration count. Constraints are solved once per step regardless.
    pub solver_iterations: u32,
    /// Broadphase tag (informational)
    pub broadphase: BroadphaseType,
    /// Maximum fixed steps taken per `advance` call; surplus time is dropped
    pub max_sub_steps: u32,
    /// Whether `step` solves every enabled constraint in registration order
    pub solve_constraints_in_step: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            time_step: DEFAULT_TIME_STEP,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            broadphase: BroadphaseType::BruteForce,
            max_sub_steps: DEFAULT_MAX_SUB_STEPS,
            solve_constraints_in_step: true,
        }
    }
}

impl WorldConfig {
    /// Config with custom gravity and defaults for everything else.
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> PhysicsResult<()> {
        if !is_finite_vec(self.gravity) {
            return Err(PhysicsError::invalid("gravity must be finite"));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(PhysicsError::invalid(format!(
                "time_step must be > 0, got {}",
                self.time_step
            )));
        }
        if self.max_sub_steps == 0 {
            return Err(PhysicsError::invalid("max_sub_steps must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn load(path: &Path) -> PhysicsResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::debug!("World config: loaded from {}", path.display());
        Ok(config)
    }

    /// Write this config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> PhysicsResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
