//! Character configuration
//!
//! Defaults match a 1.8 m tall humanoid walking on a world with arcade
//! gravity. Missing JSON fields fall back to these defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::object::CollisionGroups;

/// Capsule radius in meters
pub const DEFAULT_RADIUS: f32 = 0.3;

/// Capsule height (caps included) in meters
pub const DEFAULT_HEIGHT: f32 = 1.8;

/// Highest ledge the character steps onto without jumping
pub const DEFAULT_STEP_HEIGHT: f32 = 0.35;

/// Gap kept between the capsule and anything it touches
pub const DEFAULT_SKIN_WIDTH: f32 = 0.02;

/// Jump velocity in meters per second
pub const DEFAULT_JUMP_SPEED: f32 = 8.0;

/// Coyote time duration in seconds
/// Allows jumping shortly after leaving ground
pub const DEFAULT_COYOTE_TIME: f32 = 0.1;

/// Gravity acceleration in meters per second squared
pub const DEFAULT_GRAVITY: f32 = 20.0;

/// Frame rate assumed when turning platform displacement into velocity
pub const DEFAULT_PLATFORM_FRAME_RATE: f32 = 60.0;

/// Tunables for [`CharacterController`](super::CharacterController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub radius: f32,
    pub height: f32,
    pub step_height: f32,
    pub skin_width: f32,
    /// Steepest walkable slope (radians)
    pub max_slope_angle: f32,
    pub jump_speed: f32,
    pub coyote_time: f32,
    pub gravity: f32,
    pub platform_frame_rate: f32,
    /// Groups the character's ground and sweep rays collide with
    pub query_mask: CollisionGroups,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            height: DEFAULT_HEIGHT,
            step_height: DEFAULT_STEP_HEIGHT,
            skin_width: DEFAULT_SKIN_WIDTH,
            max_slope_angle: 45f32.to_radians(),
            jump_speed: DEFAULT_JUMP_SPEED,
            coyote_time: DEFAULT_COYOTE_TIME,
            gravity: DEFAULT_GRAVITY,
            platform_frame_rate: DEFAULT_PLATFORM_FRAME_RATE,
            query_mask: CollisionGroups::DEFAULT
                | CollisionGroups::STATIC
                | CollisionGroups::KINEMATIC,
        }
    }
}

impl CharacterConfig {
    /// Check that the capsule and timings make sense.
    pub fn validate(&self) -> PhysicsResult<()> {
        let positive = [
            ("radius", self.radius),
            ("height", self.height),
            ("platform_frame_rate", self.platform_frame_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::invalid(format!("{name} must be > 0, got {value}")));
            }
        }
        let non_negative = [
            ("step_height", self.step_height),
            ("skin_width", self.skin_width),
            ("jump_speed", self.jump_speed),
            ("coyote_time", self.coyote_time),
            ("gravity", self.gravity),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::invalid(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.height < 2.0 * self.radius {
            return Err(PhysicsError::invalid(format!(
                "height {} is shorter than the capsule diameter {}",
                self.height,
                2.0 * self.radius
            )));
        }
        if !(0.0..=std::f32::consts::FRAC_PI_2).contains(&self.max_slope_angle) {
            return Err(PhysicsError::invalid(format!(
                "max_slope_angle must be within [0, pi/2], got {}",
                self.max_slope_angle
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        let config: CharacterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn load(path: &Path) -> PhysicsResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::debug!("Character config: loaded from {}", path.display());
        Ok(config)
    }

    /// Half the capsule height; the capsule center sits this far above the feet.
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }
}
