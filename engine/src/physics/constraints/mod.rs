//! Joints between rigid bodies
//!
//! A [`Constraint`] holds the state every joint shares (bodies, enabled flag,
//! breaking threshold, parameter overrides) plus one [`ConstraintKind`]
//! variant with the joint-specific geometry, limits and motors.
//!
//! # Solving
//!
//! Each joint corrects velocities with Baumgarte-style impulses, one solve
//! per step:
//!
//! 1. positional correction (pivots or frame origins), scaled by `ERP / dt`
//! 2. angular correction (axis alignment, or relative-quaternion decomposition)
//! 3. motors, clamped to `max_motor_force · dt`
//! 4. limits, which win over motors
//! 5. damping ([`ConeTwist`] only)
//!
//! There is no global iterative pass; `solver_iterations` is informational.
//!
//! # Axis numbering
//!
//! Parameters that depend on an axis use the six-slot convention: `0..3` are
//! linear X/Y/Z of frame A, `3..6` are angular X/Y/Z. `None` addresses the
//! joint's primary degree of freedom.
//!
//! # Example
//!
//! ```ignore
//! use kinema_engine::physics::{Constraint, Hinge, Vec3};
//!
//! let mut door = Hinge::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), Vec3::Y, Vec3::Y);
//! door.set_limit(0.0, std::f32::consts::FRAC_PI_2);
//! let handle = world.add_constraint(Constraint::new(frame, Some(panel), door))?;
//! ```

mod cone_twist;
mod generic_6dof;
mod hinge;
mod point_to_point;
mod slider;
pub(crate) mod solver;

use std::collections::HashMap;

pub use cone_twist::{ConeTwist, SwingTwist};
pub use generic_6dof::Generic6Dof;
pub use hinge::Hinge;
pub use point_to_point::PointToPoint;
pub use slider::Slider;

use solver::{ImpulseTally, SolverBody};

use super::object::BodyHandle;

/// First angular slot in the six-axis numbering.
pub const ANGULAR_AXIS_OFFSET: usize = 3;

/// Stable identifier of a constraint inside one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintHandle(pub(crate) u32);

impl ConstraintHandle {
    /// Raw numeric id.
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Tunable joint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintParam {
    /// Error reduction for the joint's equality rows (default 0.2)
    Erp,
    /// Error reduction when a limit is violated (default 0.2)
    StopErp,
    /// Constraint force mixing; softens equality rows (default 0)
    Cfm,
    /// Constraint force mixing for limit rows (default 0)
    StopCfm,
    /// Lower limit (m or rad)
    LowerLimit,
    /// Upper limit (m or rad)
    UpperLimit,
    /// Motor target velocity (m/s or rad/s)
    TargetVelocity,
    /// Maximum motor force (N or N·m)
    MaxMotorForce,
}

impl ConstraintParam {
    /// Value used when no override and no joint-specific field exists.
    pub fn default_value(self) -> f32 {
        match self {
            Self::Erp | Self::StopErp => 0.2,
            _ => 0.0,
        }
    }
}

/// Per-(parameter, axis) overrides. Lookups fall back from the axis entry to the
/// axis-less entry and then to [`ConstraintParam::default_value`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamTable(HashMap<(ConstraintParam, Option<usize>), f32>);

impl ParamTable {
    pub fn get(&self, param: ConstraintParam, axis: Option<usize>) -> f32 {
        self.0
            .get(&(param, axis))
            .or_else(|| axis.and_then(|_| self.0.get(&(param, None))))
            .copied()
            .unwrap_or(param.default_value())
    }

    fn set(&mut self, param: ConstraintParam, axis: Option<usize>, value: f32) {
        self.0.insert((param, axis), value);
    }
}

/// Motor slot used by joints with per-axis drives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisMotor {
    /// Whether the motor runs
    pub enabled: bool,
    /// Desired relative velocity along the axis
    pub target_velocity: f32,
    /// Force limit; the impulse per step is clamped to `max_force · dt`
    pub max_force: f32,
}

impl AxisMotor {
    /// A running motor.
    pub fn new(target_velocity: f32, max_force: f32) -> Self {
        Self {
            enabled: true,
            target_velocity,
            max_force,
        }
    }

    /// Impulse bound for one step.
    pub(crate) fn impulse_bound(&self, dt: f32) -> f32 {
        self.max_force.max(0.0) * dt
    }
}

/// Joint-specific state.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// Ball-and-socket
    PointToPoint(PointToPoint),
    /// Single rotational axis
    Hinge(Hinge),
    /// Translation and rotation along one axis
    Slider(Slider),
    /// Ball-and-socket with elliptical swing and twist limits
    ConeTwist(ConeTwist),
    /// Six independently limited axes
    Generic6Dof(Generic6Dof),
}

macro_rules! impl_from_kind {
    ($($variant:ident),*) => {
        $(impl From<$variant> for ConstraintKind {
            fn from(joint: $variant) -> Self {
                Self::$variant(joint)
            }
        })*
    };
}

impl_from_kind!(PointToPoint, Hinge, Slider, ConeTwist, Generic6Dof);

impl ConstraintKind {
    /// Short type name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointToPoint(_) => "point-to-point",
            Self::Hinge(_) => "hinge",
            Self::Slider(_) => "slider",
            Self::ConeTwist(_) => "cone-twist",
            Self::Generic6Dof(_) => "generic-6dof",
        }
    }

    fn set_typed_param(&mut self, param: ConstraintParam, axis: Option<usize>, value: f32) -> bool {
        match self {
            Self::PointToPoint(_) => false,
            Self::Hinge(j) => j.set_typed_param(param, value),
            Self::Slider(j) => j.set_typed_param(param, axis, value),
            Self::ConeTwist(j) => j.set_typed_param(param, axis, value),
            Self::Generic6Dof(j) => j.set_typed_param(param, axis, value),
        }
    }

    fn typed_param(&self, param: ConstraintParam, axis: Option<usize>) -> Option<f32> {
        match self {
            Self::PointToPoint(_) => None,
            Self::Hinge(j) => j.typed_param(param),
            Self::Slider(j) => j.typed_param(param, axis),
            Self::ConeTwist(j) => j.typed_param(param, axis),
            Self::Generic6Dof(j) => j.typed_param(param, axis),
        }
    }
}

/// A joint between body A and either body B or the world frame.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub(crate) id: Option<ConstraintHandle>,
    body_a: BodyHandle,
    body_b: Option<BodyHandle>,
    enabled: bool,
    breaking_threshold: f32,
    applied_impulse: f32,
    params: ParamTable,
    kind: ConstraintKind,
}

impl Constraint {
    /// Create an enabled, unbreakable joint. `body_b = None` pins A to the world frame.
    pub fn new(
        body_a: BodyHandle,
        body_b: Option<BodyHandle>,
        kind: impl Into<ConstraintKind>,
    ) -> Self {
        Self {
            id: None,
            body_a,
            body_b,
            enabled: true,
            breaking_threshold: f32::INFINITY,
            applied_impulse: 0.0,
            params: ParamTable::default(),
            kind: kind.into(),
        }
    }

    /// Set the impulse magnitude above which the joint disables itself.
    pub fn with_breaking_threshold(mut self, threshold: f32) -> Self {
        self.breaking_threshold = threshold;
        self
    }

    /// Handle assigned on registration, `None` before.
    pub fn id(&self) -> Option<ConstraintHandle> {
        self.id
    }

    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    pub fn body_b(&self) -> Option<BodyHandle> {
        self.body_b
    }

    /// Whether `body` is either side of this joint.
    pub fn references(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == Some(body)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the joint. Re-enabling a broken joint is allowed.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn breaking_threshold(&self) -> f32 {
        self.breaking_threshold
    }

    pub fn set_breaking_threshold(&mut self, threshold: f32) {
        self.breaking_threshold = threshold;
    }

    /// Impulse magnitude applied by the last solve.
    pub fn applied_impulse(&self) -> f32 {
        self.applied_impulse
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ConstraintKind {
        &mut self.kind
    }

    /// Set a parameter. Limit and motor parameters update the joint's own
    /// fields; everything else goes to the override table.
    pub fn set_param(&mut self, param: ConstraintParam, value: f32, axis: Option<usize>) {
        if !self.kind.set_typed_param(param, axis, value) {
            self.params.set(param, axis, value);
        }
    }

    /// Read a parameter, falling back to the joint field or the default.
    pub fn get_param(&self, param: ConstraintParam, axis: Option<usize>) -> f32 {
        self.kind
            .typed_param(param, axis)
            .unwrap_or_else(|| self.params.get(param, axis))
    }

    /// Record the impulse of the last solve and break the joint if it exceeds
    /// the threshold.
    pub(crate) fn update_applied_impulse(&mut self, impulse: f32) {
        self.applied_impulse = impulse;
        if self.enabled && impulse > self.breaking_threshold {
            self.enabled = false;
            log::warn!(
                "Constraint {:?} ({}): broke with impulse {:.3} > threshold {:.3}",
                self.id,
                self.kind.name(),
                impulse,
                self.breaking_threshold
            );
        }
    }

    /// Run one solve on the two body snapshots. Disabled joints do nothing.
    pub(crate) fn solve(&mut self, a: &mut SolverBody, b: &mut SolverBody, dt: f32) {
        if !self.enabled || dt <= 0.0 {
            return;
        }
        let params = &self.params;
        let tally: ImpulseTally = match &mut self.kind {
            ConstraintKind::PointToPoint(j) => j.solve(params, a, b, dt),
            ConstraintKind::Hinge(j) => j.solve(params, a, b, dt),
            ConstraintKind::Slider(j) => j.solve(params, a, b, dt),
            ConstraintKind::ConeTwist(j) => j.solve(params, a, b, dt),
            ConstraintKind::Generic6Dof(j) => j.solve(params, a, b, dt),
        };
        self.update_applied_impulse(tally.magnitude());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_param_fallback_chain() {
        let mut c = Constraint::new(BodyHandle(0), None, PointToPoint::new(Vec3::ZERO, Vec3::ZERO));
        assert_eq!(c.get_param(ConstraintParam::Erp, None), 0.2);
        c.set_param(ConstraintParam::Erp, 0.5, None);
        assert_eq!(c.get_param(ConstraintParam::Erp, Some(1)), 0.5);
        c.set_param(ConstraintParam::Erp, 0.8, Some(1));
        assert_eq!(c.get_param(ConstraintParam::Erp, Some(1)), 0.8);
        assert_eq!(c.get_param(ConstraintParam::Erp, Some(2)), 0.5);
    }

    #[test]
    fn test_limit_params_route_to_hinge() {
        let mut c = Constraint::new(
            BodyHandle(0),
            None,
            Hinge::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, Vec3::Y),
        );
        c.set_param(ConstraintParam::UpperLimit, 1.25, None);
        match c.kind() {
            ConstraintKind::Hinge(h) => assert_eq!(h.upper_limit(), 1.25),
            other => panic!("unexpected kind {}", other.name()),
        }
        assert_eq!(c.get_param(ConstraintParam::UpperLimit, None), 1.25);
    }

    #[test]
    fn test_breaking_disables() {
        let mut c = Constraint::new(BodyHandle(0), None, PointToPoint::new(Vec3::ZERO, Vec3::ZERO))
            .with_breaking_threshold(1.0);
        c.update_applied_impulse(0.5);
        assert!(c.is_enabled());
        c.update_applied_impulse(1.5);
        assert!(!c.is_enabled());
        c.set_enabled(true);
        assert!(c.is_enabled());
    }
}
