//! Cone-twist joint
//!
//! A ball-and-socket joint whose relative rotation is split into a twist about
//! frame A's X axis and a swing that tilts that axis. The swing is bounded by
//! an ellipse with half-axes `swing_span1` (about local Y) and `swing_span2`
//! (about local Z); the twist is bounded by `±twist_span`.

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use super::solver::{
    ImpulseTally, SolverBody, angular_axis, angular_limit, limit_velocity_bounds, solve_point,
    wrap_angle,
};
use super::{ANGULAR_AXIS_OFFSET, ConstraintParam, ParamTable};
use crate::physics::types::Transform;

/// Slack on the ellipse test so a swing exactly on the boundary counts as inside.
const SWING_LIMIT_EPSILON: f32 = 1e-5;

/// Relative rotation of B's frame in A's frame, decomposed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingTwist {
    /// Swing component about local Y (rad)
    pub swing1: f32,
    /// Swing component about local Z (rad)
    pub swing2: f32,
    /// Twist about local X (rad, in `(-π, π]`)
    pub twist: f32,
}

impl SwingTwist {
    /// Decompose a relative rotation expressed in A's frame.
    pub fn from_relative(rotation: Quat) -> Self {
        let q = if rotation.w < 0.0 { -rotation } else { rotation };
        let twist = wrap_angle(2.0 * q.x.atan2(q.w));
        let twist_q = Quat::from_rotation_x(twist);
        let swing = (q * twist_q.inverse()).to_scaled_axis();
        Self {
            swing1: swing.y,
            swing2: swing.z,
            twist,
        }
    }

    /// `(swing1/span1)² + (swing2/span2)²`; 1 on the ellipse boundary.
    pub fn ellipse_factor(&self, span1: f32, span2: f32) -> f32 {
        let s1 = span1.max(f32::EPSILON);
        let s2 = span2.max(f32::EPSILON);
        (self.swing1 / s1).powi(2) + (self.swing2 / s2).powi(2)
    }
}

/// Ball-and-socket joint with elliptical swing and twist limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeTwist {
    frame_a: Transform,
    frame_b: Transform,
    swing_span1: f32,
    swing_span2: f32,
    twist_span: f32,
    damping: f32,
    motor_enabled: bool,
    motor_target: Vec3,
    max_motor_force: f32,
}

impl ConeTwist {
    /// Create a joint from the two local frames. Limits start wide open.
    pub fn new(frame_a: Transform, frame_b: Transform) -> Self {
        Self {
            frame_a,
            frame_b,
            swing_span1: PI,
            swing_span2: PI,
            twist_span: PI,
            damping: 0.01,
            motor_enabled: false,
            motor_target: Vec3::ZERO,
            max_motor_force: 0.0,
        }
    }

    /// Set the swing ellipse half-axes and the twist bound (radians).
    pub fn set_limit(&mut self, swing_span1: f32, swing_span2: f32, twist_span: f32) {
        self.swing_span1 = swing_span1.abs();
        self.swing_span2 = swing_span2.abs();
        self.twist_span = twist_span.abs();
    }

    pub fn swing_span1(&self) -> f32 {
        self.swing_span1
    }

    pub fn swing_span2(&self) -> f32 {
        self.swing_span2
    }

    pub fn twist_span(&self) -> f32 {
        self.twist_span
    }

    /// Fraction of relative angular velocity removed each solve (0..=1).
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Drive the relative angular velocity (in A's frame) towards `target`.
    pub fn enable_motor(&mut self, target: Vec3, max_motor_force: f32) {
        self.motor_enabled = true;
        self.motor_target = target;
        self.max_motor_force = max_motor_force;
    }

    pub fn disable_motor(&mut self) {
        self.motor_enabled = false;
    }

    fn world_frames(&self, a: &Transform, b: &Transform) -> (Transform, Transform) {
        (a.compose(&self.frame_a), b.compose(&self.frame_b))
    }

    /// Current swing/twist of B relative to A.
    pub fn swing_twist(&self, a: &Transform, b: &Transform) -> SwingTwist {
        let (fa, fb) = self.world_frames(a, b);
        SwingTwist::from_relative(fa.rotation.inverse() * fb.rotation)
    }

    fn slot(axis: Option<usize>) -> Option<usize> {
        axis.and_then(|i| i.checked_sub(ANGULAR_AXIS_OFFSET)).filter(|i| *i < 3)
    }

    pub(crate) fn set_typed_param(
        &mut self,
        param: ConstraintParam,
        axis: Option<usize>,
        value: f32,
    ) -> bool {
        match (param, Self::slot(axis)) {
            (ConstraintParam::LowerLimit | ConstraintParam::UpperLimit, Some(0)) => {
                self.twist_span = value.abs()
            }
            (ConstraintParam::LowerLimit | ConstraintParam::UpperLimit, Some(1)) => {
                self.swing_span1 = value.abs()
            }
            (ConstraintParam::LowerLimit | ConstraintParam::UpperLimit, Some(2)) => {
                self.swing_span2 = value.abs()
            }
            (ConstraintParam::TargetVelocity, Some(i)) => self.motor_target[i] = value,
            (ConstraintParam::MaxMotorForce, _) => self.max_motor_force = value,
            _ => return false,
        }
        true
    }

    pub(crate) fn typed_param(&self, param: ConstraintParam, axis: Option<usize>) -> Option<f32> {
        match (param, Self::slot(axis)) {
            (ConstraintParam::LowerLimit, Some(0)) => Some(-self.twist_span),
            (ConstraintParam::UpperLimit, Some(0)) => Some(self.twist_span),
            (ConstraintParam::LowerLimit, Some(1)) => Some(-self.swing_span1),
            (ConstraintParam::UpperLimit, Some(1)) => Some(self.swing_span1),
            (ConstraintParam::LowerLimit, Some(2)) => Some(-self.swing_span2),
            (ConstraintParam::UpperLimit, Some(2)) => Some(self.swing_span2),
            (ConstraintParam::TargetVelocity, Some(i)) => Some(self.motor_target[i]),
            (ConstraintParam::MaxMotorForce, _) => Some(self.max_motor_force),
            _ => None,
        }
    }

    pub(crate) fn solve(
        &mut self,
        params: &ParamTable,
        a: &mut SolverBody,
        b: &mut SolverBody,
        dt: f32,
    ) -> ImpulseTally {
        let erp = params.get(ConstraintParam::Erp, None);
        let cfm = params.get(ConstraintParam::Cfm, None);
        let stop_erp = params.get(ConstraintParam::StopErp, None);
        let stop_cfm = params.get(ConstraintParam::StopCfm, None);
        let mut tally = ImpulseTally::default();

        let (fa, fb) = self.world_frames(&a.transform, &b.transform);
        solve_point(a, b, fa.position, fb.position, erp, cfm, dt, &mut tally);

        // Motor
        if self.motor_enabled {
            let bound = self.max_motor_force.max(0.0) * dt;
            for (i, local) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
                let n = fa.rotate(local);
                let lambda = angular_axis(a, b, n, self.motor_target[i], cfm, -bound, bound);
                tally.angular += n * lambda;
            }
        }

        let st = SwingTwist::from_relative(fa.rotation.inverse() * fb.rotation);

        // Swing cone
        let f = st.ellipse_factor(self.swing_span1, self.swing_span2);
        if f > 1.0 + SWING_LIMIT_EPSILON {
            let scale = 1.0 / f.sqrt();
            let excess = Vec3::new(0.0, st.swing1, st.swing2) * (1.0 - scale);
            let depth = excess.length();
            if depth > f32::EPSILON {
                let n = fa.rotate(excess / depth);
                let v_max = -depth * stop_erp / dt;
                let lambda = angular_limit(a, b, n, (f32::NEG_INFINITY, v_max), stop_cfm);
                tally.angular += n * lambda;
            }
        }

        // Twist
        let twist_axis = fa.rotate(Vec3::X);
        let bounds =
            limit_velocity_bounds(st.twist, -self.twist_span, self.twist_span, stop_erp, dt);
        let lambda = angular_limit(a, b, twist_axis, bounds, stop_cfm);
        tally.angular += twist_axis * lambda;

        // Damping
        if self.damping > 0.0 {
            let w_rel = b.angular_velocity - a.angular_velocity;
            let speed = w_rel.length();
            if speed > f32::EPSILON {
                let n = w_rel / speed;
                let target = speed * (1.0 - self.damping);
                let lambda =
                    angular_axis(a, b, n, target, 0.0, f32::NEG_INFINITY, f32::INFINITY);
                tally.angular += n * lambda;
            }
        }

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposition_separates_twist_and_swing() {
        let rotation = Quat::from_rotation_y(0.3) * Quat::from_rotation_x(0.5);
        let st = SwingTwist::from_relative(rotation);
        assert!((st.twist - 0.5).abs() < 1e-5);
        assert!((st.swing1 - 0.3).abs() < 1e-5);
        assert!(st.swing2.abs() < 1e-5);
    }

    #[test]
    fn test_ellipse_factor_on_boundary() {
        let st = SwingTwist {
            swing1: 0.3,
            swing2: 0.0,
            twist: 0.0,
        };
        assert!((st.ellipse_factor(0.3, 0.6) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_typed_params_use_angular_slots() {
        let mut joint = ConeTwist::new(Transform::IDENTITY, Transform::IDENTITY);
        assert!(joint.set_typed_param(ConstraintParam::UpperLimit, Some(4), 0.7));
        assert_eq!(joint.swing_span1(), 0.7);
        assert_eq!(joint.typed_param(ConstraintParam::LowerLimit, Some(4)), Some(-0.7));
        assert!(!joint.set_typed_param(ConstraintParam::UpperLimit, Some(1), 0.7));
    }
}
