//! Slider joint
//!
//! B's frame may translate along, and rotate about, the X axis of A's frame.
//! Both motions have their own limits and motor. Translation perpendicular to
//! the axis and tilt of the axis are removed.

use glam::Vec3;

use super::solver::{
    Anchor, ImpulseTally, SolverBody, align_axes, angular_axis, angular_limit, linear_axis,
    linear_limit, limit_velocity_bounds,
};
use super::{ANGULAR_AXIS_OFFSET, AxisMotor, ConstraintParam, ParamTable};
use crate::physics::types::Transform;

/// Prismatic joint along frame A's X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    frame_a: Transform,
    frame_b: Transform,
    lower_linear_limit: f32,
    upper_linear_limit: f32,
    lower_angular_limit: f32,
    upper_angular_limit: f32,
    linear_motor: AxisMotor,
    angular_motor: AxisMotor,
}

impl Slider {
    /// Create a slider from the two local frames.
    ///
    /// Translation starts free (`lower > upper`), rotation about the axis locked.
    pub fn new(frame_a: Transform, frame_b: Transform) -> Self {
        Self {
            frame_a,
            frame_b,
            lower_linear_limit: 1.0,
            upper_linear_limit: -1.0,
            lower_angular_limit: 0.0,
            upper_angular_limit: 0.0,
            linear_motor: AxisMotor::default(),
            angular_motor: AxisMotor::default(),
        }
    }

    pub fn frame_a(&self) -> Transform {
        self.frame_a
    }

    pub fn frame_b(&self) -> Transform {
        self.frame_b
    }

    /// Limit translation along the axis to `[lower, upper]` meters.
    pub fn set_linear_limit(&mut self, lower: f32, upper: f32) {
        self.lower_linear_limit = lower;
        self.upper_linear_limit = upper;
    }

    /// Limit rotation about the axis to `[lower, upper]` radians.
    pub fn set_angular_limit(&mut self, lower: f32, upper: f32) {
        self.lower_angular_limit = lower;
        self.upper_angular_limit = upper;
    }

    pub fn linear_limit(&self) -> (f32, f32) {
        (self.lower_linear_limit, self.upper_linear_limit)
    }

    pub fn angular_limit(&self) -> (f32, f32) {
        (self.lower_angular_limit, self.upper_angular_limit)
    }

    pub fn set_linear_motor(&mut self, motor: AxisMotor) {
        self.linear_motor = motor;
    }

    pub fn set_angular_motor(&mut self, motor: AxisMotor) {
        self.angular_motor = motor;
    }

    fn world_frames(&self, a: &Transform, b: &Transform) -> (Transform, Transform) {
        (a.compose(&self.frame_a), b.compose(&self.frame_b))
    }

    /// Offset of B's frame origin from A's along the slider axis.
    pub fn linear_position(&self, a: &Transform, b: &Transform) -> f32 {
        let (fa, fb) = self.world_frames(a, b);
        (fb.position - fa.position).dot(fa.rotate(Vec3::X))
    }

    /// Rotation of B's frame about the slider axis, in `(-π, π]`.
    pub fn angular_position(&self, a: &Transform, b: &Transform) -> f32 {
        let (fa, fb) = self.world_frames(a, b);
        let axis = fa.rotate(Vec3::X);
        let ya = fa.rotate(Vec3::Y);
        let yb = fb.rotate(Vec3::Y);
        ya.cross(yb).dot(axis).atan2(ya.dot(yb))
    }

    fn is_angular(axis: Option<usize>) -> bool {
        axis.is_some_and(|i| i >= ANGULAR_AXIS_OFFSET)
    }

    pub(crate) fn set_typed_param(
        &mut self,
        param: ConstraintParam,
        axis: Option<usize>,
        value: f32,
    ) -> bool {
        let angular = Self::is_angular(axis);
        match (param, angular) {
            (ConstraintParam::LowerLimit, false) => self.lower_linear_limit = value,
            (ConstraintParam::UpperLimit, false) => self.upper_linear_limit = value,
            (ConstraintParam::LowerLimit, true) => self.lower_angular_limit = value,
            (ConstraintParam::UpperLimit, true) => self.upper_angular_limit = value,
            (ConstraintParam::TargetVelocity, false) => self.linear_motor.target_velocity = value,
            (ConstraintParam::TargetVelocity, true) => self.angular_motor.target_velocity = value,
            (ConstraintParam::MaxMotorForce, false) => self.linear_motor.max_force = value,
            (ConstraintParam::MaxMotorForce, true) => self.angular_motor.max_force = value,
            _ => return false,
        }
        true
    }

    pub(crate) fn typed_param(&self, param: ConstraintParam, axis: Option<usize>) -> Option<f32> {
        let angular = Self::is_angular(axis);
        let value = match (param, angular) {
            (ConstraintParam::LowerLimit, false) => self.lower_linear_limit,
            (ConstraintParam::UpperLimit, false) => self.upper_linear_limit,
            (ConstraintParam::LowerLimit, true) => self.lower_angular_limit,
            (ConstraintParam::UpperLimit, true) => self.upper_angular_limit,
            (ConstraintParam::TargetVelocity, false) => self.linear_motor.target_velocity,
            (ConstraintParam::TargetVelocity, true) => self.angular_motor.target_velocity,
            (ConstraintParam::MaxMotorForce, false) => self.linear_motor.max_force,
            (ConstraintParam::MaxMotorForce, true) => self.angular_motor.max_force,
            _ => return None,
        };
        Some(value)
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
        let axis = fa.rotate(Vec3::X);
        let anchor = Anchor::new(a, b, fb.position, fb.position);
        let offset = fb.position - fa.position;

        // Off-axis translation
        let (p, q) = axis.any_orthonormal_pair();
        for n in [p, q] {
            let bias = -offset.dot(n) * erp / dt;
            let lambda = linear_axis(a, b, &anchor, n, bias, cfm, f32::NEG_INFINITY, f32::INFINITY);
            tally.linear += n * lambda;
        }

        // Axis tilt
        align_axes(a, b, axis, fb.rotate(Vec3::X), erp, cfm, dt, &mut tally);

        // Motors
        if self.linear_motor.enabled {
            let bound = self.linear_motor.impulse_bound(dt);
            let target = self.linear_motor.target_velocity;
            let lambda = linear_axis(a, b, &anchor, axis, target, cfm, -bound, bound);
            tally.linear += axis * lambda;
        }
        if self.angular_motor.enabled {
            let bound = self.angular_motor.impulse_bound(dt);
            let target = self.angular_motor.target_velocity;
            let lambda = angular_axis(a, b, axis, target, cfm, -bound, bound);
            tally.angular += axis * lambda;
        }

        // Limits
        let linear_bounds = limit_velocity_bounds(
            offset.dot(axis),
            self.lower_linear_limit,
            self.upper_linear_limit,
            stop_erp,
            dt,
        );
        let lambda = linear_limit(a, b, &anchor, axis, linear_bounds, stop_cfm);
        tally.linear += axis * lambda;

        let ya = fa.rotate(Vec3::Y);
        let yb = fb.rotate(Vec3::Y);
        let angle = ya.cross(yb).dot(axis).atan2(ya.dot(yb));
        let angular_bounds = limit_velocity_bounds(
            angle,
            self.lower_angular_limit,
            self.upper_angular_limit,
            stop_erp,
            dt,
        );
        let lambda = angular_limit(a, b, axis, angular_bounds, stop_cfm);
        tally.angular += axis * lambda;

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_positions_measured_in_frame_a() {
        // Axis of A's frame points along world Z
        let turn = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let frame_a = Transform::new(Vec3::ZERO, turn);
        let slider = Slider::new(frame_a, Transform::new(Vec3::ZERO, frame_a.rotation));
        let a = Transform::IDENTITY;
        let b = Transform::new(Vec3::new(0.0, 0.0, 2.5), Quat::from_rotation_z(0.4));
        assert!((slider.linear_position(&a, &b) - 2.5).abs() < 1e-5);
        assert!((slider.angular_position(&a, &b) - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_linear_limit_blocks_travel() {
        let mut slider = Slider::new(Transform::IDENTITY, Transform::IDENTITY);
        slider.set_linear_limit(-1.0, 1.0);
        let mut a = SolverBody::world();
        let mut b = SolverBody {
            transform: Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
            linear_velocity: Vec3::new(4.0, 0.0, 0.0),
            angular_velocity: Vec3::ZERO,
            inv_mass: 1.0,
            inv_inertia: 1.0,
        };
        slider.solve(&ParamTable::default(), &mut a, &mut b, 0.1);
        assert!(b.linear_velocity.x.abs() < 1e-5);
    }
}
