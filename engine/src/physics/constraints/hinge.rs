//! Hinge joint
//!
//! One rotational degree of freedom about an axis fixed in both bodies. The
//! hinge angle is measured between two reference vectors perpendicular to the
//! axis, one per body, and is zero when both bodies keep the orientation they
//! had when the reference vectors were derived (identity for a fresh joint).

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use super::solver::{
    ImpulseTally, SolverBody, align_axes, angular_axis, angular_limit, limit_velocity_bounds,
    solve_point,
};
use super::{AxisMotor, ConstraintParam, ParamTable};
use crate::physics::types::Transform;

/// Revolute joint with optional angle limits and a velocity motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hinge {
    pivot_a: Vec3,
    pivot_b: Vec3,
    axis_a: Vec3,
    axis_b: Vec3,
    reference_a: Vec3,
    reference_b: Vec3,
    lower_limit: f32,
    upper_limit: f32,
    motor: AxisMotor,
}

impl Hinge {
    /// Create a hinge from local pivots and local axes.
    ///
    /// Axes are normalized; limits start at `[-π, π]` (free) and the motor is off.
    pub fn new(pivot_a: Vec3, pivot_b: Vec3, axis_a: Vec3, axis_b: Vec3) -> Self {
        let axis_a = axis_a.normalize_or(Vec3::X);
        let axis_b = axis_b.normalize_or(Vec3::X);
        let reference_a = axis_a.any_orthonormal_vector();
        let reference_b = Quat::from_rotation_arc(axis_a, axis_b) * reference_a;
        Self {
            pivot_a,
            pivot_b,
            axis_a,
            axis_b,
            reference_a,
            reference_b,
            lower_limit: -PI,
            upper_limit: PI,
            motor: AxisMotor::default(),
        }
    }

    pub fn lower_limit(&self) -> f32 {
        self.lower_limit
    }

    pub fn upper_limit(&self) -> f32 {
        self.upper_limit
    }

    /// Restrict the hinge angle to `[lower, upper]` radians.
    pub fn set_limit(&mut self, lower: f32, upper: f32) {
        self.lower_limit = lower;
        self.upper_limit = upper;
    }

    /// Drive the hinge at `target_velocity` rad/s with at most `max_motor_force` N·m.
    pub fn enable_angular_motor(&mut self, target_velocity: f32, max_motor_force: f32) {
        self.motor = AxisMotor::new(target_velocity, max_motor_force);
    }

    pub fn disable_motor(&mut self) {
        self.motor.enabled = false;
    }

    pub fn motor(&self) -> AxisMotor {
        self.motor
    }

    /// Angle of B relative to A about A's hinge axis, in `(-π, π]`.
    pub fn hinge_angle(&self, a: &Transform, b: &Transform) -> f32 {
        let axis = a.rotate(self.axis_a);
        let ref_a = a.rotate(self.reference_a);
        let ref_b = b.rotate(self.reference_b);
        ref_a.cross(ref_b).dot(axis).atan2(ref_a.dot(ref_b))
    }

    pub(crate) fn set_typed_param(&mut self, param: ConstraintParam, value: f32) -> bool {
        match param {
            ConstraintParam::LowerLimit => self.lower_limit = value,
            ConstraintParam::UpperLimit => self.upper_limit = value,
            ConstraintParam::TargetVelocity => self.motor.target_velocity = value,
            ConstraintParam::MaxMotorForce => self.motor.max_force = value,
            _ => return false,
        }
        true
    }

    pub(crate) fn typed_param(&self, param: ConstraintParam) -> Option<f32> {
        match param {
            ConstraintParam::LowerLimit => Some(self.lower_limit),
            ConstraintParam::UpperLimit => Some(self.upper_limit),
            ConstraintParam::TargetVelocity => Some(self.motor.target_velocity),
            ConstraintParam::MaxMotorForce => Some(self.motor.max_force),
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
        let mut tally = ImpulseTally::default();

        // Pivots
        let pivot_a = a.transform.transform_point(self.pivot_a);
        let pivot_b = b.transform.transform_point(self.pivot_b);
        solve_point(a, b, pivot_a, pivot_b, erp, cfm, dt, &mut tally);

        // Axis alignment
        let axis = a.transform.rotate(self.axis_a);
        let axis_b = b.transform.rotate(self.axis_b);
        align_axes(a, b, axis, axis_b, erp, cfm, dt, &mut tally);

        // Motor
        if self.motor.enabled {
            let bound = self.motor.impulse_bound(dt);
            let lambda = angular_axis(a, b, axis, self.motor.target_velocity, cfm, -bound, bound);
            tally.angular += axis * lambda;
        }

        // Limits
        let angle = self.hinge_angle(&a.transform, &b.transform);
        let bounds = limit_velocity_bounds(
            angle,
            self.lower_limit,
            self.upper_limit,
            params.get(ConstraintParam::StopErp, None),
            dt,
        );
        let lambda = angular_limit(a, b, axis, bounds, params.get(ConstraintParam::StopCfm, None));
        tally.angular += axis * lambda;

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_hinge_angle_follows_relative_rotation() {
        let hinge = Hinge::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, Vec3::Y);
        let a = Transform::IDENTITY;
        let b = Transform::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_4));
        assert!((hinge.hinge_angle(&a, &b) - FRAC_PI_4).abs() < 1e-5);
        let b = Transform::new(Vec3::ZERO, Quat::from_rotation_y(-FRAC_PI_4));
        assert!((hinge.hinge_angle(&a, &b) + FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_angle_ignores_shared_rotation() {
        let hinge = Hinge::new(Vec3::ZERO, Vec3::ZERO, Vec3::Z, Vec3::Z);
        let shared = Quat::from_rotation_x(1.0);
        let a = Transform::new(Vec3::ZERO, shared);
        let b = Transform::new(Vec3::ZERO, shared * Quat::from_rotation_z(0.3));
        assert!((hinge.hinge_angle(&a, &b) - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_upper_limit_stops_motor() {
        let mut hinge = Hinge::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, Vec3::Y);
        hinge.set_limit(0.0, 0.1);
        hinge.enable_angular_motor(10.0, 1000.0);
        let mut a = SolverBody::world();
        let mut b = SolverBody {
            transform: Transform::new(Vec3::ZERO, Quat::from_rotation_y(0.05)),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inv_mass: 1.0,
            inv_inertia: 1.0,
        };
        let dt = 0.01;
        hinge.solve(&ParamTable::default(), &mut a, &mut b, dt);
        // May close the remaining 0.05 rad in one step, no faster
        assert!((b.angular_velocity.y - 5.0).abs() < 1e-3);
    }
}
