//! Six-degree-of-freedom joint
//!
//! Each of the three linear and three angular axes of frame A has its own
//! limit pair and motor. Per axis, `lower == upper` locks the axis and
//! `lower > upper` frees it. Angular positions are XYZ Euler angles of B's
//! frame relative to A's.
//!
//! Locked axes are corrected with `Erp`/`Cfm`, limited axes with
//! `StopErp`/`StopCfm`. Both can be overridden per axis.

use glam::{EulerRot, Vec3};

use super::solver::{
    Anchor, ImpulseTally, SolverBody, angular_axis, angular_limit, linear_axis, linear_limit,
    limit_velocity_bounds,
};
use super::{ANGULAR_AXIS_OFFSET, AxisMotor, ConstraintParam, ParamTable};
use crate::physics::types::Transform;

const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

/// Configurable joint with independent limits per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generic6Dof {
    frame_a: Transform,
    frame_b: Transform,
    linear_lower: Vec3,
    linear_upper: Vec3,
    angular_lower: Vec3,
    angular_upper: Vec3,
    linear_motors: [AxisMotor; 3],
    angular_motors: [AxisMotor; 3],
}

impl Generic6Dof {
    /// Create a joint from the two local frames with every axis locked.
    pub fn new(frame_a: Transform, frame_b: Transform) -> Self {
        Self {
            frame_a,
            frame_b,
            linear_lower: Vec3::ZERO,
            linear_upper: Vec3::ZERO,
            angular_lower: Vec3::ZERO,
            angular_upper: Vec3::ZERO,
            linear_motors: [AxisMotor::default(); 3],
            angular_motors: [AxisMotor::default(); 3],
        }
    }

    pub fn set_linear_limits(&mut self, lower: Vec3, upper: Vec3) {
        self.linear_lower = lower;
        self.linear_upper = upper;
    }

    pub fn set_angular_limits(&mut self, lower: Vec3, upper: Vec3) {
        self.angular_lower = lower;
        self.angular_upper = upper;
    }

    pub fn linear_limits(&self) -> (Vec3, Vec3) {
        (self.linear_lower, self.linear_upper)
    }

    pub fn angular_limits(&self) -> (Vec3, Vec3) {
        (self.angular_lower, self.angular_upper)
    }

    /// Set the motor of one of the six axes (`0..3` linear, `3..6` angular).
    /// Out-of-range axes are ignored.
    pub fn set_motor(&mut self, axis: usize, motor: AxisMotor) {
        if let Some(slot) = self.motor_slot_mut(axis) {
            *slot = motor;
        }
    }

    pub fn motor(&self, axis: usize) -> Option<AxisMotor> {
        match axis {
            0..3 => Some(self.linear_motors[axis]),
            3..6 => Some(self.angular_motors[axis - ANGULAR_AXIS_OFFSET]),
            _ => None,
        }
    }

    fn motor_slot_mut(&mut self, axis: usize) -> Option<&mut AxisMotor> {
        match axis {
            0..3 => Some(&mut self.linear_motors[axis]),
            3..6 => Some(&mut self.angular_motors[axis - ANGULAR_AXIS_OFFSET]),
            _ => None,
        }
    }

    fn world_frames(&self, a: &Transform, b: &Transform) -> (Transform, Transform) {
        (a.compose(&self.frame_a), b.compose(&self.frame_b))
    }

    /// Offset of B's frame origin in A's frame axes.
    pub fn relative_linear(&self, a: &Transform, b: &Transform) -> Vec3 {
        let (fa, fb) = self.world_frames(a, b);
        fa.inverse_rotate(fb.position - fa.position)
    }

    /// XYZ Euler angles of B's frame relative to A's.
    pub fn relative_angles(&self, a: &Transform, b: &Transform) -> Vec3 {
        let (fa, fb) = self.world_frames(a, b);
        let (x, y, z) = (fa.rotation.inverse() * fb.rotation).to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub(crate) fn set_typed_param(
        &mut self,
        param: ConstraintParam,
        axis: Option<usize>,
        value: f32,
    ) -> bool {
        let Some(axis) = axis.filter(|i| *i < 6) else {
            return false;
        };
        let angular = axis >= ANGULAR_AXIS_OFFSET;
        let i = axis % ANGULAR_AXIS_OFFSET;
        match param {
            ConstraintParam::LowerLimit if angular => self.angular_lower[i] = value,
            ConstraintParam::LowerLimit => self.linear_lower[i] = value,
            ConstraintParam::UpperLimit if angular => self.angular_upper[i] = value,
            ConstraintParam::UpperLimit => self.linear_upper[i] = value,
            ConstraintParam::TargetVelocity | ConstraintParam::MaxMotorForce => {
                let Some(motor) = self.motor_slot_mut(axis) else {
                    return false;
                };
                if param == ConstraintParam::TargetVelocity {
                    motor.target_velocity = value;
                } else {
                    motor.max_force = value;
                }
            }
            _ => return false,
        }
        true
    }

    pub(crate) fn typed_param(&self, param: ConstraintParam, axis: Option<usize>) -> Option<f32> {
        let axis = axis.filter(|i| *i < 6)?;
        let (lower, upper, i) = if axis < ANGULAR_AXIS_OFFSET {
            (self.linear_lower, self.linear_upper, axis)
        } else {
            (self.angular_lower, self.angular_upper, axis - ANGULAR_AXIS_OFFSET)
        };
        match param {
            ConstraintParam::LowerLimit => Some(lower[i]),
            ConstraintParam::UpperLimit => Some(upper[i]),
            ConstraintParam::TargetVelocity => self.motor(axis).map(|m| m.target_velocity),
            ConstraintParam::MaxMotorForce => self.motor(axis).map(|m| m.max_force),
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
        let cfm = params.get(ConstraintParam::Cfm, None);
        let mut tally = ImpulseTally::default();

        let (fa, fb) = self.world_frames(&a.transform, &b.transform);
        let anchor = Anchor::new(a, b, fb.position, fb.position);
        let linear = fa.inverse_rotate(fb.position - fa.position);
        let (ax, ay, az) = (fa.rotation.inverse() * fb.rotation).to_euler(EulerRot::XYZ);
        let angles = Vec3::new(ax, ay, az);

        // Motors
        for (i, local) in AXES.into_iter().enumerate() {
            let n = fa.rotate(local);
            let motor = self.linear_motors[i];
            if motor.enabled {
                let bound = motor.impulse_bound(dt);
                let lambda =
                    linear_axis(a, b, &anchor, n, motor.target_velocity, cfm, -bound, bound);
                tally.linear += n * lambda;
            }
            let motor = self.angular_motors[i];
            if motor.enabled {
                let bound = motor.impulse_bound(dt);
                let lambda = angular_axis(a, b, n, motor.target_velocity, cfm, -bound, bound);
                tally.angular += n * lambda;
            }
        }

        // Limits
        for (i, local) in AXES.into_iter().enumerate() {
            let n = fa.rotate(local);

            let (lower, upper) = (self.linear_lower[i], self.linear_upper[i]);
            let (erp, row_cfm) = row_params(params, lower == upper, Some(i));
            let bounds = limit_velocity_bounds(linear[i], lower, upper, erp, dt);
            tally.linear += n * linear_limit(a, b, &anchor, n, bounds, row_cfm);

            let (lower, upper) = (self.angular_lower[i], self.angular_upper[i]);
            let (erp, row_cfm) = row_params(params, lower == upper, Some(i + ANGULAR_AXIS_OFFSET));
            let bounds = limit_velocity_bounds(angles[i], lower, upper, erp, dt);
            tally.angular += n * angular_limit(a, b, n, bounds, row_cfm);
        }

        tally
    }
}

/// Error reduction and softness for one axis row.
fn row_params(params: &ParamTable, locked: bool, slot: Option<usize>) -> (f32, f32) {
    if locked {
        (params.get(ConstraintParam::Erp, slot), params.get(ConstraintParam::Cfm, slot))
    } else {
        (params.get(ConstraintParam::StopErp, slot), params.get(ConstraintParam::StopCfm, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_relative_coordinates() {
        let joint = Generic6Dof::new(Transform::IDENTITY, Transform::IDENTITY);
        let a = Transform::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let b = Transform::new(Vec3::new(0.0, 0.0, -2.0), a.rotation * Quat::from_rotation_z(0.2));
        // A's X axis points along world -Z
        assert!((joint.relative_linear(&a, &b) - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!((joint.relative_angles(&a, &b) - Vec3::new(0.0, 0.0, 0.2)).length() < 1e-5);
    }

    #[test]
    fn test_free_axis_lets_body_move() {
        let mut joint = Generic6Dof::new(Transform::IDENTITY, Transform::IDENTITY);
        joint.set_linear_limits(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let mut a = SolverBody::world();
        let mut b = SolverBody {
            transform: Transform::IDENTITY,
            linear_velocity: Vec3::new(3.0, 2.0, 0.0),
            angular_velocity: Vec3::ZERO,
            inv_mass: 1.0,
            inv_inertia: 1.0,
        };
        joint.solve(&ParamTable::default(), &mut a, &mut b, 0.1);
        assert!((b.linear_velocity.x - 3.0).abs() < 1e-5);
        assert!(b.linear_velocity.y.abs() < 1e-5);
    }

    #[test]
    fn test_axis_params_route_to_slots() {
        let mut joint = Generic6Dof::new(Transform::IDENTITY, Transform::IDENTITY);
        assert!(joint.set_typed_param(ConstraintParam::UpperLimit, Some(4), 0.5));
        assert_eq!(joint.angular_limits().1.y, 0.5);
        assert!(joint.set_typed_param(ConstraintParam::TargetVelocity, Some(1), 2.0));
        assert_eq!(joint.motor(1).map(|m| m.target_velocity), Some(2.0));
        assert!(!joint.set_typed_param(ConstraintParam::UpperLimit, None, 1.0));
    }
}
