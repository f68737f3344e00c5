//! Impulse helpers shared by every joint type
//!
//! Joints never touch [`RigidBody`] directly. The world copies the two bodies
//! into [`SolverBody`] snapshots, the joint adjusts their velocities, and the
//! world writes the velocities back. A joint attached to the world frame gets a
//! static identity snapshot as its second body.
//!
//! Sign convention: relative velocity is always B minus A, and a positive
//! impulse `λ` is added to B and subtracted from A.

use glam::{Mat3, Vec3};

use crate::physics::body::RigidBody;
use crate::physics::types::Transform;

const MIN_EFFECTIVE_MASS: f32 = 1e-9;

/// Velocity-level view of one constrained body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverBody {
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inv_mass: f32,
    pub inv_inertia: f32,
}

impl SolverBody {
    pub fn from_body(body: &RigidBody) -> Self {
        Self {
            transform: body.transform,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
            inv_mass: body.inverse_mass(),
            inv_inertia: body.inverse_inertia(),
        }
    }

    /// Immovable stand-in for the world frame.
    pub fn world() -> Self {
        Self {
            transform: Transform::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        }
    }

    /// Copy the solved velocities back. Unsimulated bodies are left alone.
    pub fn write_back(&self, body: &mut RigidBody) {
        if body.is_simulated() {
            body.linear_velocity = self.linear_velocity;
            body.angular_velocity = self.angular_velocity;
        }
    }

    #[inline]
    pub fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(impulse) * self.inv_inertia;
    }

    #[inline]
    pub fn apply_angular_impulse(&mut self, impulse: Vec3) {
        self.angular_velocity += impulse * self.inv_inertia;
    }
}

/// Sum of impulses applied to body B during one solve.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ImpulseTally {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl ImpulseTally {
    pub fn magnitude(&self) -> f32 {
        self.linear.length() + self.angular.length()
    }
}

/// World-space pivots of both bodies and their lever arms.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Anchor {
    pub ra: Vec3,
    pub rb: Vec3,
}

impl Anchor {
    pub fn new(a: &SolverBody, b: &SolverBody, point_a: Vec3, point_b: Vec3) -> Self {
        Self {
            ra: point_a - a.transform.position,
            rb: point_b - b.transform.position,
        }
    }
}

fn linear_effective_mass(a: &SolverBody, b: &SolverBody, anchor: &Anchor, n: Vec3) -> f32 {
    a.inv_mass
        + b.inv_mass
        + a.inv_inertia * anchor.ra.cross(n).length_squared()
        + b.inv_inertia * anchor.rb.cross(n).length_squared()
}

fn relative_linear_velocity(a: &SolverBody, b: &SolverBody, anchor: &Anchor, n: Vec3) -> f32 {
    (b.velocity_at(anchor.rb) - a.velocity_at(anchor.ra)).dot(n)
}

fn relative_angular_velocity(a: &SolverBody, b: &SolverBody, n: Vec3) -> f32 {
    (b.angular_velocity - a.angular_velocity).dot(n)
}

fn push_linear(a: &mut SolverBody, b: &mut SolverBody, anchor: &Anchor, n: Vec3, lambda: f32) {
    b.apply_impulse(n * lambda, anchor.rb);
    a.apply_impulse(-n * lambda, anchor.ra);
}

fn push_angular(a: &mut SolverBody, b: &mut SolverBody, n: Vec3, lambda: f32) {
    b.apply_angular_impulse(n * lambda);
    a.apply_angular_impulse(-n * lambda);
}

/// Drive the relative point velocity along `n` towards `target`.
///
/// The impulse is `(target − v_rel) / (k + cfm)` clamped to `[lo, hi]`.
/// Returns the applied impulse.
#[allow(clippy::too_many_arguments)]
pub(crate) fn linear_axis(
    a: &mut SolverBody,
    b: &mut SolverBody,
    anchor: &Anchor,
    n: Vec3,
    target: f32,
    cfm: f32,
    lo: f32,
    hi: f32,
) -> f32 {
    let k = linear_effective_mass(a, b, anchor, n);
    if k < MIN_EFFECTIVE_MASS {
        return 0.0;
    }
    let v_rel = relative_linear_velocity(a, b, anchor, n);
    let lambda = ((target - v_rel) / (k + cfm)).clamp(lo, hi);
    push_linear(a, b, anchor, n, lambda);
    lambda
}

/// Drive the relative angular velocity about `n` towards `target`.
pub(crate) fn angular_axis(
    a: &mut SolverBody,
    b: &mut SolverBody,
    n: Vec3,
    target: f32,
    cfm: f32,
    lo: f32,
    hi: f32,
) -> f32 {
    let k = a.inv_inertia + b.inv_inertia;
    if k < MIN_EFFECTIVE_MASS {
        return 0.0;
    }
    let w_rel = relative_angular_velocity(a, b, n);
    let lambda = ((target - w_rel) / (k + cfm)).clamp(lo, hi);
    push_angular(a, b, n, lambda);
    lambda
}

/// Keep the relative point velocity along `n` inside `[v_min, v_max]`.
pub(crate) fn linear_limit(
    a: &mut SolverBody,
    b: &mut SolverBody,
    anchor: &Anchor,
    n: Vec3,
    (v_min, v_max): (f32, f32),
    cfm: f32,
) -> f32 {
    let k = linear_effective_mass(a, b, anchor, n);
    if k < MIN_EFFECTIVE_MASS {
        return 0.0;
    }
    let v_rel = relative_linear_velocity(a, b, anchor, n);
    let clamped = v_rel.clamp(v_min, v_max);
    if clamped == v_rel {
        return 0.0;
    }
    let lambda = (clamped - v_rel) / (k + cfm);
    push_linear(a, b, anchor, n, lambda);
    lambda
}

/// Keep the relative angular velocity about `n` inside `[v_min, v_max]`.
pub(crate) fn angular_limit(
    a: &mut SolverBody,
    b: &mut SolverBody,
    n: Vec3,
    (v_min, v_max): (f32, f32),
    cfm: f32,
) -> f32 {
    let k = a.inv_inertia + b.inv_inertia;
    if k < MIN_EFFECTIVE_MASS {
        return 0.0;
    }
    let w_rel = relative_angular_velocity(a, b, n);
    let clamped = w_rel.clamp(v_min, v_max);
    if clamped == w_rel {
        return 0.0;
    }
    let lambda = (clamped - w_rel) / (k + cfm);
    push_angular(a, b, n, lambda);
    lambda
}

/// Allowed relative velocity range for a coordinate at `position` with the
/// given limits.
///
/// Inside the range the bounds stop the coordinate exactly on a limit after
/// one step. Past a limit they pull it back at `stop_erp / dt`. `lower > upper`
/// leaves the coordinate free; `lower == upper` locks it.
pub(crate) fn limit_velocity_bounds(
    position: f32,
    lower: f32,
    upper: f32,
    stop_erp: f32,
    dt: f32,
) -> (f32, f32) {
    if lower > upper {
        return (f32::NEG_INFINITY, f32::INFINITY);
    }
    let v_max = if position <= upper {
        (upper - position) / dt
    } else {
        (upper - position) * stop_erp / dt
    };
    let v_min = if position >= lower {
        (lower - position) / dt
    } else {
        (lower - position) * stop_erp / dt
    };
    (v_min, v_max)
}

/// Effective mass matrix of a point constraint between two lever arms:
/// `(mA⁻¹ + mB⁻¹)·I − iA·[ra]ₓ² − iB·[rb]ₓ²`.
fn point_mass_matrix(a: &SolverBody, b: &SolverBody, anchor: &Anchor) -> Mat3 {
    // −[r]ₓ² = |r|²·I − r·rᵀ
    let lever = |r: Vec3, inv_inertia: f32| {
        (Mat3::from_diagonal(Vec3::splat(r.length_squared())) - outer(r, r)) * inv_inertia
    };
    Mat3::from_diagonal(Vec3::splat(a.inv_mass + b.inv_mass))
        + lever(anchor.ra, a.inv_inertia)
        + lever(anchor.rb, b.inv_inertia)
}

fn outer(u: Vec3, v: Vec3) -> Mat3 {
    Mat3::from_cols(u * v.x, u * v.y, u * v.z)
}

/// Pull two world-space pivots together with one coupled 3×3 impulse.
///
/// The three directions share both lever arms, so they are solved as one
/// system instead of axis by axis.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_point(
    a: &mut SolverBody,
    b: &mut SolverBody,
    pivot_a: Vec3,
    pivot_b: Vec3,
    erp: f32,
    cfm: f32,
    dt: f32,
    tally: &mut ImpulseTally,
) {
    let anchor = Anchor::new(a, b, pivot_a, pivot_b);
    let k = point_mass_matrix(a, b, &anchor) + Mat3::from_diagonal(Vec3::splat(cfm));
    let det = k.determinant();
    if !det.is_finite() || det.abs() < MIN_EFFECTIVE_MASS {
        return;
    }
    let bias = -(pivot_b - pivot_a) * erp / dt;
    let v_rel = b.velocity_at(anchor.rb) - a.velocity_at(anchor.ra);
    let impulse = k.inverse() * (bias - v_rel);
    b.apply_impulse(impulse, anchor.rb);
    a.apply_impulse(-impulse, anchor.ra);
    tally.linear += impulse;
}

/// Rotate B so its world axis `axis_b` lines up with `axis_a`, touching only
/// the two directions perpendicular to `axis_a`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn align_axes(
    a: &mut SolverBody,
    b: &mut SolverBody,
    axis_a: Vec3,
    axis_b: Vec3,
    erp: f32,
    cfm: f32,
    dt: f32,
    tally: &mut ImpulseTally,
) {
    let error = axis_b.cross(axis_a);
    let (p, q) = axis_a.any_orthonormal_pair();
    for n in [p, q] {
        let bias = error.dot(n) * erp / dt;
        let lambda = angular_axis(a, b, n, bias, cfm, f32::NEG_INFINITY, f32::INFINITY);
        tally.angular += n * lambda;
    }
}

/// Wrap an angle into `(-π, π]`.
pub(crate) fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI { a + TAU } else { a }
}
