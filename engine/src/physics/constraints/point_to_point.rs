//! Ball-and-socket joint

use glam::Vec3;

use super::solver::{ImpulseTally, SolverBody, solve_point};
use super::{ConstraintParam, ParamTable};

/// Keeps a pivot on body A coincident with a pivot on body B.
///
/// Pivots are in each body's local frame; with no body B, `pivot_b` is a world
/// position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointToPoint {
    pivot_a: Vec3,
    pivot_b: Vec3,
}

impl PointToPoint {
    pub fn new(pivot_a: Vec3, pivot_b: Vec3) -> Self {
        Self { pivot_a, pivot_b }
    }

    pub fn pivot_a(&self) -> Vec3 {
        self.pivot_a
    }

    pub fn pivot_b(&self) -> Vec3 {
        self.pivot_b
    }

    pub fn set_pivot_a(&mut self, pivot: Vec3) {
        self.pivot_a = pivot;
    }

    pub fn set_pivot_b(&mut self, pivot: Vec3) {
        self.pivot_b = pivot;
    }

    pub(crate) fn solve(
        &mut self,
        params: &ParamTable,
        a: &mut SolverBody,
        b: &mut SolverBody,
        dt: f32,
    ) -> ImpulseTally {
        let mut tally = ImpulseTally::default();
        let pivot_a = a.transform.transform_point(self.pivot_a);
        let pivot_b = b.transform.transform_point(self.pivot_b);
        solve_point(
            a,
            b,
            pivot_a,
            pivot_b,
            params.get(ConstraintParam::Erp, None),
            params.get(ConstraintParam::Cfm, None),
            dt,
            &mut tally,
        );
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::types::Transform;

    #[test]
    fn test_pulls_pivot_toward_world_anchor() {
        let mut joint = PointToPoint::new(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
        let mut a = SolverBody {
            transform: Transform::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inv_mass: 1.0,
            inv_inertia: 1.0,
        };
        let mut world = SolverBody::world();
        // A sits 2 m below the world anchor
        let tally = joint.solve(&ParamTable::default(), &mut a, &mut world, 0.1);
        assert!(a.linear_velocity.y > 0.0);
        assert!(tally.magnitude() > 0.0);
    }
}
