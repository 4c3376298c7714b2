//! Fixed joint, without any degree of freedom.

use crate::joint::{JointError, JointModel, JointType};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::Vector3;
use rand::rngs::ThreadRng;

/// Model of a fixed joint.
///
/// A fixed joint welds its successor to its predecessor; it transmits every
/// wrench and allows no motion. Chains of fixed joints can be merged away
/// with `Mechanism::remove_fixed_joints` without changing the dynamics.
#[derive(Clone, Debug, Default)]
pub struct JointModelFixed {}

impl JointModel for JointModelFixed {
    fn joint_type(&self) -> JointType {
        JointType::Fixed
    }

    fn nq(&self) -> usize {
        0
    }

    fn nv(&self) -> usize {
        0
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert!(q.is_empty());
        Transform::identity(frame_after, frame_before)
    }

    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        _v: &[f64],
    ) -> Twist {
        Twist::zero(frame_after, frame_before, frame_after)
    }

    fn bias_acceleration(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        _v: &[f64],
    ) -> SpatialAcceleration {
        SpatialAcceleration::zero(frame_after, frame_before, frame_after)
    }

    fn motion_subspace(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        out: &mut GeometricJacobian,
    ) {
        debug_assert_eq!(out.ncols(), 0);
        out.body = frame_after;
        out.base = frame_before;
        out.frame = frame_after;
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, _q: &[f64], out: &mut WrenchMatrix) {
        debug_assert_eq!(out.ncols(), 6);
        out.frame = frame_after;
        out.set_column(0, &Vector3::x(), &Vector3::zeros());
        out.set_column(1, &Vector3::y(), &Vector3::zeros());
        out.set_column(2, &Vector3::z(), &Vector3::zeros());
        out.set_column(3, &Vector3::zeros(), &Vector3::x());
        out.set_column(4, &Vector3::zeros(), &Vector3::y());
        out.set_column(5, &Vector3::zeros(), &Vector3::z());
    }

    fn zero_configuration(&self, _q: &mut [f64]) {}

    fn rand_configuration(&self, _q: &mut [f64], _rng: &mut ThreadRng) {}

    fn normalize_configuration(&self, _q: &mut [f64]) -> Result<(), JointError> {
        Ok(())
    }

    fn velocity_to_configuration_derivative(&self, _q: &[f64], _v: &[f64], _q_dot: &mut [f64]) {}

    fn configuration_derivative_to_velocity(&self, _q: &[f64], _q_dot: &[f64], _v: &mut [f64]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_joint_has_no_freedom() {
        let joint = JointModelFixed::default();
        assert_eq!(joint.nq(), 0);
        assert_eq!(joint.nv(), 0);
        assert_eq!(joint.nc(), 6);
        let after = FrameId::fresh();
        let before = FrameId::fresh();
        let t = joint.joint_transform(after, before, &[]);
        assert_eq!(t.translation, Vector3::zeros());
        assert_eq!(t.rotation.angle(), 0.0);
    }
}
