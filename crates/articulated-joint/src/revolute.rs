//! Revolute joint, constraining two bodies to rotate around a given axis.

use crate::joint::{JointError, JointModel, JointType, orthonormal_complement};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Rotation3, Unit, Vector3};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Model of a revolute joint.
///
/// This joint constrains two bodies to rotate around a given axis, fixed in
/// both the before- and after-frames of the joint.
#[derive(Clone, Debug)]
pub struct JointModelRevolute {
    /// The axis of rotation expressed in the local frame of the joint.
    pub axis: Unit<Vector3<f64>>,
}

impl JointModelRevolute {
    /// Creates a new `JointModelRevolute` with the given axis of rotation.
    ///
    /// The axis does not need to be normalized.
    #[must_use]
    pub fn new(axis: Vector3<f64>) -> Self {
        JointModelRevolute {
            axis: Unit::new_normalize(axis),
        }
    }

    /// Creates a new revolute joint model with `x` as axis of rotation.
    #[must_use]
    pub fn new_rx() -> Self {
        Self::new(Vector3::x())
    }

    /// Creates a new revolute joint model with `y` as axis of rotation.
    #[must_use]
    pub fn new_ry() -> Self {
        Self::new(Vector3::y())
    }

    /// Creates a new revolute joint model with `z` as axis of rotation.
    #[must_use]
    pub fn new_rz() -> Self {
        Self::new(Vector3::z())
    }
}

impl JointModel for JointModelRevolute {
    fn joint_type(&self) -> JointType {
        JointType::Revolute
    }

    fn nq(&self) -> usize {
        1
    }

    fn nv(&self) -> usize {
        1
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert_eq!(q.len(), 1);
        Transform::rotation(
            frame_after,
            frame_before,
            Rotation3::from_axis_angle(&self.axis, q[0]),
        )
    }

    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        v: &[f64],
    ) -> Twist {
        debug_assert_eq!(v.len(), 1);
        Twist::new(
            frame_after,
            frame_before,
            frame_after,
            self.axis.into_inner() * v[0],
            Vector3::zeros(),
        )
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
        debug_assert_eq!(out.ncols(), 1);
        out.body = frame_after;
        out.base = frame_before;
        out.frame = frame_after;
        out.set_column(0, &self.axis, &Vector3::zeros());
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, _q: &[f64], out: &mut WrenchMatrix) {
        debug_assert_eq!(out.ncols(), 5);
        out.frame = frame_after;
        let (b1, b2) = orthonormal_complement(&self.axis);
        out.set_column(0, &b1, &Vector3::zeros());
        out.set_column(1, &b2, &Vector3::zeros());
        out.set_column(2, &Vector3::zeros(), &Vector3::x());
        out.set_column(3, &Vector3::zeros(), &Vector3::y());
        out.set_column(4, &Vector3::zeros(), &Vector3::z());
    }

    fn zero_configuration(&self, q: &mut [f64]) {
        q[0] = 0.0;
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        q[0] = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);
    }

    fn normalize_configuration(&self, _q: &mut [f64]) -> Result<(), JointError> {
        Ok(())
    }

    fn velocity_to_configuration_derivative(&self, _q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        q_dot[0] = v[0];
    }

    fn configuration_derivative_to_velocity(&self, _q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        v[0] = q_dot[0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transform_rotates_about_the_axis() {
        let joint = JointModelRevolute::new_rz();
        let after = FrameId::fresh();
        let before = FrameId::fresh();
        let t = joint.joint_transform(after, before, &[std::f64::consts::FRAC_PI_2]);
        assert_eq!(t.from, after);
        assert_eq!(t.to, before);
        assert_relative_eq!(t.rotation.angle(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(t.translation, Vector3::zeros());
    }

    #[test]
    fn twist_spans_the_motion_subspace() {
        let joint = JointModelRevolute::new(Vector3::new(1.0, 1.0, 0.0));
        let after = FrameId::fresh();
        let before = FrameId::fresh();
        let mut subspace = GeometricJacobian::zeros(after, before, after, 1);
        joint.motion_subspace(after, before, &[0.3], &mut subspace);
        let from_subspace = subspace.twist(&[2.0]);
        let direct = joint.joint_twist(after, before, &[0.3], &[2.0]);
        assert_relative_eq!(from_subspace.angular, direct.angular);
        assert_relative_eq!(from_subspace.linear, direct.linear);
    }

    #[test]
    fn constraint_columns_are_orthogonal_to_motion() {
        let joint = JointModelRevolute::new(Vector3::new(0.2, -0.5, 0.8));
        let after = FrameId::fresh();
        let before = FrameId::fresh();
        let mut constraint = WrenchMatrix::zeros(after, 5);
        joint.constraint_wrench_subspace(after, &[0.0], &mut constraint);
        let twist = joint.joint_twist(after, before, &[0.0], &[1.0]);
        for col in 0..5 {
            let power = constraint.angular_column(col).dot(&twist.angular)
                + constraint.linear_column(col).dot(&twist.linear);
            assert_relative_eq!(power, 0.0, epsilon = 1e-12);
        }
    }
}
