//! Prismatic joint, constraining two bodies to translate along a given axis.

use crate::joint::{JointError, JointModel, JointType, orthonormal_complement};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Unit, Vector3};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Model of a prismatic joint.
///
/// This joint constrains two bodies to translate along a given axis.
#[derive(Clone, Debug)]
pub struct JointModelPrismatic {
    /// The axis of translation expressed in the local frame of the joint.
    pub axis: Unit<Vector3<f64>>,
}

impl JointModelPrismatic {
    /// Creates a new `JointModelPrismatic` with the given axis of
    /// translation.
    ///
    /// The axis does not need to be normalized.
    #[must_use]
    pub fn new(axis: Vector3<f64>) -> Self {
        JointModelPrismatic {
            axis: Unit::new_normalize(axis),
        }
    }

    /// Creates a new prismatic joint model with `x` as axis of translation.
    #[must_use]
    pub fn new_px() -> Self {
        Self::new(Vector3::x())
    }

    /// Creates a new prismatic joint model with `y` as axis of translation.
    #[must_use]
    pub fn new_py() -> Self {
        Self::new(Vector3::y())
    }

    /// Creates a new prismatic joint model with `z` as axis of translation.
    #[must_use]
    pub fn new_pz() -> Self {
        Self::new(Vector3::z())
    }
}

impl JointModel for JointModelPrismatic {
    fn joint_type(&self) -> JointType {
        JointType::Prismatic
    }

    fn nq(&self) -> usize {
        1
    }

    fn nv(&self) -> usize {
        1
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert_eq!(q.len(), 1);
        Transform::translation(frame_after, frame_before, self.axis.into_inner() * q[0])
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
            Vector3::zeros(),
            self.axis.into_inner() * v[0],
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
        out.set_column(0, &Vector3::zeros(), &self.axis);
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, _q: &[f64], out: &mut WrenchMatrix) {
        debug_assert_eq!(out.ncols(), 5);
        out.frame = frame_after;
        let (b1, b2) = orthonormal_complement(&self.axis);
        out.set_column(0, &Vector3::x(), &Vector3::zeros());
        out.set_column(1, &Vector3::y(), &Vector3::zeros());
        out.set_column(2, &Vector3::z(), &Vector3::zeros());
        out.set_column(3, &Vector3::zeros(), &b1);
        out.set_column(4, &Vector3::zeros(), &b2);
    }

    fn zero_configuration(&self, q: &mut [f64]) {
        q[0] = 0.0;
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        q[0] = rng.random_range(-1.0..1.0);
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
