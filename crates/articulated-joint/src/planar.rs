//! Planar joint: two translations in a plane plus a rotation about its
//! normal.

use crate::joint::{JointError, JointModel, JointType};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Rotation3, Unit, Vector3};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Model of a planar joint.
///
/// The configuration is `(x, y, θ)`: translation coordinates along the two
/// plane axes, expressed in `frame_before`, followed by the rotation angle
/// about the plane normal. The velocity is the joint twist decomposed on the
/// same axes but expressed in `frame_after`, which keeps the motion subspace
/// constant; the rotation between the two conventions lives in the
/// configuration-derivative maps.
#[derive(Clone, Debug)]
pub struct JointModelPlanar {
    /// First in-plane axis.
    pub x_axis: Unit<Vector3<f64>>,
    /// Second in-plane axis, orthogonal to the first.
    pub y_axis: Unit<Vector3<f64>>,
    /// Plane normal, `x_axis × y_axis`.
    pub rot_axis: Unit<Vector3<f64>>,
}

impl JointModelPlanar {
    /// Creates a new `JointModelPlanar` spanning the plane of the two given
    /// axes.
    ///
    /// The second axis is re-orthogonalized against the first.
    #[must_use]
    pub fn new(x_axis: Vector3<f64>, y_axis: Vector3<f64>) -> Self {
        let x_axis = Unit::new_normalize(x_axis);
        let y_axis = Unit::new_normalize(y_axis - y_axis.dot(&x_axis) * x_axis.into_inner());
        let rot_axis = Unit::new_normalize(x_axis.cross(&y_axis));
        JointModelPlanar {
            x_axis,
            y_axis,
            rot_axis,
        }
    }

    /// Creates a planar joint in the x-y plane, rotating about z.
    #[must_use]
    pub fn new_xy() -> Self {
        Self::new(Vector3::x(), Vector3::y())
    }
}

impl JointModel for JointModelPlanar {
    fn joint_type(&self) -> JointType {
        JointType::Planar
    }

    fn nq(&self) -> usize {
        3
    }

    fn nv(&self) -> usize {
        3
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert_eq!(q.len(), 3);
        Transform::new(
            frame_after,
            frame_before,
            Rotation3::from_axis_angle(&self.rot_axis, q[2]),
            self.x_axis.into_inner() * q[0] + self.y_axis.into_inner() * q[1],
        )
    }

    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        v: &[f64],
    ) -> Twist {
        debug_assert_eq!(v.len(), 3);
        Twist::new(
            frame_after,
            frame_before,
            frame_after,
            self.rot_axis.into_inner() * v[2],
            self.x_axis.into_inner() * v[0] + self.y_axis.into_inner() * v[1],
        )
    }

    fn bias_acceleration(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        _v: &[f64],
    ) -> SpatialAcceleration {
        // The motion subspace is constant in frame_after.
        SpatialAcceleration::zero(frame_after, frame_before, frame_after)
    }

    fn motion_subspace(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        out: &mut GeometricJacobian,
    ) {
        debug_assert_eq!(out.ncols(), 3);
        out.body = frame_after;
        out.base = frame_before;
        out.frame = frame_after;
        out.set_column(0, &Vector3::zeros(), &self.x_axis);
        out.set_column(1, &Vector3::zeros(), &self.y_axis);
        out.set_column(2, &self.rot_axis, &Vector3::zeros());
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, _q: &[f64], out: &mut WrenchMatrix) {
        debug_assert_eq!(out.ncols(), 3);
        out.frame = frame_after;
        out.set_column(0, &self.x_axis, &Vector3::zeros());
        out.set_column(1, &self.y_axis, &Vector3::zeros());
        out.set_column(2, &Vector3::zeros(), &self.rot_axis);
    }

    fn zero_configuration(&self, q: &mut [f64]) {
        q.fill(0.0);
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        q[0] = rng.random_range(-1.0..1.0);
        q[1] = rng.random_range(-1.0..1.0);
        q[2] = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);
    }

    fn normalize_configuration(&self, _q: &mut [f64]) -> Result<(), JointError> {
        Ok(())
    }

    fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        let (sin, cos) = q[2].sin_cos();
        q_dot[0] = cos * v[0] - sin * v[1];
        q_dot[1] = sin * v[0] + cos * v[1];
        q_dot[2] = v[2];
    }

    fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        let (sin, cos) = q[2].sin_cos();
        v[0] = cos * q_dot[0] + sin * q_dot[1];
        v[1] = -sin * q_dot[0] + cos * q_dot[1];
        v[2] = q_dot[2];
    }
}
