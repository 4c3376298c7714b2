//! Quaternion-parametrized floating joint: the canonical 6-DOF joint.

use crate::joint::{JointError, JointModel, JointType};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Model of a floating joint parametrized by a unit quaternion.
///
/// The configuration is `[w, x, y, z, px, py, pz]`: the rotation quaternion
/// followed by the position of `frame_after` in `frame_before`. The velocity
/// is the body-fixed twist `[ω, v]` expressed in `frame_after`; since the
/// configuration manifold is not a vector space, `q̇ ≠ v` and the quaternion
/// kinematic equation provides the map between the two.
#[derive(Clone, Debug, Default)]
pub struct JointModelQuaternionFloating {}

/// Samples a rotation uniformly over SO(3) via the subgroup algorithm.
fn rand_unit_quaternion(rng: &mut ThreadRng) -> [f64; 4] {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let u3: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    [b * u3.cos(), a * u2.sin(), a * u2.cos(), b * u3.sin()]
}

fn rotation_part(q: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

impl JointModel for JointModelQuaternionFloating {
    fn joint_type(&self) -> JointType {
        JointType::QuaternionFloating
    }

    fn nq(&self) -> usize {
        7
    }

    fn nv(&self) -> usize {
        6
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert_eq!(q.len(), 7);
        Transform::new(
            frame_after,
            frame_before,
            rotation_part(q).to_rotation_matrix(),
            Vector3::new(q[4], q[5], q[6]),
        )
    }

    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        _q: &[f64],
        v: &[f64],
    ) -> Twist {
        debug_assert_eq!(v.len(), 6);
        Twist::new(
            frame_after,
            frame_before,
            frame_after,
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
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
        debug_assert_eq!(out.ncols(), 6);
        out.body = frame_after;
        out.base = frame_before;
        out.frame = frame_after;
        out.set_column(0, &Vector3::x(), &Vector3::zeros());
        out.set_column(1, &Vector3::y(), &Vector3::zeros());
        out.set_column(2, &Vector3::z(), &Vector3::zeros());
        out.set_column(3, &Vector3::zeros(), &Vector3::x());
        out.set_column(4, &Vector3::zeros(), &Vector3::y());
        out.set_column(5, &Vector3::zeros(), &Vector3::z());
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, _q: &[f64], out: &mut WrenchMatrix) {
        debug_assert_eq!(out.ncols(), 0);
        out.frame = frame_after;
    }

    fn zero_configuration(&self, q: &mut [f64]) {
        q.fill(0.0);
        q[0] = 1.0;
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        let quat = rand_unit_quaternion(rng);
        q[..4].copy_from_slice(&quat);
        for slot in &mut q[4..7] {
            *slot = rng.random_range(-1.0..1.0);
        }
    }

    fn normalize_configuration(&self, q: &mut [f64]) -> Result<(), JointError> {
        let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(JointError::ConfigurationOutOfRange(format!(
                "quaternion with norm {norm} cannot be normalized"
            )));
        }
        for slot in &mut q[..4] {
            *slot /= norm;
        }
        Ok(())
    }

    fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        // Quaternion kinematic equation for a body-fixed angular velocity:
        // q̇ = ½ q ⊗ (0, ω).
        let quat = Quaternion::new(q[0], q[1], q[2], q[3]);
        let omega = Quaternion::new(0.0, v[0], v[1], v[2]);
        let qd = quat * omega * 0.5;
        q_dot[0] = qd.w;
        q_dot[1] = qd.i;
        q_dot[2] = qd.j;
        q_dot[3] = qd.k;
        let linear = rotation_part(q) * Vector3::new(v[3], v[4], v[5]);
        q_dot[4] = linear[0];
        q_dot[5] = linear[1];
        q_dot[6] = linear[2];
    }

    fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        let quat = Quaternion::new(q[0], q[1], q[2], q[3]);
        let qd = Quaternion::new(q_dot[0], q_dot[1], q_dot[2], q_dot[3]);
        let omega = quat.conjugate() * qd * 2.0;
        v[0] = omega.i;
        v[1] = omega.j;
        v[2] = omega.k;
        let linear = rotation_part(q).inverse() * Vector3::new(q_dot[4], q_dot[5], q_dot[6]);
        v[3] = linear[0];
        v[4] = linear[1];
        v[5] = linear[2];
    }
}
