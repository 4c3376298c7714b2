//! Floating joint parametrized by stereographic projection quaternion
//! (modified Rodrigues) rotation parameters.

use crate::joint::{JointError, JointModel, JointType};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use rand::rngs::ThreadRng;

/// Model of a floating joint with a 6-dimensional configuration.
///
/// The configuration is `[sx, sy, sz, px, py, pz]` where `s` is the
/// stereographic projection of the rotation quaternion (`s = q_vec / (1 +
/// q_w)`). Unlike the quaternion parametrization there is no unit-norm
/// constraint, at the price of a coordinate singularity at a rotation of 2π.
/// The velocity convention matches the quaternion-floating joint: body-fixed
/// `[ω, v]` expressed in `frame_after`.
#[derive(Clone, Debug, Default)]
pub struct JointModelSpQuatFloating {}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v[2], v[1], v[2], 0.0, -v[0], -v[1], v[0], 0.0)
}

fn rotation_part(q: &[f64]) -> UnitQuaternion<f64> {
    let s = Vector3::new(q[0], q[1], q[2]);
    let sigma = s.norm_squared();
    let scale = 1.0 / (1.0 + sigma);
    UnitQuaternion::from_quaternion(Quaternion::new(
        (1.0 - sigma) * scale,
        2.0 * s[0] * scale,
        2.0 * s[1] * scale,
        2.0 * s[2] * scale,
    ))
}

/// The kinematics matrix `B(s)` with `ṡ = ¼ B(s) ω`.
fn kinematics_matrix(s: &Vector3<f64>) -> Matrix3<f64> {
    (1.0 - s.norm_squared()) * Matrix3::identity() + 2.0 * skew(s) + 2.0 * s * s.transpose()
}

impl JointModel for JointModelSpQuatFloating {
    fn joint_type(&self) -> JointType {
        JointType::SpQuatFloating
    }

    fn nq(&self) -> usize {
        6
    }

    fn nv(&self) -> usize {
        6
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        debug_assert_eq!(q.len(), 6);
        Transform::new(
            frame_after,
            frame_before,
            rotation_part(q).to_rotation_matrix(),
            Vector3::new(q[3], q[4], q[5]),
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
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        // Sample a uniform rotation and project it; pick the hemisphere away
        // from the 2π singularity.
        let u1: f64 = rng.random();
        let u2: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        let u3: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        let a = (1.0 - u1).sqrt();
        let b = u1.sqrt();
        let mut w = b * u3.cos();
        let mut vec = Vector3::new(a * u2.sin(), a * u2.cos(), b * u3.sin());
        if w < 0.0 {
            w = -w;
            vec = -vec;
        }
        let s = vec / (1.0 + w);
        q[0] = s[0];
        q[1] = s[1];
        q[2] = s[2];
        for slot in &mut q[3..6] {
            *slot = rng.random_range(-1.0..1.0);
        }
    }

    fn normalize_configuration(&self, q: &mut [f64]) -> Result<(), JointError> {
        if q.iter().any(|x| !x.is_finite()) {
            return Err(JointError::ConfigurationOutOfRange(
                "non-finite SPQuat configuration".to_string(),
            ));
        }
        Ok(())
    }

    fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        let s = Vector3::new(q[0], q[1], q[2]);
        let omega = Vector3::new(v[0], v[1], v[2]);
        let s_dot = 0.25 * kinematics_matrix(&s) * omega;
        q_dot[0] = s_dot[0];
        q_dot[1] = s_dot[1];
        q_dot[2] = s_dot[2];
        let linear = rotation_part(q) * Vector3::new(v[3], v[4], v[5]);
        q_dot[3] = linear[0];
        q_dot[4] = linear[1];
        q_dot[5] = linear[2];
    }

    fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        let s = Vector3::new(q[0], q[1], q[2]);
        let s_dot = Vector3::new(q_dot[0], q_dot[1], q_dot[2]);
        // B(s) Bᵀ(s) = (1 + s·s)² I, so the inverse map is a scaled
        // transpose.
        let denom = 1.0 + s.norm_squared();
        let omega = 4.0 * kinematics_matrix(&s).transpose() * s_dot / (denom * denom);
        v[0] = omega[0];
        v[1] = omega[1];
        v[2] = omega[2];
        let linear = rotation_part(q).inverse() * Vector3::new(q_dot[3], q_dot[4], q_dot[5]);
        v[3] = linear[0];
        v[4] = linear[1];
        v[5] = linear[2];
    }
}
