//! Defines a generic joint model trait and a struct to wrap different joint types.
//!
//! This module provides both:
//! * The `JointModel` trait, which defines the common interface for different joint types.
//! * The `JointWrapper` struct, which encapsulates different joint model implementations and
//!   provides a unified interface to interact with them.

use crate::{
    fixed::JointModelFixed, planar::JointModelPlanar, prismatic::JointModelPrismatic,
    quaternion_floating::JointModelQuaternionFloating, revolute::JointModelRevolute,
    spquat_floating::JointModelSpQuatFloating,
};
use articulated_spatial::{
    frame::FrameId,
    jacobian::{GeometricJacobian, WrenchMatrix},
    motion::{SpatialAcceleration, Twist},
    transform::Transform,
};
use nalgebra::{Unit, Vector3};
use rand::rngs::ThreadRng;

/// Joint trait for defining joints in an articulated mechanism.
///
/// This trait provides a common interface for different joint types,
/// allowing for polymorphic behavior when working with various joint models.
/// All operations are side-effect-free except the in-place configuration
/// writers.
pub trait JointModel {
    /// Returns the joint type.
    fn joint_type(&self) -> JointType;

    /// Returns the number of configuration variables.
    fn nq(&self) -> usize;

    /// Returns the number of velocity variables.
    fn nv(&self) -> usize;

    /// Returns the dimension of the constraint wrench subspace.
    fn nc(&self) -> usize {
        6 - self.nv()
    }

    /// Returns the transform from `frame_after` to `frame_before` at
    /// configuration `q`.
    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform;

    /// Returns the twist of `frame_after` relative to `frame_before`,
    /// expressed in `frame_after`.
    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        v: &[f64],
    ) -> Twist;

    /// Returns the part of the joint's spatial acceleration that does not
    /// depend on the joint acceleration (the `Ṡ·v` term), expressed in
    /// `frame_after`.
    fn bias_acceleration(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        v: &[f64],
    ) -> SpatialAcceleration;

    /// Writes the motion subspace (6×nv, expressed in `frame_after`) into
    /// `out`. `out` must have exactly `nv` columns.
    fn motion_subspace(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        out: &mut GeometricJacobian,
    );

    /// Writes the constraint wrench subspace (6×nc, expressed in
    /// `frame_after`) into `out`. `out` must have exactly `nc` columns.
    fn constraint_wrench_subspace(&self, frame_after: FrameId, q: &[f64], out: &mut WrenchMatrix);

    /// Writes the zero (neutral) configuration into `q`.
    fn zero_configuration(&self, q: &mut [f64]);

    /// Writes a random configuration into `q`.
    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng);

    /// Normalizes the configuration in place.
    ///
    /// Most joint types have nothing to normalize; joints with a unit-norm
    /// constraint on part of their configuration renormalize it and report
    /// [`JointError::ConfigurationOutOfRange`] when that is impossible.
    fn normalize_configuration(&self, q: &mut [f64]) -> Result<(), JointError>;

    /// Maps a joint velocity to the time derivative of the configuration.
    fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]);

    /// Maps a configuration time derivative back to a joint velocity.
    fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]);
}

/// Enum representing the type of joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    Revolute,
    Prismatic,
    Planar,
    Fixed,
    QuaternionFloating,
    SpQuatFloating,
}

/// An error produced by a joint-level configuration operation.
#[derive(Debug)]
pub enum JointError {
    /// Normalization produced a non-finite value (e.g. a zero quaternion).
    ConfigurationOutOfRange(String),
}

impl std::fmt::Display for JointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointError::ConfigurationOutOfRange(detail) => {
                write!(f, "Configuration out of range: {}", detail)
            }
        }
    }
}

impl std::error::Error for JointError {}

/// Returns two unit vectors completing `axis` to a right-handed orthonormal
/// basis.
pub(crate) fn orthonormal_complement(axis: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let b1 = axis.cross(&helper).normalize();
    let b2 = axis.cross(&b1);
    (b1, b2)
}

#[derive(Clone, Debug)]
/// Enum encapsulating different joint model implementations.
///
/// It serves as the inner representation for the `JointWrapper` struct.
/// As such, users should interact with joints through the `JointWrapper`
/// interface, and avoid using this enum directly.
enum JointModelImpl {
    Revolute(JointModelRevolute),
    Prismatic(JointModelPrismatic),
    Planar(JointModelPlanar),
    Fixed(JointModelFixed),
    QuaternionFloating(JointModelQuaternionFloating),
    SpQuatFloating(JointModelSpQuatFloating),
}

#[derive(Clone, Debug)]
/// Wrapper struct for different joint model implementations.
///
/// This struct provides a unified interface to interact with different joint
/// types through the `JointModel` trait. Dispatch happens once per joint per
/// operation, never per matrix element.
pub struct JointWrapper {
    inner: JointModelImpl,
}

impl JointWrapper {
    /// Creates a new `JointWrapper` from a `JointModelRevolute`.
    #[must_use]
    pub fn revolute(joint: JointModelRevolute) -> Self {
        JointWrapper {
            inner: JointModelImpl::Revolute(joint),
        }
    }

    /// Creates a new `JointWrapper` from a `JointModelPrismatic`.
    #[must_use]
    pub fn prismatic(joint: JointModelPrismatic) -> Self {
        JointWrapper {
            inner: JointModelImpl::Prismatic(joint),
        }
    }

    /// Creates a new `JointWrapper` from a `JointModelPlanar`.
    #[must_use]
    pub fn planar(joint: JointModelPlanar) -> Self {
        JointWrapper {
            inner: JointModelImpl::Planar(joint),
        }
    }

    /// Creates a new `JointWrapper` from a `JointModelFixed`.
    #[must_use]
    pub fn fixed(joint: JointModelFixed) -> Self {
        JointWrapper {
            inner: JointModelImpl::Fixed(joint),
        }
    }

    /// Creates a new `JointWrapper` from a `JointModelQuaternionFloating`.
    #[must_use]
    pub fn quaternion_floating(joint: JointModelQuaternionFloating) -> Self {
        JointWrapper {
            inner: JointModelImpl::QuaternionFloating(joint),
        }
    }

    /// Creates a new `JointWrapper` from a `JointModelSpQuatFloating`.
    #[must_use]
    pub fn spquat_floating(joint: JointModelSpQuatFloating) -> Self {
        JointWrapper {
            inner: JointModelImpl::SpQuatFloating(joint),
        }
    }
}

// The following is boilerplate to forward JointModel trait methods to the inner joint model.
impl JointModel for JointWrapper {
    fn joint_type(&self) -> JointType {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.joint_type(),
            JointModelImpl::Prismatic(joint) => joint.joint_type(),
            JointModelImpl::Planar(joint) => joint.joint_type(),
            JointModelImpl::Fixed(joint) => joint.joint_type(),
            JointModelImpl::QuaternionFloating(joint) => joint.joint_type(),
            JointModelImpl::SpQuatFloating(joint) => joint.joint_type(),
        }
    }

    fn nq(&self) -> usize {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.nq(),
            JointModelImpl::Prismatic(joint) => joint.nq(),
            JointModelImpl::Planar(joint) => joint.nq(),
            JointModelImpl::Fixed(joint) => joint.nq(),
            JointModelImpl::QuaternionFloating(joint) => joint.nq(),
            JointModelImpl::SpQuatFloating(joint) => joint.nq(),
        }
    }

    fn nv(&self) -> usize {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.nv(),
            JointModelImpl::Prismatic(joint) => joint.nv(),
            JointModelImpl::Planar(joint) => joint.nv(),
            JointModelImpl::Fixed(joint) => joint.nv(),
            JointModelImpl::QuaternionFloating(joint) => joint.nv(),
            JointModelImpl::SpQuatFloating(joint) => joint.nv(),
        }
    }

    fn joint_transform(&self, frame_after: FrameId, frame_before: FrameId, q: &[f64]) -> Transform {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.joint_transform(frame_after, frame_before, q),
            JointModelImpl::Prismatic(joint) => joint.joint_transform(frame_after, frame_before, q),
            JointModelImpl::Planar(joint) => joint.joint_transform(frame_after, frame_before, q),
            JointModelImpl::Fixed(joint) => joint.joint_transform(frame_after, frame_before, q),
            JointModelImpl::QuaternionFloating(joint) => {
                joint.joint_transform(frame_after, frame_before, q)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.joint_transform(frame_after, frame_before, q)
            }
        }
    }

    fn joint_twist(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        v: &[f64],
    ) -> Twist {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.joint_twist(frame_after, frame_before, q, v),
            JointModelImpl::Prismatic(joint) => joint.joint_twist(frame_after, frame_before, q, v),
            JointModelImpl::Planar(joint) => joint.joint_twist(frame_after, frame_before, q, v),
            JointModelImpl::Fixed(joint) => joint.joint_twist(frame_after, frame_before, q, v),
            JointModelImpl::QuaternionFloating(joint) => {
                joint.joint_twist(frame_after, frame_before, q, v)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.joint_twist(frame_after, frame_before, q, v)
            }
        }
    }

    fn bias_acceleration(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        v: &[f64],
    ) -> SpatialAcceleration {
        match &self.inner {
            JointModelImpl::Revolute(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
            JointModelImpl::Prismatic(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
            JointModelImpl::Planar(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
            JointModelImpl::Fixed(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
            JointModelImpl::QuaternionFloating(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.bias_acceleration(frame_after, frame_before, q, v)
            }
        }
    }

    fn motion_subspace(
        &self,
        frame_after: FrameId,
        frame_before: FrameId,
        q: &[f64],
        out: &mut GeometricJacobian,
    ) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
            JointModelImpl::Prismatic(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
            JointModelImpl::Planar(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
            JointModelImpl::Fixed(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
            JointModelImpl::QuaternionFloating(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.motion_subspace(frame_after, frame_before, q, out)
            }
        }
    }

    fn constraint_wrench_subspace(&self, frame_after: FrameId, q: &[f64], out: &mut WrenchMatrix) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => {
                joint.constraint_wrench_subspace(frame_after, q, out)
            }
            JointModelImpl::Prismatic(joint) => {
                joint.constraint_wrench_subspace(frame_after, q, out)
            }
            JointModelImpl::Planar(joint) => joint.constraint_wrench_subspace(frame_after, q, out),
            JointModelImpl::Fixed(joint) => joint.constraint_wrench_subspace(frame_after, q, out),
            JointModelImpl::QuaternionFloating(joint) => {
                joint.constraint_wrench_subspace(frame_after, q, out)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.constraint_wrench_subspace(frame_after, q, out)
            }
        }
    }

    fn zero_configuration(&self, q: &mut [f64]) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.zero_configuration(q),
            JointModelImpl::Prismatic(joint) => joint.zero_configuration(q),
            JointModelImpl::Planar(joint) => joint.zero_configuration(q),
            JointModelImpl::Fixed(joint) => joint.zero_configuration(q),
            JointModelImpl::QuaternionFloating(joint) => joint.zero_configuration(q),
            JointModelImpl::SpQuatFloating(joint) => joint.zero_configuration(q),
        }
    }

    fn rand_configuration(&self, q: &mut [f64], rng: &mut ThreadRng) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.rand_configuration(q, rng),
            JointModelImpl::Prismatic(joint) => joint.rand_configuration(q, rng),
            JointModelImpl::Planar(joint) => joint.rand_configuration(q, rng),
            JointModelImpl::Fixed(joint) => joint.rand_configuration(q, rng),
            JointModelImpl::QuaternionFloating(joint) => joint.rand_configuration(q, rng),
            JointModelImpl::SpQuatFloating(joint) => joint.rand_configuration(q, rng),
        }
    }

    fn normalize_configuration(&self, q: &mut [f64]) -> Result<(), JointError> {
        match &self.inner {
            JointModelImpl::Revolute(joint) => joint.normalize_configuration(q),
            JointModelImpl::Prismatic(joint) => joint.normalize_configuration(q),
            JointModelImpl::Planar(joint) => joint.normalize_configuration(q),
            JointModelImpl::Fixed(joint) => joint.normalize_configuration(q),
            JointModelImpl::QuaternionFloating(joint) => joint.normalize_configuration(q),
            JointModelImpl::SpQuatFloating(joint) => joint.normalize_configuration(q),
        }
    }

    fn velocity_to_configuration_derivative(&self, q: &[f64], v: &[f64], q_dot: &mut [f64]) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
            JointModelImpl::Prismatic(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
            JointModelImpl::Planar(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
            JointModelImpl::Fixed(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
            JointModelImpl::QuaternionFloating(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.velocity_to_configuration_derivative(q, v, q_dot)
            }
        }
    }

    fn configuration_derivative_to_velocity(&self, q: &[f64], q_dot: &[f64], v: &mut [f64]) {
        match &self.inner {
            JointModelImpl::Revolute(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
            JointModelImpl::Prismatic(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
            JointModelImpl::Planar(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
            JointModelImpl::Fixed(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
            JointModelImpl::QuaternionFloating(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
            JointModelImpl::SpQuatFloating(joint) => {
                joint.configuration_derivative_to_velocity(q, q_dot, v)
            }
        }
    }
}
