//! Mechanisms, state caches, and rigid body dynamics algorithms.
//!
//! A [`mechanism::Mechanism`] is the immutable description of an articulated
//! system: a spanning tree of bodies and joints, plus non-tree joints closing
//! kinematic loops. A [`state::MechanismState`] holds the configuration and
//! velocity of one mechanism together with lazily recomputed kinematic
//! caches, and a [`result::DynamicsResult`] owns the buffers the dynamics
//! algorithms write into, so that repeated evaluations never allocate.

pub mod body;
pub mod errors;
pub mod mechanism;
pub mod result;
pub mod state;

pub mod dynamics;
pub mod energy;
pub mod inverse_dynamics;
pub mod kinematics;
pub mod mass_matrix;
