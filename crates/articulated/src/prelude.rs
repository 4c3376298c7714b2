//! Curated re-exports for the common case.

// Mechanism
pub use crate::mechanism::body::RigidBody;
pub use crate::mechanism::mechanism::{Joint, Mechanism, ROOT_ID, STANDARD_GRAVITY};
pub use crate::mechanism::result::DynamicsResult;
pub use crate::mechanism::state::MechanismState;

// Algorithms
pub use crate::mechanism::dynamics::dynamics;
pub use crate::mechanism::energy::{gravitational_potential_energy, kinetic_energy, momentum};
pub use crate::mechanism::inverse_dynamics::inverse_dynamics;
pub use crate::mechanism::kinematics::{center_of_mass, geometric_jacobian};
pub use crate::mechanism::mass_matrix::mass_matrix;

// Errors
pub use crate::mechanism::errors::{AlgorithmError, TopologyError};

// Joints
pub use crate::joint::fixed::JointModelFixed;
pub use crate::joint::joint::{JointModel, JointType, JointWrapper};
pub use crate::joint::planar::JointModelPlanar;
pub use crate::joint::prismatic::JointModelPrismatic;
pub use crate::joint::quaternion_floating::JointModelQuaternionFloating;
pub use crate::joint::revolute::JointModelRevolute;
pub use crate::joint::spquat_floating::JointModelSpQuatFloating;

// Spatial
pub use crate::inertia::inertia::SpatialInertia;
pub use crate::spatial::force::{Momentum, Wrench};
pub use crate::spatial::frame::FrameId;
pub use crate::spatial::jacobian::{GeometricJacobian, WrenchMatrix};
pub use crate::spatial::motion::{SpatialAcceleration, Twist};
pub use crate::spatial::transform::Transform;
