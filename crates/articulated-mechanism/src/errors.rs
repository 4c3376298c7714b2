//! Errors for mechanism construction and dynamics algorithms.

use articulated_spatial::frame::{FrameId, FrameMismatch};
use articulated_joint::joint::JointError;
use std::fmt::Display;

#[derive(Debug)]
/// An error that can occur while building or editing a mechanism.
pub enum TopologyError {
    /// The referenced predecessor body does not exist.
    PredecessorDoesNotExist(usize),
    /// The referenced successor body does not exist.
    SuccessorDoesNotExist(usize),
    /// The referenced joint does not exist.
    JointDoesNotExist(usize),
    /// The name of the body is already used.
    BodyNameAlreadyUsed(String),
    /// The name of the joint is already used.
    JointNameAlreadyUsed(String),
    /// A pose passed to `attach` does not relate the frames it must relate.
    PoseFrameMismatch(FrameMismatch),
}

impl Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::PredecessorDoesNotExist(id) => {
                write!(f, "Predecessor body with id {} does not exist.", id)
            }
            TopologyError::SuccessorDoesNotExist(id) => {
                write!(f, "Successor body with id {} does not exist.", id)
            }
            TopologyError::JointDoesNotExist(id) => {
                write!(f, "Joint with id {} does not exist.", id)
            }
            TopologyError::BodyNameAlreadyUsed(name) => {
                write!(f, "Body name '{}' is already used.", name)
            }
            TopologyError::JointNameAlreadyUsed(name) => {
                write!(f, "Joint name '{}' is already used.", name)
            }
            TopologyError::PoseFrameMismatch(e) => {
                write!(f, "Pose relates the wrong frames: {}", e)
            }
        }
    }
}

impl std::error::Error for TopologyError {}

#[derive(Debug)]
/// Errors that can occur during kinematics and dynamics computations.
pub enum AlgorithmError {
    /// Spatial quantities with incompatible frame annotations were combined.
    FrameMismatch(FrameMismatch),
    /// A caller-supplied buffer has the wrong size.
    DimensionMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    /// The state was created against an older version of the mechanism.
    StaleState,
    /// The mass matrix is not positive definite.
    SingularInertia,
    /// The loop-constraint system is singular or inconsistent.
    RedundantConstraint,
    /// A joint-level configuration operation failed.
    Configuration(JointError),
    /// The referenced frame is not attached to any body of the mechanism.
    UnknownFrame(FrameId),
    /// The referenced body does not exist.
    UnknownBody(usize),
    /// The referenced tree joint does not exist.
    UnknownJoint(usize),
}

impl Display for AlgorithmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlgorithmError::FrameMismatch(e) => write!(f, "Frame mismatch: {}", e),
            AlgorithmError::DimensionMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Incorrect size for argument '{}': expected {}, got {}",
                    name, expected, got
                )
            }
            AlgorithmError::StaleState => {
                write!(f, "State is stale: the mechanism topology has changed.")
            }
            AlgorithmError::SingularInertia => {
                write!(f, "Mass matrix is not positive definite.")
            }
            AlgorithmError::RedundantConstraint => {
                write!(f, "Loop-constraint system is singular.")
            }
            AlgorithmError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AlgorithmError::UnknownFrame(frame) => {
                write!(f, "{} is not attached to any body of the mechanism.", frame)
            }
            AlgorithmError::UnknownBody(id) => {
                write!(f, "Body with id {} does not exist.", id)
            }
            AlgorithmError::UnknownJoint(id) => {
                write!(f, "Tree joint with id {} does not exist.", id)
            }
        }
    }
}

impl std::error::Error for AlgorithmError {}

impl From<FrameMismatch> for AlgorithmError {
    fn from(e: FrameMismatch) -> Self {
        AlgorithmError::FrameMismatch(e)
    }
}

impl From<JointError> for AlgorithmError {
    fn from(e: JointError) -> Self {
        AlgorithmError::Configuration(e)
    }
}
