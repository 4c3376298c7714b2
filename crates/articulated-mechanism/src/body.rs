//! Rigid bodies.

use articulated_inertia::inertia::SpatialInertia;
use articulated_spatial::frame::FrameId;

/// A rigid body: a name, a body-fixed default frame, and optionally a
/// spatial inertia expressed in that frame.
///
/// The root body of a mechanism has no inertia; every other body normally
/// has one (a massless intermediate body is permitted and simply contributes
/// nothing to the dynamics).
#[derive(Clone, Debug)]
pub struct RigidBody {
    /// Name of the body.
    pub name: String,
    /// The body's default frame.
    pub frame: FrameId,
    /// The body's spatial inertia, expressed in `frame`.
    pub inertia: Option<SpatialInertia>,
}

impl RigidBody {
    /// Creates a new rigid body whose default frame is the frame the inertia
    /// is expressed in.
    #[must_use]
    pub fn new(name: impl Into<String>, inertia: SpatialInertia) -> Self {
        RigidBody {
            name: name.into(),
            frame: inertia.frame,
            inertia: Some(inertia),
        }
    }

    /// Creates a new rigid body without inertia, with a fresh default frame.
    ///
    /// Used for mechanism roots and massless intermediate bodies.
    #[must_use]
    pub fn massless(name: impl Into<String>) -> Self {
        RigidBody {
            name: name.into(),
            frame: FrameId::fresh(),
            inertia: None,
        }
    }
}
