//! Coordinate frame identity tags and the frame-compatibility contract.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity tag of a right-handed orthonormal coordinate frame.
///
/// Two tags denote the same frame exactly when they are equal. Tags carry no
/// geometric information themselves; geometry lives in the
/// [`Transform`](crate::transform::Transform)s relating frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

impl FrameId {
    /// Allocates a tag distinct from every tag allocated so far in this
    /// process.
    #[must_use]
    pub fn fresh() -> Self {
        FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw tag value.
    #[must_use]
    pub fn index(self) -> u64 {
        self.0
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame #{}", self.0)
    }
}

/// An operation received a spatial quantity expressed in the wrong frame.
///
/// The error is fatal for the call that produced it, but leaves all operands
/// untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameMismatch {
    /// The frame required by the operation's contract.
    pub expected: FrameId,
    /// The frame that was actually found.
    pub found: FrameId,
}

impl Display for FrameMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for FrameMismatch {}

/// Checks that `found` is the frame the caller's contract expects.
pub fn check_frame(expected: FrameId, found: FrameId) -> Result<(), FrameMismatch> {
    if expected == found {
        Ok(())
    } else {
        Err(FrameMismatch { expected, found })
    }
}
