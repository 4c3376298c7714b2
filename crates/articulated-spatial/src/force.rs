//! Wrenches and spatial momenta.

use crate::frame::{FrameId, FrameMismatch, check_frame};
use crate::motion::Twist;
use crate::transform::Transform;
use nalgebra::Vector3;
use std::fmt::Display;
use std::ops::Neg;

/// A spatial force: torque about the origin of `frame` plus a linear force,
/// both expressed in `frame`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wrench {
    /// Frame the components are expressed in.
    pub frame: FrameId,
    /// Torque about the origin of `frame`.
    pub angular: Vector3<f64>,
    /// Force.
    pub linear: Vector3<f64>,
}

impl Wrench {
    /// Creates a new wrench from its torque and force parts.
    #[must_use]
    pub fn new(frame: FrameId, angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Wrench {
            frame,
            angular,
            linear,
        }
    }

    /// The zero wrench.
    #[must_use]
    pub fn zero(frame: FrameId) -> Self {
        Wrench::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Creates a wrench from a pure force applied at a point.
    ///
    /// `point` is the application point expressed in `frame`.
    #[must_use]
    pub fn from_force_at_point(frame: FrameId, force: Vector3<f64>, point: Vector3<f64>) -> Self {
        Wrench::new(frame, point.cross(&force), force)
    }

    /// Changes the frame the wrench is expressed in by the dual adjoint of
    /// `t`.
    pub fn transform(&self, t: &Transform) -> Result<Wrench, FrameMismatch> {
        check_frame(t.from, self.frame)?;
        let linear = t.rotation * self.linear;
        let angular = t.rotation * self.angular + t.translation.cross(&linear);
        Ok(Wrench {
            frame: t.to,
            angular,
            linear,
        })
    }

    /// Componentwise sum of two wrenches expressed in the same frame.
    pub fn add(&self, rhs: &Wrench) -> Result<Wrench, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        Ok(Wrench {
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        })
    }

    /// Componentwise difference of two wrenches expressed in the same frame.
    pub fn sub(&self, rhs: &Wrench) -> Result<Wrench, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        Ok(Wrench {
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        })
    }

    /// Power transmitted through a twist.
    pub fn dot(&self, twist: &Twist) -> Result<f64, FrameMismatch> {
        twist.dot(self)
    }
}

impl Neg for Wrench {
    type Output = Wrench;

    fn neg(self) -> Wrench {
        Wrench {
            frame: self.frame,
            angular: -self.angular,
            linear: -self.linear,
        }
    }
}

impl Display for Wrench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Wrench in {}: torque [{:.4}, {:.4}, {:.4}], force [{:.4}, {:.4}, {:.4}]",
            self.frame,
            self.angular[0],
            self.angular[1],
            self.angular[2],
            self.linear[0],
            self.linear[1],
            self.linear[2],
        )
    }
}

/// Spatial momentum: angular momentum about the origin of `frame` plus
/// linear momentum, both expressed in `frame`.
///
/// Momenta transform like wrenches and are produced by applying a spatial
/// inertia to a twist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Momentum {
    /// Frame the components are expressed in.
    pub frame: FrameId,
    /// Angular momentum about the origin of `frame`.
    pub angular: Vector3<f64>,
    /// Linear momentum.
    pub linear: Vector3<f64>,
}

impl Momentum {
    /// Creates a new momentum from its angular and linear parts.
    #[must_use]
    pub fn new(frame: FrameId, angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Momentum {
            frame,
            angular,
            linear,
        }
    }

    /// The zero momentum.
    #[must_use]
    pub fn zero(frame: FrameId) -> Self {
        Momentum::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Changes the frame the momentum is expressed in by the dual adjoint of
    /// `t`.
    pub fn transform(&self, t: &Transform) -> Result<Momentum, FrameMismatch> {
        check_frame(t.from, self.frame)?;
        let linear = t.rotation * self.linear;
        let angular = t.rotation * self.angular + t.translation.cross(&linear);
        Ok(Momentum {
            frame: t.to,
            angular,
            linear,
        })
    }

    /// Componentwise sum of two momenta expressed in the same frame.
    pub fn add(&self, rhs: &Momentum) -> Result<Momentum, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        Ok(Momentum {
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        })
    }

    /// Pairing with a twist; twice the kinetic energy when the twist is the
    /// one the momentum was built from.
    pub fn dot(&self, twist: &Twist) -> Result<f64, FrameMismatch> {
        check_frame(self.frame, twist.frame)?;
        Ok(self.angular.dot(&twist.angular) + self.linear.dot(&twist.linear))
    }
}

impl Display for Momentum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Momentum in {}: angular [{:.4}, {:.4}, {:.4}], linear [{:.4}, {:.4}, {:.4}]",
            self.frame,
            self.angular[0],
            self.angular[1],
            self.angular[2],
            self.linear[0],
            self.linear[1],
            self.linear[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation3;

    #[test]
    fn force_at_point_has_moment() {
        let f = FrameId::fresh();
        let w = Wrench::from_force_at_point(f, Vector3::y(), Vector3::x());
        assert_abs_diff_eq!(w.angular, Vector3::z());
        assert_abs_diff_eq!(w.linear, Vector3::y());
    }

    #[test]
    fn power_is_invariant_under_frame_change() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let t = Transform::new(
            a,
            b,
            Rotation3::from_euler_angles(0.4, 0.1, -0.9),
            Vector3::new(0.2, 1.5, -0.3),
        );
        let twist = Twist::new(body, base, a, Vector3::new(0.1, -0.2, 0.3), Vector3::new(1.0, 0.5, -0.7));
        let wrench = Wrench::new(a, Vector3::new(-0.4, 0.8, 0.1), Vector3::new(0.6, -0.2, 0.9));
        let p1 = wrench.dot(&twist).unwrap();
        let p2 = wrench
            .transform(&t)
            .unwrap()
            .dot(&twist.transform(&t).unwrap())
            .unwrap();
        assert_abs_diff_eq!(p1, p2, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let w1 = Wrench::zero(a);
        let w2 = Wrench::zero(b);
        assert!(w1.add(&w2).is_err());
    }
}
