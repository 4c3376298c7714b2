//! Twists and spatial accelerations.

use crate::force::{Momentum, Wrench};
use crate::frame::{FrameId, FrameMismatch, check_frame};
use crate::transform::Transform;
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Vector3;
use std::fmt::Display;
use std::ops::Neg;

/// Angular and linear velocity of `body` relative to `base`, expressed in
/// `frame`.
///
/// The linear part is the velocity of the point of `body` currently
/// coinciding with the origin of `frame`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Twist {
    /// Frame tag identifying the moving body.
    pub body: FrameId,
    /// Frame tag identifying the reference body.
    pub base: FrameId,
    /// Frame the numeric components are expressed in.
    pub frame: FrameId,
    /// Angular velocity.
    pub angular: Vector3<f64>,
    /// Linear velocity.
    pub linear: Vector3<f64>,
}

impl Twist {
    /// Creates a new twist from its angular and linear parts.
    #[must_use]
    pub fn new(
        body: FrameId,
        base: FrameId,
        frame: FrameId,
        angular: Vector3<f64>,
        linear: Vector3<f64>,
    ) -> Self {
        Twist {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    /// The zero twist of `body` relative to `base`.
    #[must_use]
    pub fn zero(body: FrameId, base: FrameId, frame: FrameId) -> Self {
        Twist::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Changes the frame the twist is expressed in by the adjoint of `t`.
    ///
    /// Requires `t.from == self.frame`; the result is expressed in `t.to`.
    pub fn transform(&self, t: &Transform) -> Result<Twist, FrameMismatch> {
        check_frame(t.from, self.frame)?;
        let angular = t.rotation * self.angular;
        let linear = t.rotation * self.linear + t.translation.cross(&angular);
        Ok(Twist {
            body: self.body,
            base: self.base,
            frame: t.to,
            angular,
            linear,
        })
    }

    /// Adds two twists expressed in the same frame.
    ///
    /// Identical `(body, base)` pairs sum componentwise; pairs that chain
    /// (`self.base == rhs.body` or `rhs.base == self.body`) compose into the
    /// twist across the outer bodies. Anything else is a [`FrameMismatch`].
    pub fn add(&self, rhs: &Twist) -> Result<Twist, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        let (body, base) = if self.body == rhs.body && self.base == rhs.base {
            (self.body, self.base)
        } else if self.base == rhs.body {
            (self.body, rhs.base)
        } else if rhs.base == self.body {
            (rhs.body, self.base)
        } else {
            return Err(FrameMismatch {
                expected: self.base,
                found: rhs.body,
            });
        };
        Ok(Twist {
            body,
            base,
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        })
    }

    /// Subtracts two twists sharing a base: `twist(A, C) − twist(B, C) =
    /// twist(A, B)`.
    pub fn sub(&self, rhs: &Twist) -> Result<Twist, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        check_frame(self.base, rhs.base)?;
        Ok(Twist {
            body: self.body,
            base: rhs.body,
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        })
    }

    /// Spatial cross product of two motion vectors.
    ///
    /// This is the time derivative, due to the motion `self`, of a twist held
    /// constant in a frame moving with `self`; the result inherits the body
    /// and base of `rhs`.
    pub fn cross(&self, rhs: &Twist) -> Result<SpatialAcceleration, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        Ok(SpatialAcceleration {
            body: rhs.body,
            base: rhs.base,
            frame: self.frame,
            angular: self.angular.cross(&rhs.angular),
            linear: self.angular.cross(&rhs.linear) + self.linear.cross(&rhs.angular),
        })
    }

    /// Dual spatial cross product against a momentum: `self ×* h`.
    ///
    /// This is the rate of change, due to the motion `self`, of a momentum
    /// held constant in a frame moving with `self`; the result is a wrench.
    pub fn cross_momentum(&self, h: &Momentum) -> Result<Wrench, FrameMismatch> {
        check_frame(self.frame, h.frame)?;
        Ok(Wrench {
            frame: self.frame,
            angular: self.angular.cross(&h.angular) + self.linear.cross(&h.linear),
            linear: self.angular.cross(&h.linear),
        })
    }

    /// Power transmitted by a wrench through this twist.
    pub fn dot(&self, wrench: &Wrench) -> Result<f64, FrameMismatch> {
        check_frame(self.frame, wrench.frame)?;
        Ok(self.angular.dot(&wrench.angular) + self.linear.dot(&wrench.linear))
    }
}

impl Neg for Twist {
    type Output = Twist;

    /// The twist of `base` relative to `body`.
    fn neg(self) -> Twist {
        Twist {
            body: self.base,
            base: self.body,
            frame: self.frame,
            angular: -self.angular,
            linear: -self.linear,
        }
    }
}

impl Display for Twist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Twist of {} w.r.t. {} in {}: angular [{:.4}, {:.4}, {:.4}], linear [{:.4}, {:.4}, {:.4}]",
            self.body,
            self.base,
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

impl AbsDiffEq for Twist {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.body == other.body
            && self.base == other.base
            && self.frame == other.frame
            && self.angular.abs_diff_eq(&other.angular, epsilon)
            && self.linear.abs_diff_eq(&other.linear, epsilon)
    }
}

impl RelativeEq for Twist {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.body == other.body
            && self.base == other.base
            && self.frame == other.frame
            && self.angular.relative_eq(&other.angular, epsilon, max_relative)
            && self.linear.relative_eq(&other.linear, epsilon, max_relative)
    }
}

/// Spatial acceleration of `body` relative to `base`, expressed in `frame`.
///
/// Defined as the apparent time derivative, in the expressed-in frame, of the
/// corresponding twist. With this convention accelerations expressed in a
/// common inertial frame add and subtract like twists; the velocity-dependent
/// correction terms appear explicitly in the kinematics formulas instead of
/// inside the frame change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialAcceleration {
    /// Frame tag identifying the accelerating body.
    pub body: FrameId,
    /// Frame tag identifying the reference body.
    pub base: FrameId,
    /// Frame the numeric components are expressed in.
    pub frame: FrameId,
    /// Angular acceleration.
    pub angular: Vector3<f64>,
    /// Linear acceleration.
    pub linear: Vector3<f64>,
}

impl SpatialAcceleration {
    /// Creates a new spatial acceleration from its angular and linear parts.
    #[must_use]
    pub fn new(
        body: FrameId,
        base: FrameId,
        frame: FrameId,
        angular: Vector3<f64>,
        linear: Vector3<f64>,
    ) -> Self {
        SpatialAcceleration {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    /// The zero acceleration of `body` relative to `base`.
    #[must_use]
    pub fn zero(body: FrameId, base: FrameId, frame: FrameId) -> Self {
        SpatialAcceleration::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    /// Changes the frame the acceleration is expressed in by the adjoint of
    /// `t`.
    pub fn transform(&self, t: &Transform) -> Result<SpatialAcceleration, FrameMismatch> {
        check_frame(t.from, self.frame)?;
        let angular = t.rotation * self.angular;
        let linear = t.rotation * self.linear + t.translation.cross(&angular);
        Ok(SpatialAcceleration {
            body: self.body,
            base: self.base,
            frame: t.to,
            angular,
            linear,
        })
    }

    /// Adds two accelerations expressed in the same frame; the body/base
    /// pairing rules match [`Twist::add`].
    pub fn add(&self, rhs: &SpatialAcceleration) -> Result<SpatialAcceleration, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        let (body, base) = if self.body == rhs.body && self.base == rhs.base {
            (self.body, self.base)
        } else if self.base == rhs.body {
            (self.body, rhs.base)
        } else if rhs.base == self.body {
            (rhs.body, self.base)
        } else {
            return Err(FrameMismatch {
                expected: self.base,
                found: rhs.body,
            });
        };
        Ok(SpatialAcceleration {
            body,
            base,
            frame: self.frame,
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        })
    }

    /// Subtracts two accelerations sharing a base, analogously to
    /// [`Twist::sub`].
    pub fn sub(&self, rhs: &SpatialAcceleration) -> Result<SpatialAcceleration, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        check_frame(self.base, rhs.base)?;
        Ok(SpatialAcceleration {
            body: self.body,
            base: rhs.body,
            frame: self.frame,
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        })
    }
}

impl Display for SpatialAcceleration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpatialAcceleration of {} w.r.t. {} in {}: angular [{:.4}, {:.4}, {:.4}], linear [{:.4}, {:.4}, {:.4}]",
            self.body,
            self.base,
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

    fn frames(n: usize) -> Vec<FrameId> {
        (0..n).map(|_| FrameId::fresh()).collect()
    }

    #[test]
    fn chained_addition_composes_bodies() {
        let f = frames(4);
        let (world, a, b) = (f[0], f[1], f[2]);
        let t_ab = Twist::new(a, b, world, Vector3::x(), Vector3::y());
        let t_bw = Twist::new(b, world, world, Vector3::z(), Vector3::zeros());
        let t_aw = t_ab.add(&t_bw).unwrap();
        assert_eq!(t_aw.body, a);
        assert_eq!(t_aw.base, world);
        assert_abs_diff_eq!(t_aw.angular, Vector3::new(1.0, 0.0, 1.0));

        // Subtracting the intermediate twist recovers the relative one.
        let back = t_aw.sub(&t_bw).unwrap();
        assert_eq!(back.body, a);
        assert_eq!(back.base, b);
        assert_abs_diff_eq!(back.angular, t_ab.angular);
        assert_abs_diff_eq!(back.linear, t_ab.linear);
    }

    #[test]
    fn addition_rejects_unrelated_pairs() {
        let f = frames(5);
        let t1 = Twist::new(f[0], f[1], f[4], Vector3::x(), Vector3::zeros());
        let t2 = Twist::new(f[2], f[3], f[4], Vector3::y(), Vector3::zeros());
        assert!(t1.add(&t2).is_err());
    }

    #[test]
    fn transform_rotates_and_shifts_moment() {
        let f = frames(3);
        let (body, a, b) = (f[0], f[1], f[2]);
        // Pure rotation about z at the origin of `a`, observed from a frame
        // `b` whose origin sits one unit along x.
        let twist = Twist::new(body, a, a, Vector3::z(), Vector3::zeros());
        let t = Transform::new(a, b, Rotation3::identity(), Vector3::new(-1.0, 0.0, 0.0));
        let moved = twist.transform(&t).unwrap();
        assert_eq!(moved.frame, b);
        assert_abs_diff_eq!(moved.angular, Vector3::z());
        assert_abs_diff_eq!(moved.linear, Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn cross_of_parallel_motions_vanishes() {
        let f = frames(3);
        let t1 = Twist::new(f[0], f[1], f[2], Vector3::z(), Vector3::zeros());
        let a = t1.cross(&t1).unwrap();
        assert_abs_diff_eq!(a.angular, Vector3::zeros());
        assert_abs_diff_eq!(a.linear, Vector3::zeros());
    }
}
