//! Rigid transforms between annotated frames.

use crate::frame::{FrameId, FrameMismatch, check_frame};
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Point3, Rotation3, UnitQuaternion, Vector3};
use std::fmt::Display;

/// A rigid transform mapping coordinates from frame `from` to frame `to`.
///
/// The transform combines a rotation matrix $R \in \text{SO}(3)$ and a
/// translation vector $t \in \mathbb{R}^3$: a point with coordinates $x$ in
/// `from` has coordinates $R x + t$ in `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Rotation part, mapping `from` directions to `to` directions.
    pub rotation: Rotation3<f64>,
    /// Coordinates of the origin of `from` expressed in `to`.
    pub translation: Vector3<f64>,
    /// Source frame.
    pub from: FrameId,
    /// Destination frame.
    pub to: FrameId,
}

impl Transform {
    /// Creates a new transform from its rotation and translation parts.
    #[must_use]
    pub fn new(from: FrameId, to: FrameId, rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Transform {
            rotation,
            translation,
            from,
            to,
        }
    }

    /// Creates an identity transform between two coincident frames.
    #[must_use]
    pub fn identity(from: FrameId, to: FrameId) -> Self {
        Transform {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
            from,
            to,
        }
    }

    /// Creates a pure translation.
    #[must_use]
    pub fn translation(from: FrameId, to: FrameId, translation: Vector3<f64>) -> Self {
        Transform {
            rotation: Rotation3::identity(),
            translation,
            from,
            to,
        }
    }

    /// Creates a pure rotation.
    #[must_use]
    pub fn rotation(from: FrameId, to: FrameId, rotation: Rotation3<f64>) -> Self {
        Transform {
            rotation,
            translation: Vector3::zeros(),
            from,
            to,
        }
    }

    /// Composes two transforms: `self (b→c) ∘ rhs (a→b) = (a→c)`.
    ///
    /// Fails with [`FrameMismatch`] unless the inner frames agree.
    pub fn compose(&self, rhs: &Transform) -> Result<Transform, FrameMismatch> {
        check_frame(self.from, rhs.to)?;
        Ok(Transform {
            rotation: self.rotation * rhs.rotation,
            translation: self.translation + self.rotation * rhs.translation,
            from: rhs.from,
            to: self.to,
        })
    }

    /// Returns the inverse transform, swapping `from` and `to`.
    #[must_use]
    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            rotation,
            translation: -(rotation * self.translation),
            from: self.to,
            to: self.from,
        }
    }

    /// Maps a point with coordinates in `from` to coordinates in `to`.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Maps a free vector with coordinates in `from` to coordinates in `to`.
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// Re-orthonormalizes the rotation part.
    ///
    /// Long chains of compositions let the rotation drift away from SO(3);
    /// routine operations never renormalize, this call does so explicitly.
    pub fn renormalize(&mut self) {
        let q = UnitQuaternion::from_rotation_matrix(&self.rotation);
        self.rotation = q.to_rotation_matrix();
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.rotation.matrix();
        writeln!(f, "Transform from {} to {}:", self.from, self.to)?;
        for i in 0..3 {
            writeln!(
                f,
                "  [ {:>+9.5} {:>+9.5} {:>+9.5} | {:>+9.5} ]",
                r[(i, 0)],
                r[(i, 1)],
                r[(i, 2)],
                self.translation[i]
            )?;
        }
        Ok(())
    }
}

impl AbsDiffEq for Transform {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.rotation.abs_diff_eq(&other.rotation, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
    }
}

impl RelativeEq for Transform {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.rotation.relative_eq(&other.rotation, epsilon, max_relative)
            && self.translation.relative_eq(&other.translation, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn compose_checks_inner_frames() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let c = FrameId::fresh();
        let ab = Transform::translation(a, b, Vector3::new(1.0, 0.0, 0.0));
        let bc = Transform::translation(b, c, Vector3::new(0.0, 2.0, 0.0));
        let ac = bc.compose(&ab).unwrap();
        assert_eq!(ac.from, a);
        assert_eq!(ac.to, c);
        assert_abs_diff_eq!(ac.translation, Vector3::new(1.0, 2.0, 0.0));
        assert!(ab.compose(&bc).is_err());
    }

    #[test]
    fn inverse_round_trip() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let t = Transform::new(
            a,
            b,
            Rotation3::from_euler_angles(0.2, -0.7, 1.1),
            Vector3::new(0.3, -1.2, 0.5),
        );
        let round_trip = t.compose(&t.inverse()).unwrap();
        assert_eq!(round_trip.from, b);
        assert_eq!(round_trip.to, b);
        assert_abs_diff_eq!(round_trip, Transform::identity(b, b), epsilon = 1e-12);
    }

    #[test]
    fn point_action_matches_composition() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let t = Transform::new(
            a,
            b,
            Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
            Vector3::new(1.0, 0.0, 0.0),
        );
        let p = Point3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(t.transform_point(&p), Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
