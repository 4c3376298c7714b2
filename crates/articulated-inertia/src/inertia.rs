//! The spatial inertia type and its operations.

use articulated_spatial::force::{Momentum, Wrench};
use articulated_spatial::frame::{FrameId, FrameMismatch, check_frame};
use articulated_spatial::motion::{SpatialAcceleration, Twist};
use articulated_spatial::transform::Transform;
use nalgebra::{Matrix3, Vector3};

/// Spatial inertia of a rigid body, expressed in a body-fixed frame.
///
/// The representation stores the mass, the mass-weighted center of mass
/// `cross_part = mass · com`, and the rotational inertia `moment` taken
/// **about the origin of `frame`** (not about the center of mass). With this
/// choice inertias expressed in a common frame add componentwise, which is
/// what composite-rigid-body accumulation and fixed-joint merging need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialInertia {
    /// Frame the inertia is expressed in.
    pub frame: FrameId,
    /// Mass of the body.
    pub mass: f64,
    /// Mass times the center of mass position.
    pub cross_part: Vector3<f64>,
    /// Rotational inertia about the origin of `frame`.
    pub moment: Matrix3<f64>,
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v[2], v[1], v[2], 0.0, -v[0], -v[1], v[0], 0.0)
}

impl SpatialInertia {
    /// Creates a new spatial inertia.
    ///
    /// # Arguments
    ///
    /// * `frame` - The body-fixed frame the inertia is expressed in.
    /// * `mass` - The mass of the body.
    /// * `com` - The center of mass, expressed in `frame`.
    /// * `moment` - The rotational inertia about the origin of `frame`.
    #[must_use]
    pub fn new(frame: FrameId, mass: f64, com: Vector3<f64>, moment: Matrix3<f64>) -> Self {
        SpatialInertia {
            frame,
            mass,
            cross_part: mass * com,
            moment,
        }
    }

    /// The zero inertia (massless body).
    #[must_use]
    pub fn zero(frame: FrameId) -> Self {
        SpatialInertia {
            frame,
            mass: 0.0,
            cross_part: Vector3::zeros(),
            moment: Matrix3::zeros(),
        }
    }

    /// Spatial inertia of a homogeneous solid ellipsoid centered at the
    /// origin of `frame`, with the given semi-axis lengths.
    pub fn from_solid_ellipsoid(
        frame: FrameId,
        mass: f64,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<Self, InertiaError> {
        for (name, value) in [("mass", mass), ("x", x), ("y", y), ("z", z)] {
            if value <= 0.0 {
                return Err(InertiaError::InvalidParameter(name.to_string()));
            }
        }
        let a = mass * (y * y + z * z) / 5.0;
        let b = mass * (x * x + z * z) / 5.0;
        let c = mass * (x * x + y * y) / 5.0;
        Ok(SpatialInertia::new(
            frame,
            mass,
            Vector3::zeros(),
            Matrix3::from_diagonal(&Vector3::new(a, b, c)),
        ))
    }

    /// Spatial inertia of a homogeneous solid sphere centered at the origin
    /// of `frame`.
    pub fn from_solid_sphere(frame: FrameId, mass: f64, radius: f64) -> Result<Self, InertiaError> {
        SpatialInertia::from_solid_ellipsoid(frame, mass, radius, radius, radius)
    }

    /// Spatial inertia of a point mass at `position`.
    pub fn from_point_mass(
        frame: FrameId,
        mass: f64,
        position: Vector3<f64>,
    ) -> Result<Self, InertiaError> {
        if mass <= 0.0 {
            return Err(InertiaError::InvalidParameter("mass".to_string()));
        }
        let p = skew(&position);
        Ok(SpatialInertia {
            frame,
            mass,
            cross_part: mass * position,
            moment: -mass * p * p,
        })
    }

    /// Returns the center of mass, expressed in `frame`.
    #[must_use]
    pub fn center_of_mass(&self) -> Vector3<f64> {
        if self.mass == 0.0 {
            Vector3::zeros()
        } else {
            self.cross_part / self.mass
        }
    }

    /// Componentwise sum of two inertias expressed in the same frame.
    pub fn add(&self, rhs: &SpatialInertia) -> Result<SpatialInertia, FrameMismatch> {
        check_frame(self.frame, rhs.frame)?;
        Ok(SpatialInertia {
            frame: self.frame,
            mass: self.mass + rhs.mass,
            cross_part: self.cross_part + rhs.cross_part,
            moment: self.moment + rhs.moment,
        })
    }

    /// Re-expresses the inertia in `t.to`.
    ///
    /// The moment is carried to the new origin with the exact parallel-axis
    /// terms, so the physical body described is unchanged.
    pub fn transform(&self, t: &Transform) -> Result<SpatialInertia, FrameMismatch> {
        check_frame(t.from, self.frame)?;
        let r = t.rotation.matrix();
        let p = t.translation;
        let c_rotated = t.rotation * self.cross_part;
        let cross_part = c_rotated + self.mass * p;
        let moment =
            r * self.moment * r.transpose() - skew(&c_rotated) * skew(&p) - skew(&p) * skew(&cross_part);
        Ok(SpatialInertia {
            frame: t.to,
            mass: self.mass,
            cross_part,
            moment,
        })
    }

    /// Applies the inertia to a twist, producing the body's momentum.
    pub fn mul_twist(&self, twist: &Twist) -> Result<Momentum, FrameMismatch> {
        check_frame(self.frame, twist.frame)?;
        Ok(Momentum {
            frame: self.frame,
            angular: self.moment * twist.angular + self.cross_part.cross(&twist.linear),
            linear: self.mass * twist.linear - self.cross_part.cross(&twist.angular),
        })
    }

    /// Applies the inertia to a spatial acceleration, producing a wrench.
    pub fn mul_acceleration(&self, acc: &SpatialAcceleration) -> Result<Wrench, FrameMismatch> {
        check_frame(self.frame, acc.frame)?;
        Ok(Wrench {
            frame: self.frame,
            angular: self.moment * acc.angular + self.cross_part.cross(&acc.linear),
            linear: self.mass * acc.linear - self.cross_part.cross(&acc.angular),
        })
    }

    /// Kinetic energy of the body moving with `twist`.
    pub fn kinetic_energy(&self, twist: &Twist) -> Result<f64, FrameMismatch> {
        let h = self.mul_twist(twist)?;
        Ok(0.5 * h.dot(twist)?)
    }
}

/// An error in the parameters of an inertia constructor.
#[derive(Debug)]
pub enum InertiaError {
    /// A parameter that must be positive was not.
    InvalidParameter(String),
}

impl std::fmt::Display for InertiaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InertiaError::InvalidParameter(param) => {
                write!(f, "Invalid parameter: '{}' must be positive.", param)
            }
        }
    }
}

impl std::error::Error for InertiaError {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation3;

    #[test]
    fn invalid_parameters_are_rejected() {
        let frame = FrameId::fresh();
        assert!(SpatialInertia::from_solid_sphere(frame, -1.0, 0.5).is_err());
        assert!(SpatialInertia::from_solid_ellipsoid(frame, 1.0, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn sphere_momentum_of_pure_rotation() {
        let frame = FrameId::fresh();
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let inertia = SpatialInertia::from_solid_sphere(frame, 2.5, 1.0).unwrap();
        let twist = Twist::new(body, base, frame, Vector3::z(), Vector3::zeros());
        let h = inertia.mul_twist(&twist).unwrap();
        // Solid sphere: I = 2 m r² / 5.
        assert_abs_diff_eq!(h.angular, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(h.linear, Vector3::zeros());
    }

    #[test]
    fn point_mass_transform_matches_direct_construction() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let offset = Vector3::new(0.3, -0.8, 1.2);
        let at_origin = SpatialInertia::from_point_mass(a, 2.0, Vector3::zeros()).unwrap();
        let t = Transform::translation(a, b, offset);
        let moved = at_origin.transform(&t).unwrap();
        let direct = SpatialInertia::from_point_mass(b, 2.0, offset).unwrap();
        assert_abs_diff_eq!(moved.mass, direct.mass);
        assert_abs_diff_eq!(moved.cross_part, direct.cross_part, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.moment, direct.moment, epsilon = 1e-12);
    }

    #[test]
    fn transform_preserves_kinetic_energy() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let inertia = SpatialInertia::new(
            a,
            1.7,
            Vector3::new(0.1, 0.2, -0.3),
            Matrix3::from_diagonal(&Vector3::new(0.4, 0.5, 0.6)),
        );
        let twist = Twist::new(
            body,
            base,
            a,
            Vector3::new(0.3, -0.1, 0.9),
            Vector3::new(-0.5, 0.8, 0.2),
        );
        let t = Transform::new(
            a,
            b,
            Rotation3::from_euler_angles(1.0, -0.4, 0.2),
            Vector3::new(0.7, 0.1, -0.9),
        );
        let ke_before = inertia.kinetic_energy(&twist).unwrap();
        let ke_after = inertia
            .transform(&t)
            .unwrap()
            .kinetic_energy(&twist.transform(&t).unwrap())
            .unwrap();
        assert_abs_diff_eq!(ke_before, ke_after, epsilon = 1e-12);
    }

    #[test]
    fn momentum_commutes_with_frame_change() {
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let inertia = SpatialInertia::new(
            a,
            0.9,
            Vector3::new(-0.2, 0.4, 0.1),
            Matrix3::from_diagonal(&Vector3::new(0.2, 0.3, 0.25)),
        );
        let twist = Twist::new(
            body,
            base,
            a,
            Vector3::new(0.6, 0.2, -0.4),
            Vector3::new(0.1, -0.7, 0.3),
        );
        let t = Transform::new(
            a,
            b,
            Rotation3::from_euler_angles(-0.3, 0.9, 0.5),
            Vector3::new(-1.1, 0.4, 0.6),
        );
        let h_then_transform = inertia.mul_twist(&twist).unwrap().transform(&t).unwrap();
        let transform_then_h = inertia
            .transform(&t)
            .unwrap()
            .mul_twist(&twist.transform(&t).unwrap())
            .unwrap();
        assert_abs_diff_eq!(h_then_transform.angular, transform_then_h.angular, epsilon = 1e-12);
        assert_abs_diff_eq!(h_then_transform.linear, transform_then_h.linear, epsilon = 1e-12);
    }
}
