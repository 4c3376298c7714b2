//! Geometric Jacobians and wrench-column matrices.

use crate::force::Wrench;
use crate::frame::{FrameId, FrameMismatch, check_frame};
use crate::motion::{SpatialAcceleration, Twist};
use crate::transform::Transform;
use nalgebra::{DMatrix, Matrix3xX, Vector3};

/// A 6×n matrix whose columns are twists per unit joint velocity.
///
/// Mapping a joint velocity vector through the Jacobian yields the twist of
/// `body` relative to `base`, expressed in `frame`. The angular and linear
/// 3-row blocks are stored separately.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometricJacobian {
    /// Frame tag identifying the moving body.
    pub body: FrameId,
    /// Frame tag identifying the reference body.
    pub base: FrameId,
    /// Frame the columns are expressed in.
    pub frame: FrameId,
    /// Angular parts of the columns.
    pub angular: Matrix3xX<f64>,
    /// Linear parts of the columns.
    pub linear: Matrix3xX<f64>,
}

impl GeometricJacobian {
    /// Creates a zero Jacobian with `ncols` columns.
    #[must_use]
    pub fn zeros(body: FrameId, base: FrameId, frame: FrameId, ncols: usize) -> Self {
        GeometricJacobian {
            body,
            base,
            frame,
            angular: Matrix3xX::zeros(ncols),
            linear: Matrix3xX::zeros(ncols),
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.angular.ncols()
    }

    /// Sets all columns to zero.
    pub fn fill_zero(&mut self) {
        self.angular.fill(0.0);
        self.linear.fill(0.0);
    }

    /// Overwrites column `i`.
    pub fn set_column(&mut self, i: usize, angular: &Vector3<f64>, linear: &Vector3<f64>) {
        self.angular.column_mut(i).copy_from(angular);
        self.linear.column_mut(i).copy_from(linear);
    }

    /// Adds `scale` times the given column into column `i`.
    pub fn add_column_scaled(
        &mut self,
        i: usize,
        scale: f64,
        angular: &Vector3<f64>,
        linear: &Vector3<f64>,
    ) {
        self.angular.column_mut(i).axpy(scale, angular, 1.0);
        self.linear.column_mut(i).axpy(scale, linear, 1.0);
    }

    /// Returns the angular part of column `i`.
    #[must_use]
    pub fn angular_column(&self, i: usize) -> Vector3<f64> {
        self.angular.column(i).into_owned()
    }

    /// Returns the linear part of column `i`.
    #[must_use]
    pub fn linear_column(&self, i: usize) -> Vector3<f64> {
        self.linear.column(i).into_owned()
    }

    /// Re-expresses every column in `t.to` by the motion adjoint, in place.
    pub fn transform(&mut self, t: &Transform) -> Result<(), FrameMismatch> {
        check_frame(t.from, self.frame)?;
        for i in 0..self.ncols() {
            let angular = t.rotation * self.angular_column(i);
            let linear = t.rotation * self.linear_column(i) + t.translation.cross(&angular);
            self.set_column(i, &angular, &linear);
        }
        self.frame = t.to;
        Ok(())
    }

    /// Maps joint velocities through the Jacobian, producing a twist.
    ///
    /// `coeffs` must have exactly one entry per column.
    #[must_use]
    pub fn twist(&self, coeffs: &[f64]) -> Twist {
        debug_assert_eq!(coeffs.len(), self.ncols());
        let mut angular = Vector3::zeros();
        let mut linear = Vector3::zeros();
        for (i, &c) in coeffs.iter().enumerate() {
            angular.axpy(c, &self.angular_column(i), 1.0);
            linear.axpy(c, &self.linear_column(i), 1.0);
        }
        Twist::new(self.body, self.base, self.frame, angular, linear)
    }

    /// Maps joint accelerations through the Jacobian, producing the
    /// `v̇`-dependent part of a spatial acceleration.
    #[must_use]
    pub fn acceleration(&self, coeffs: &[f64]) -> SpatialAcceleration {
        let twist = self.twist(coeffs);
        SpatialAcceleration::new(self.body, self.base, self.frame, twist.angular, twist.linear)
    }

    /// Projects a wrench onto the columns: `out = Jᵀ · w`.
    pub fn transpose_mul_wrench(&self, w: &Wrench, out: &mut [f64]) -> Result<(), FrameMismatch> {
        check_frame(self.frame, w.frame)?;
        debug_assert_eq!(out.len(), self.ncols());
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.angular_column(i).dot(&w.angular) + self.linear_column(i).dot(&w.linear);
        }
        Ok(())
    }
}

/// A 6×n matrix whose columns are wrenches.
///
/// Used both for constraint wrench subspaces (the wrenches a joint can
/// transmit) and for the momentum columns of the composite-rigid-body
/// algorithm; the two roles share the force-like transform rule.
#[derive(Clone, Debug, PartialEq)]
pub struct WrenchMatrix {
    /// Frame the columns are expressed in.
    pub frame: FrameId,
    /// Torque parts of the columns.
    pub angular: Matrix3xX<f64>,
    /// Force parts of the columns.
    pub linear: Matrix3xX<f64>,
}

impl WrenchMatrix {
    /// Creates a zero wrench matrix with `ncols` columns.
    #[must_use]
    pub fn zeros(frame: FrameId, ncols: usize) -> Self {
        WrenchMatrix {
            frame,
            angular: Matrix3xX::zeros(ncols),
            linear: Matrix3xX::zeros(ncols),
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.angular.ncols()
    }

    /// Overwrites column `i`.
    pub fn set_column(&mut self, i: usize, angular: &Vector3<f64>, linear: &Vector3<f64>) {
        self.angular.column_mut(i).copy_from(angular);
        self.linear.column_mut(i).copy_from(linear);
    }

    /// Returns the torque part of column `i`.
    #[must_use]
    pub fn angular_column(&self, i: usize) -> Vector3<f64> {
        self.angular.column(i).into_owned()
    }

    /// Returns the force part of column `i`.
    #[must_use]
    pub fn linear_column(&self, i: usize) -> Vector3<f64> {
        self.linear.column(i).into_owned()
    }

    /// Re-expresses every column in `t.to` by the force adjoint, in place.
    pub fn transform(&mut self, t: &Transform) -> Result<(), FrameMismatch> {
        check_frame(t.from, self.frame)?;
        for i in 0..self.ncols() {
            let linear = t.rotation * self.linear_column(i);
            let angular = t.rotation * self.angular_column(i) + t.translation.cross(&linear);
            self.set_column(i, &angular, &linear);
        }
        self.frame = t.to;
        Ok(())
    }

    /// Writes the pairing of each wrench column with each Jacobian column
    /// into a block of `out` starting at `(row_offset, 0)`.
    ///
    /// `out[row_offset + r][c] = column_r(self) · column_c(jac)`.
    pub fn transpose_mul_jacobian(
        &self,
        jac: &GeometricJacobian,
        out: &mut DMatrix<f64>,
        row_offset: usize,
    ) -> Result<(), FrameMismatch> {
        check_frame(self.frame, jac.frame)?;
        for r in 0..self.ncols() {
            let t_ang = self.angular_column(r);
            let t_lin = self.linear_column(r);
            for c in 0..jac.ncols() {
                out[(row_offset + r, c)] =
                    t_ang.dot(&jac.angular_column(c)) + t_lin.dot(&jac.linear_column(c));
            }
        }
        Ok(())
    }

    /// Writes the pairing of each wrench column with a spatial acceleration
    /// into `out`.
    pub fn transpose_mul_acceleration(
        &self,
        acc: &SpatialAcceleration,
        out: &mut [f64],
    ) -> Result<(), FrameMismatch> {
        check_frame(self.frame, acc.frame)?;
        debug_assert_eq!(out.len(), self.ncols());
        for (r, slot) in out.iter_mut().enumerate() {
            *slot = self.angular_column(r).dot(&acc.angular) + self.linear_column(r).dot(&acc.linear);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation3;

    #[test]
    fn jacobian_times_velocity_matches_column_sum() {
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let world = FrameId::fresh();
        let mut jac = GeometricJacobian::zeros(body, base, world, 2);
        jac.set_column(0, &Vector3::z(), &Vector3::zeros());
        jac.set_column(1, &Vector3::zeros(), &Vector3::x());
        let twist = jac.twist(&[2.0, -1.0]);
        assert_abs_diff_eq!(twist.angular, Vector3::new(0.0, 0.0, 2.0));
        assert_abs_diff_eq!(twist.linear, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn transpose_wrench_projection_is_power_per_column() {
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let world = FrameId::fresh();
        let mut jac = GeometricJacobian::zeros(body, base, world, 2);
        jac.set_column(0, &Vector3::z(), &Vector3::zeros());
        jac.set_column(1, &Vector3::zeros(), &Vector3::x());
        let w = Wrench::new(world, Vector3::new(0.0, 0.0, 3.0), Vector3::new(5.0, 0.0, 0.0));
        let mut out = [0.0; 2];
        jac.transpose_mul_wrench(&w, &mut out).unwrap();
        assert_abs_diff_eq!(out[0], 3.0);
        assert_abs_diff_eq!(out[1], 5.0);
    }

    #[test]
    fn column_transform_matches_twist_transform() {
        let body = FrameId::fresh();
        let base = FrameId::fresh();
        let a = FrameId::fresh();
        let b = FrameId::fresh();
        let t = Transform::new(
            a,
            b,
            Rotation3::from_euler_angles(0.3, -0.2, 0.8),
            Vector3::new(1.0, -0.5, 0.25),
        );
        let mut jac = GeometricJacobian::zeros(body, base, a, 1);
        jac.set_column(0, &Vector3::new(0.1, 0.7, -0.4), &Vector3::new(-0.3, 0.2, 0.9));
        let reference = jac.twist(&[1.0]).transform(&t).unwrap();
        jac.transform(&t).unwrap();
        let transformed = jac.twist(&[1.0]);
        assert_abs_diff_eq!(transformed.angular, reference.angular, epsilon = 1e-12);
        assert_abs_diff_eq!(transformed.linear, reference.linear, epsilon = 1e-12);
    }
}
