//! [`DynamicsResult`]: caller-owned output and scratch buffers for the
//! dynamics algorithms.

use crate::mechanism::Mechanism;
use articulated_spatial::force::Wrench;
use articulated_spatial::jacobian::GeometricJacobian;
use articulated_spatial::motion::SpatialAcceleration;
use nalgebra::{DMatrix, DVector};

/// Output buffers for the dynamics algorithms, plus the scratch storage the
/// constrained solve needs.
///
/// A result is sized once from a mechanism and reused across evaluations;
/// after construction the algorithms perform no allocation (the Cholesky
/// factorizations operate on buffers that are moved out of and back into
/// this struct).
pub struct DynamicsResult {
    /// Joint-space mass matrix, `nv × nv`.
    pub mass_matrix: DMatrix<f64>,
    /// Bias torques `c(q, v)`: inverse dynamics at zero acceleration.
    pub dynamics_bias: DVector<f64>,
    /// Joint accelerations computed by forward dynamics.
    pub vd: DVector<f64>,
    /// Loop-constraint Lagrange multipliers.
    pub lambda: DVector<f64>,
    /// Per-body joint wrenches (scratch for the Newton–Euler sweeps).
    pub joint_wrenches: Vec<Wrench>,
    /// Per-body spatial accelerations (scratch for the Newton–Euler sweeps).
    pub accelerations: Vec<SpatialAcceleration>,
    /// Velocity-level Baumgarte stabilization gain applied to the
    /// loop-constraint bias. Default 0 (no stabilization).
    pub baumgarte_gain: f64,
    pub(crate) constraint_jacobian: DMatrix<f64>,
    pub(crate) constraint_bias: DVector<f64>,
    pub(crate) path_jacobian: GeometricJacobian,
    pub(crate) chol_scratch: DMatrix<f64>,
    pub(crate) schur: DMatrix<f64>,
    pub(crate) minv_kt: DMatrix<f64>,
    pub(crate) rhs: DVector<f64>,
    pub(crate) minv_rhs: DVector<f64>,
    pub(crate) active_rows: Vec<bool>,
}

impl DynamicsResult {
    /// Creates result buffers sized for the given mechanism.
    #[must_use]
    pub fn new(mechanism: &Mechanism) -> Self {
        let nv = mechanism.nv();
        let nc = mechanism.nc();
        let nbodies = mechanism.nbodies();
        let world = mechanism.root_frame();
        DynamicsResult {
            mass_matrix: DMatrix::zeros(nv, nv),
            dynamics_bias: DVector::zeros(nv),
            vd: DVector::zeros(nv),
            lambda: DVector::zeros(nc),
            joint_wrenches: vec![Wrench::zero(world); nbodies],
            accelerations: vec![SpatialAcceleration::zero(world, world, world); nbodies],
            baumgarte_gain: 0.0,
            constraint_jacobian: DMatrix::zeros(nc, nv),
            constraint_bias: DVector::zeros(nc),
            path_jacobian: GeometricJacobian::zeros(world, world, world, nv),
            chol_scratch: DMatrix::zeros(nv, nv),
            schur: DMatrix::zeros(nc, nc),
            minv_kt: DMatrix::zeros(nv, nc),
            rhs: DVector::zeros(nv),
            minv_rhs: DVector::zeros(nv),
            active_rows: vec![true; nc],
        }
    }

    /// Returns the loop-constraint Jacobian `K` assembled by the last
    /// forward-dynamics call.
    #[must_use]
    pub fn constraint_jacobian(&self) -> &DMatrix<f64> {
        &self.constraint_jacobian
    }

    /// Returns the loop-constraint bias `k` assembled by the last
    /// forward-dynamics call (including the stabilization term, if any).
    #[must_use]
    pub fn constraint_bias(&self) -> &DVector<f64> {
        &self.constraint_bias
    }

    /// True when the buffers were sized for the given mechanism.
    #[must_use]
    pub fn fits(&self, mechanism: &Mechanism) -> bool {
        self.vd.len() == mechanism.nv()
            && self.lambda.len() == mechanism.nc()
            && self.joint_wrenches.len() == mechanism.nbodies()
    }
}
