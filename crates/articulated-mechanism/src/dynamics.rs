//! Forward dynamics with loop-joint constraints.
//!
//! Given applied torques and external wrenches, forward dynamics solves
//!
//! ```text
//! [ M   Kᵀ ] [ v̇ ]   [ τ − c ]
//! [ K    0 ] [ λ ] = [   −k  ]
//! ```
//!
//! where `M` comes from the composite rigid-body algorithm, the bias torques
//! `c` from inverse dynamics at zero acceleration, and each loop joint
//! contributes the rows of `K` and `k` that keep its closure constraint
//! satisfied at the acceleration level. The system is solved by a
//! Cholesky-based Schur complement: `M = L Lᵀ`, `A = K M⁻¹ Kᵀ`,
//! `A λ = −(K M⁻¹ (τ − c) + k)`, `v̇ = M⁻¹ (τ − c + Kᵀ λ)`.
//!
//! Constraint rows that are identically unloaded in the current
//! configuration (zero rows of `K`, as produced by planar mechanisms with
//! spatial loop joints) are excluded from the Schur complement and get zero
//! multipliers; a Schur complement that is singular beyond such rows is
//! reported as a redundant constraint.

use crate::errors::AlgorithmError;
use crate::inverse_dynamics::rnea;
use crate::kinematics::geometric_jacobian;
use crate::mass_matrix::mass_matrix;
use crate::result::DynamicsResult;
use crate::state::MechanismState;
use articulated_spatial::force::Wrench;
use articulated_spatial::frame::check_frame;
use nalgebra::{Cholesky, DMatrix, DVector};
use std::mem;

/// Computes the forward dynamics of the mechanism: joint accelerations and
/// loop-constraint multipliers for the given torques and external wrenches.
///
/// # Arguments
///
/// * `state` - The mechanism state; kinematic caches are refreshed as
///   needed.
/// * `tau` - Applied joint torques, of size `nv`.
/// * `external_wrenches` - External wrenches keyed by body index, expressed
///   in the root frame.
/// * `result` - Output and scratch buffers; on success `result.vd` holds the
///   accelerations, `result.lambda` the multipliers, and
///   `result.mass_matrix` / `result.dynamics_bias` the intermediate
///   quantities.
pub fn dynamics(
    state: &mut MechanismState,
    tau: &DVector<f64>,
    external_wrenches: &[(usize, Wrench)],
    result: &mut DynamicsResult,
) -> Result<(), AlgorithmError> {
    state.ensure_fresh()?;
    let mech = state.mechanism();
    let nv = mech.nv();
    let nc = mech.nc();
    if tau.len() != nv {
        return Err(AlgorithmError::DimensionMismatch {
            name: "tau",
            expected: nv,
            got: tau.len(),
        });
    }
    if !result.fits(mech) {
        return Err(AlgorithmError::DimensionMismatch {
            name: "result",
            expected: nv,
            got: result.vd.len(),
        });
    }
    for (body, wrench) in external_wrenches {
        if *body >= mech.nbodies() {
            return Err(AlgorithmError::UnknownBody(*body));
        }
        check_frame(mech.root_frame(), wrench.frame)?;
    }

    mass_matrix(state, &mut result.mass_matrix)?;
    state.update_bias_accelerations()?;

    // Bias torques c(q, v): inverse dynamics at zero acceleration, external
    // wrenches included.
    result.vd.fill(0.0);
    rnea(
        state,
        &result.vd,
        external_wrenches,
        &mut result.dynamics_bias,
        &mut result.joint_wrenches,
        &mut result.accelerations,
    )?;
    result.rhs.copy_from(tau);
    result.rhs -= &result.dynamics_bias;

    if nc > 0 {
        assemble_loop_constraints(state, result)?;
    }

    result.chol_scratch.copy_from(&result.mass_matrix);
    let chol = match Cholesky::new(mem::replace(&mut result.chol_scratch, DMatrix::zeros(0, 0))) {
        Some(chol) => chol,
        None => {
            result.chol_scratch = DMatrix::zeros(nv, nv);
            return Err(AlgorithmError::SingularInertia);
        }
    };

    if nc == 0 {
        result.vd.copy_from(&result.rhs);
        chol.solve_mut(&mut result.vd);
        result.chol_scratch = chol.unpack();
        return Ok(());
    }

    // Schur complement A = K M⁻¹ Kᵀ over the active constraint rows.
    result.minv_rhs.copy_from(&result.rhs);
    chol.solve_mut(&mut result.minv_rhs);
    for r in 0..nc {
        for c in 0..nv {
            result.minv_kt[(c, r)] = result.constraint_jacobian[(r, c)];
        }
    }
    chol.solve_mut(&mut result.minv_kt);
    result
        .schur
        .gemm(1.0, &result.constraint_jacobian, &result.minv_kt, 0.0);
    for r in 0..nc {
        if !result.active_rows[r] {
            for j in 0..nc {
                result.schur[(r, j)] = 0.0;
                result.schur[(j, r)] = 0.0;
            }
            result.schur[(r, r)] = 1.0;
        }
    }

    result
        .lambda
        .gemv(1.0, &result.constraint_jacobian, &result.minv_rhs, 0.0);
    result.lambda += &result.constraint_bias;
    let schur_chol = match Cholesky::new(mem::replace(&mut result.schur, DMatrix::zeros(0, 0))) {
        Some(chol) => chol,
        None => {
            result.chol_scratch = chol.unpack();
            result.schur = DMatrix::zeros(nc, nc);
            return Err(AlgorithmError::RedundantConstraint);
        }
    };
    schur_chol.solve_mut(&mut result.lambda);
    result.lambda *= -1.0;
    result.schur = schur_chol.unpack();

    // v̇ = M⁻¹ (τ − c + Kᵀ λ)
    result
        .rhs
        .gemv_tr(1.0, &result.constraint_jacobian, &result.lambda, 1.0);
    result.vd.copy_from(&result.rhs);
    chol.solve_mut(&mut result.vd);
    result.chol_scratch = chol.unpack();
    Ok(())
}

/// Assembles the constraint Jacobian `K` and bias `k` of every loop joint.
///
/// For a loop joint with constraint wrench subspace `T` (expressed in the
/// root frame), the rows are `K = Tᵀ J(succ, pred)` and the bias is
/// `k = Tᵀ (bias(succ) − bias(pred) − twist(succ) × twist(succ, pred))`,
/// so that the acceleration-level constraint reads `K v̇ + k = 0`.
fn assemble_loop_constraints(
    state: &mut MechanismState,
    result: &mut DynamicsResult,
) -> Result<(), AlgorithmError> {
    let mech = state.mechanism();
    let nv = mech.nv();
    let nc = mech.nc();
    state.update_constraint_subspaces()?;
    result.constraint_jacobian.fill(0.0);
    result.constraint_bias.fill(0.0);

    for (l, joint) in mech.loop_joints().iter().enumerate() {
        geometric_jacobian(
            state,
            joint.successor,
            joint.predecessor,
            &mut result.path_jacobian,
        )?;
        let subspace = &state.constraint_subspaces()[l];
        subspace.transpose_mul_jacobian(
            &result.path_jacobian,
            &mut result.constraint_jacobian,
            joint.c_range.start,
        )?;

        let twists = state.twists_wrt_world();
        let biases = state.bias_accelerations();
        let relative_twist = twists[joint.successor].sub(&twists[joint.predecessor])?;
        let bias_rel = biases[joint.successor].sub(&biases[joint.predecessor])?;
        // Derivative of the (body-fixed) wrench subspace columns, folded
        // onto the twist side of the pairing.
        let correction = (-twists[joint.successor]).cross(&relative_twist)?;
        let total = bias_rel.add(&correction)?;
        subspace.transpose_mul_acceleration(
            &total,
            &mut result.constraint_bias.as_mut_slice()[joint.c_range.clone()],
        )?;
    }

    if result.baumgarte_gain != 0.0 {
        let gain = result.baumgarte_gain;
        result
            .constraint_bias
            .gemv(gain, &result.constraint_jacobian, state.velocity(), 1.0);
    }

    // Rows with no leverage in the current configuration (planar mechanisms
    // with spatial loop joints produce them structurally) are excluded from
    // the solve and get zero multipliers.
    let mut max_entry = 0.0f64;
    for r in 0..nc {
        for c in 0..nv {
            max_entry = max_entry.max(result.constraint_jacobian[(r, c)].abs());
        }
    }
    let tol = 1e-10 * max_entry.max(1.0);
    for r in 0..nc {
        let mut norm_sq = 0.0;
        for c in 0..nv {
            let entry = result.constraint_jacobian[(r, c)];
            norm_sq += entry * entry;
        }
        let active = norm_sq.sqrt() > tol;
        result.active_rows[r] = active;
        if !active {
            if result.constraint_bias[r].abs() > 1e-6 {
                return Err(AlgorithmError::RedundantConstraint);
            }
            for c in 0..nv {
                result.constraint_jacobian[(r, c)] = 0.0;
            }
            result.constraint_bias[r] = 0.0;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::inverse_dynamics::inverse_dynamics;
    use crate::mechanism::{Joint, Mechanism, ROOT_ID, STANDARD_GRAVITY};
    use articulated_inertia::inertia::SpatialInertia;
    use articulated_joint::joint::JointWrapper;
    use articulated_joint::revolute::JointModelRevolute;
    use articulated_spatial::frame::FrameId;
    use articulated_spatial::transform::Transform;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn pendulum() -> Mechanism {
        let mut mechanism =
            Mechanism::new("pendulum", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let frame = FrameId::fresh();
        let body = RigidBody::new(
            "link",
            SpatialInertia::from_point_mass(frame, 1.0, Vector3::new(0.0, 0.0, -1.0)).unwrap(),
        );
        let joint = Joint::new("shoulder", JointWrapper::revolute(JointModelRevolute::new_ry()));
        let joint_pose = Transform::identity(joint.frame_before, mechanism.root_frame());
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        mechanism
            .attach(ROOT_ID, body, joint, joint_pose, successor_pose)
            .unwrap();
        mechanism
    }

    #[test]
    fn hanging_equilibrium_does_not_accelerate() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        let mut result = DynamicsResult::new(&mechanism);
        let tau = DVector::zeros(1);
        dynamics(&mut state, &tau, &[], &mut result).unwrap();
        assert_relative_eq!(result.vd[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn pendulum_acceleration_matches_the_textbook_equation() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        let mut result = DynamicsResult::new(&mechanism);
        let q = 0.6;
        state.set_joint_configuration(0, &[q]).unwrap();
        let tau = DVector::zeros(1);
        dynamics(&mut state, &tau, &[], &mut result).unwrap();
        // Point-mass pendulum: θ̈ = −(g/l)·sin θ.
        assert_relative_eq!(result.vd[0], -9.81 * q.sin(), epsilon = 1e-9);
    }

    #[test]
    fn forward_then_inverse_dynamics_round_trips() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        let mut result = DynamicsResult::new(&mechanism);
        state.set_joint_configuration(0, &[0.4]).unwrap();
        state.set_joint_velocity(0, &[-1.2]).unwrap();
        let tau = DVector::from_row_slice(&[2.5]);
        dynamics(&mut state, &tau, &[], &mut result).unwrap();
        let vd = result.vd.clone();
        let mut tau_back = DVector::zeros(1);
        inverse_dynamics(&mut state, &vd, &[], &mut tau_back, &mut result).unwrap();
        assert_relative_eq!(tau_back[0], tau[0], epsilon = 1e-10);
    }
}
