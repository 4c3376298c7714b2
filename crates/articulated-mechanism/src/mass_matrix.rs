//! Joint-space mass matrix via the Composite Rigid-Body Algorithm (CRBA).

use crate::errors::AlgorithmError;
use crate::mechanism::ROOT_ID;
use crate::state::MechanismState;
use articulated_spatial::motion::Twist;
use nalgebra::{DMatrix, Vector3};

/// Computes the symmetric positive-definite joint-space mass matrix into
/// `out`.
///
/// For each tree joint the momentum columns `F = I^c · S` of its composite
/// inertia are paired against the motion subspaces of all its ancestors;
/// symmetric blocks are filled by reflection. Loop joints contribute nothing
/// here; they enter the dynamics through the constraint Jacobian instead.
///
/// # Arguments
///
/// * `state` - The mechanism state; transform, motion subspace, and
///   composite inertia caches are refreshed as needed.
/// * `out` - Output buffer, `nv × nv`.
pub fn mass_matrix(state: &mut MechanismState, out: &mut DMatrix<f64>) -> Result<(), AlgorithmError> {
    state.ensure_fresh()?;
    let nv = state.mechanism().nv();
    if out.nrows() != nv || out.ncols() != nv {
        return Err(AlgorithmError::DimensionMismatch {
            name: "out",
            expected: nv,
            got: out.nrows(),
        });
    }
    state.update_motion_subspaces()?;
    state.update_crb_inertias()?;

    let mech = state.mechanism();
    let subspaces = state.motion_subspaces();
    let composites = state.crb_inertias();
    out.fill(0.0);

    for (i, joint) in mech.tree_joints().iter().enumerate() {
        let nv_i = joint.v_range.len();
        if nv_i == 0 {
            continue;
        }
        // Momentum columns F = I^c(successor) · S_i, in world frame. nv ≤ 6
        // always, so the columns fit on the stack.
        let composite = &composites[joint.successor];
        let s_i = &subspaces[i];
        let mut f_ang = [Vector3::zeros(); 6];
        let mut f_lin = [Vector3::zeros(); 6];
        for c in 0..nv_i {
            let column = Twist::new(
                s_i.body,
                s_i.base,
                s_i.frame,
                s_i.angular_column(c),
                s_i.linear_column(c),
            );
            let h = composite.mul_twist(&column)?;
            f_ang[c] = h.angular;
            f_lin[c] = h.linear;
        }

        // Walk the ancestors of the successor (starting with joint i
        // itself), filling M[range(k), range(i)] = S_kᵀ F and its mirror.
        let mut body = joint.successor;
        while body != ROOT_ID {
            let k = body - 1;
            let ancestor = &mech.tree_joints()[k];
            let s_k = &subspaces[k];
            for r in 0..ancestor.v_range.len() {
                let s_ang = s_k.angular_column(r);
                let s_lin = s_k.linear_column(r);
                for c in 0..nv_i {
                    let value = s_ang.dot(&f_ang[c]) + s_lin.dot(&f_lin[c]);
                    out[(ancestor.v_range.start + r, joint.v_range.start + c)] = value;
                    out[(joint.v_range.start + c, ancestor.v_range.start + r)] = value;
                }
            }
            body = ancestor.predecessor;
        }
    }
    Ok(())
}
