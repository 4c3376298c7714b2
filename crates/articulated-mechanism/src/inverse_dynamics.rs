//! Inverse dynamics: the Recursive Newton–Euler Algorithm (RNEA).
//!
//! Inverse dynamics computes the joint torques required to achieve a given
//! motion: $\tau = \text{ID}(q, v, \dot{v}, f^{ext})$. The algorithm is
//! $O(n)$ in the number of joints and runs in two passes over the spanning
//! tree: a forward pass accumulating spatial accelerations and net body
//! wrenches, and a backward pass accumulating joint wrenches and projecting
//! them onto the motion subspaces.
//!
//! Gravity is incorporated with the standard trick of giving the root body
//! the acceleration `−g`, which makes every net wrench include the weight of
//! its subtree without an explicit gravity term.

use crate::errors::AlgorithmError;
use crate::mechanism::ROOT_ID;
use crate::result::DynamicsResult;
use crate::state::MechanismState;
use articulated_spatial::force::Wrench;
use articulated_spatial::frame::check_frame;
use articulated_spatial::motion::SpatialAcceleration;
use nalgebra::{DVector, Vector3};

/// Computes the inverse dynamics of the mechanism.
///
/// # Arguments
///
/// * `state` - The mechanism state; its kinematic caches are refreshed as
///   needed.
/// * `vd` - The desired joint accelerations, of size `nv`.
/// * `external_wrenches` - External wrenches keyed by body index, expressed
///   in the root frame; bodies not listed get zero.
/// * `tau` - Output buffer for the joint torques, of size `nv`.
/// * `result` - Provides the per-body wrench and acceleration scratch.
///
/// # Returns
/// * `Ok(())` on success; `tau` holds the torques and
///   `result.joint_wrenches` the wrench transmitted across each tree joint.
/// * An [`AlgorithmError`] on dimension, frame, or staleness violations.
pub fn inverse_dynamics(
    state: &mut MechanismState,
    vd: &DVector<f64>,
    external_wrenches: &[(usize, Wrench)],
    tau: &mut DVector<f64>,
    result: &mut DynamicsResult,
) -> Result<(), AlgorithmError> {
    state.ensure_fresh()?;
    let mech = state.mechanism();
    let nv = mech.nv();
    if vd.len() != nv {
        return Err(AlgorithmError::DimensionMismatch {
            name: "vd",
            expected: nv,
            got: vd.len(),
        });
    }
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

    state.update_motion_subspaces()?;
    state.update_bias_accelerations()?;
    state.update_inertias()?;
    rnea(
        state,
        vd,
        external_wrenches,
        tau,
        &mut result.joint_wrenches,
        &mut result.accelerations,
    )
}

/// The two Newton–Euler sweeps over refreshed caches.
///
/// Callers must have refreshed the motion subspace, twist, bias
/// acceleration, and world inertia groups.
pub(crate) fn rnea(
    state: &MechanismState,
    vd: &DVector<f64>,
    external_wrenches: &[(usize, Wrench)],
    tau: &mut DVector<f64>,
    joint_wrenches: &mut [Wrench],
    accelerations: &mut [SpatialAcceleration],
) -> Result<(), AlgorithmError> {
    let mech = state.mechanism();
    let world = mech.root_frame();
    let twists = state.twists_wrt_world();
    let biases = state.bias_accelerations();
    let inertias = state.inertias_world();
    let subspaces = state.motion_subspaces();

    // Forward pass: spatial accelerations and net wrenches.
    accelerations[ROOT_ID] =
        SpatialAcceleration::new(world, world, world, Vector3::zeros(), -mech.gravity);
    joint_wrenches[ROOT_ID] = Wrench::zero(world);
    for (i, joint) in mech.tree_joints().iter().enumerate() {
        let body = joint.successor;
        let parent = joint.predecessor;
        let vd_term = subspaces[i].acceleration(&vd.as_slice()[joint.v_range.clone()]);
        let bias_term = biases[body].sub(&biases[parent])?;
        accelerations[body] = vd_term.add(&bias_term)?.add(&accelerations[parent])?;

        let momentum = inertias[body].mul_twist(&twists[body])?;
        let net = inertias[body]
            .mul_acceleration(&accelerations[body])?
            .add(&twists[body].cross_momentum(&momentum)?)?;
        joint_wrenches[body] = net;
    }

    for (body, external) in external_wrenches {
        if *body == ROOT_ID {
            continue;
        }
        joint_wrenches[*body] = joint_wrenches[*body].sub(external)?;
    }

    // Backward pass: accumulate wrenches up the tree and project onto the
    // motion subspaces.
    for (i, joint) in mech.tree_joints().iter().enumerate().rev() {
        let body = joint.successor;
        subspaces[i].transpose_mul_wrench(
            &joint_wrenches[body],
            &mut tau.as_mut_slice()[joint.v_range.clone()],
        )?;
        let parent = joint.predecessor;
        if parent != ROOT_ID {
            joint_wrenches[parent] = joint_wrenches[parent].add(&joint_wrenches[body])?;
        }
    }
    Ok(())
}
