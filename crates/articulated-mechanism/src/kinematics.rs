//! Kinematic queries built on the state cache: relative Jacobians and the
//! center of mass.
//!
//! Frame and twist queries (`transform_to_root`, `relative_transform`,
//! `twist_wrt_world`, `relative_twist`) live on
//! [`MechanismState`](crate::state::MechanismState) itself; this module
//! hosts the queries that aggregate over the whole tree.

use crate::errors::AlgorithmError;
use crate::mechanism::ROOT_ID;
use crate::state::MechanismState;
use articulated_spatial::jacobian::GeometricJacobian;
use nalgebra::{Point3, Vector3};

/// Computes the geometric Jacobian of `body` with respect to `base`, with
/// columns expressed in the root frame.
///
/// The Jacobian maps the full velocity vector to the relative twist:
/// `J(body, base) · v = relative_twist(body, base)`. Columns of joints on
/// the body-side path enter with a positive sign, columns on the base-side
/// path with a negative sign; joints above the common ancestor appear on
/// both paths and cancel exactly.
///
/// # Arguments
///
/// * `out` - Output buffer with `nv` columns.
pub fn geometric_jacobian(
    state: &mut MechanismState,
    body: usize,
    base: usize,
    out: &mut GeometricJacobian,
) -> Result<(), AlgorithmError> {
    state.ensure_fresh()?;
    let mech = state.mechanism();
    if body >= mech.nbodies() {
        return Err(AlgorithmError::UnknownBody(body));
    }
    if base >= mech.nbodies() {
        return Err(AlgorithmError::UnknownBody(base));
    }
    if out.ncols() != mech.nv() {
        return Err(AlgorithmError::DimensionMismatch {
            name: "out",
            expected: mech.nv(),
            got: out.ncols(),
        });
    }
    state.update_motion_subspaces()?;

    let mech = state.mechanism();
    let subspaces = state.motion_subspaces();
    out.fill_zero();
    out.body = mech.bodies()[body].frame;
    out.base = mech.bodies()[base].frame;
    out.frame = mech.root_frame();

    let mut ancestor = body;
    while ancestor != ROOT_ID {
        let k = ancestor - 1;
        let joint = &mech.tree_joints()[k];
        let s = &subspaces[k];
        for c in 0..joint.v_range.len() {
            out.add_column_scaled(
                joint.v_range.start + c,
                1.0,
                &s.angular_column(c),
                &s.linear_column(c),
            );
        }
        ancestor = joint.predecessor;
    }
    let mut ancestor = base;
    while ancestor != ROOT_ID {
        let k = ancestor - 1;
        let joint = &mech.tree_joints()[k];
        let s = &subspaces[k];
        for c in 0..joint.v_range.len() {
            out.add_column_scaled(
                joint.v_range.start + c,
                -1.0,
                &s.angular_column(c),
                &s.linear_column(c),
            );
        }
        ancestor = joint.predecessor;
    }
    Ok(())
}

/// Computes the center of mass of the mechanism, expressed in the root
/// frame.
///
/// Fails with [`AlgorithmError::SingularInertia`] when the mechanism has no
/// mass at all.
pub fn center_of_mass(state: &mut MechanismState) -> Result<Point3<f64>, AlgorithmError> {
    state.ensure_fresh()?;
    state.update_inertias()?;
    let mut total_mass = 0.0;
    let mut weighted = Vector3::zeros();
    for inertia in state.inertias_world() {
        total_mass += inertia.mass;
        weighted += inertia.cross_part;
    }
    if total_mass <= 0.0 {
        return Err(AlgorithmError::SingularInertia);
    }
    Ok(Point3::from(weighted / total_mass))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::mechanism::{Joint, Mechanism, STANDARD_GRAVITY};
    use articulated_inertia::inertia::SpatialInertia;
    use articulated_joint::joint::JointWrapper;
    use articulated_joint::revolute::JointModelRevolute;
    use articulated_spatial::frame::FrameId;
    use articulated_spatial::transform::Transform;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, Vector3};

    fn two_link_arm() -> Mechanism {
        let mut mechanism = Mechanism::new("arm", RigidBody::massless("world"), *STANDARD_GRAVITY);
        for (i, parent) in [(1, ROOT_ID), (2, 1)] {
            let frame = FrameId::fresh();
            let body = RigidBody::new(
                format!("link{i}"),
                SpatialInertia::from_point_mass(frame, 1.0, Vector3::new(0.0, 0.0, -0.5)).unwrap(),
            );
            let joint = Joint::new(
                format!("joint{i}"),
                JointWrapper::revolute(JointModelRevolute::new_ry()),
            );
            let offset = if parent == ROOT_ID {
                Vector3::zeros()
            } else {
                Vector3::new(0.0, 0.0, -1.0)
            };
            let joint_pose = Transform::translation(
                joint.frame_before,
                mechanism.bodies()[parent].frame,
                offset,
            );
            let successor_pose = Transform::identity(body.frame, joint.frame_after);
            mechanism
                .attach(parent, body, joint, joint_pose, successor_pose)
                .unwrap();
        }
        mechanism
    }

    #[test]
    fn jacobian_times_velocity_is_the_relative_twist() {
        let mechanism = two_link_arm();
        let mut state = crate::state::MechanismState::new(&mechanism);
        state
            .set_configuration(&DVector::from_row_slice(&[0.4, -1.1]))
            .unwrap();
        state
            .set_velocity(&DVector::from_row_slice(&[0.8, 1.7]))
            .unwrap();
        let world = mechanism.root_frame();
        let mut jac = GeometricJacobian::zeros(world, world, world, mechanism.nv());
        geometric_jacobian(&mut state, 2, 0, &mut jac).unwrap();
        let predicted = jac.twist(state.velocity().as_slice());
        let actual = state.twist_wrt_world(2).unwrap();
        assert_relative_eq!(predicted.angular, actual.angular, epsilon = 1e-12);
        assert_relative_eq!(predicted.linear, actual.linear, epsilon = 1e-12);
    }

    #[test]
    fn relative_jacobian_cancels_shared_ancestors() {
        let mechanism = two_link_arm();
        let mut state = crate::state::MechanismState::new(&mechanism);
        state
            .set_configuration(&DVector::from_row_slice(&[0.2, 0.9]))
            .unwrap();
        let world = mechanism.root_frame();
        let mut jac = GeometricJacobian::zeros(world, world, world, mechanism.nv());
        geometric_jacobian(&mut state, 2, 1, &mut jac).unwrap();
        // Joint 1 is on both paths; its column must vanish identically.
        assert_relative_eq!(jac.angular_column(0), Vector3::zeros());
        assert_relative_eq!(jac.linear_column(0), Vector3::zeros());
    }

    #[test]
    fn center_of_mass_of_the_hanging_arm() {
        let mechanism = two_link_arm();
        let mut state = crate::state::MechanismState::new(&mechanism);
        let com = center_of_mass(&mut state).unwrap();
        // Point masses at z = -0.5 and z = -1.5.
        assert_relative_eq!(com.z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(com.x, 0.0, epsilon = 1e-12);
    }
}
