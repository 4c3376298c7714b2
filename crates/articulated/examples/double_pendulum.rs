//! Double pendulum: mass matrix and inverse dynamics.

use articulated::prelude::*;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

fn link_inertia(frame: FrameId) -> SpatialInertia {
    // Slender link: unit mass, center of mass half a unit down the link,
    // rotational inertia 0.333 about the joint axis.
    SpatialInertia::new(
        frame,
        1.0,
        Vector3::new(0.0, 0.0, -0.5),
        Matrix3::from_diagonal(&Vector3::new(0.0, 0.333, 0.0)),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut mechanism = Mechanism::new(
        "double_pendulum",
        RigidBody::massless("world"),
        *STANDARD_GRAVITY,
    );

    let upper = RigidBody::new("upper_link", link_inertia(FrameId::fresh()));
    let shoulder = Joint::new("shoulder", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let shoulder_pose = Transform::identity(shoulder.frame_before, mechanism.root_frame());
    let upper_pose = Transform::identity(upper.frame, shoulder.frame_after);
    let upper_id = mechanism.attach(ROOT_ID, upper, shoulder, shoulder_pose, upper_pose)?;

    let lower = RigidBody::new("lower_link", link_inertia(FrameId::fresh()));
    let elbow = Joint::new("elbow", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let elbow_pose = Transform::translation(
        elbow.frame_before,
        mechanism.bodies()[upper_id].frame,
        Vector3::new(0.0, 0.0, -1.0),
    );
    let lower_pose = Transform::identity(lower.frame, elbow.frame_after);
    mechanism.attach(upper_id, lower, elbow, elbow_pose, lower_pose)?;

    mechanism.write_tree()?;

    let mut state = MechanismState::new(&mechanism);
    state.set_configuration(&DVector::from_row_slice(&[0.3, 0.4]))?;
    state.set_velocity(&DVector::from_row_slice(&[1.0, 2.0]))?;

    let mut m = DMatrix::zeros(mechanism.nv(), mechanism.nv());
    mass_matrix(&mut state, &mut m)?;
    println!("mass matrix: {m}");

    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::from_row_slice(&[1.0, 2.0]);
    let mut tau = DVector::zeros(mechanism.nv());
    inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result)?;
    println!("torques for vd = {}: {}", vd.transpose(), tau.transpose());

    println!("kinetic energy: {}", kinetic_energy(&mut state)?);
    println!("center of mass: {}", center_of_mass(&mut state)?);
    Ok(())
}
