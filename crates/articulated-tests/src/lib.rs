//! Scenario mechanisms shared by the integration tests.

use articulated_inertia::inertia::SpatialInertia;
use articulated_joint::joint::JointWrapper;
use articulated_joint::planar::JointModelPlanar;
use articulated_joint::prismatic::JointModelPrismatic;
use articulated_joint::quaternion_floating::JointModelQuaternionFloating;
use articulated_joint::revolute::JointModelRevolute;
use articulated_mechanism::body::RigidBody;
use articulated_mechanism::mechanism::{Joint, Mechanism, ROOT_ID, STANDARD_GRAVITY};
use articulated_spatial::frame::FrameId;
use articulated_spatial::transform::Transform;
use nalgebra::{Matrix3, Vector3};

/// Inertia of a slender rod of the given mass and length along `direction`,
/// with the body frame at one end.
#[must_use]
pub fn rod_inertia(frame: FrameId, mass: f64, length: f64, direction: Vector3<f64>) -> SpatialInertia {
    let axis = direction.normalize();
    let com = 0.5 * length * axis;
    let moment = mass * length * length / 3.0 * (Matrix3::identity() - axis * axis.transpose());
    SpatialInertia::new(frame, mass, com, moment)
}

fn planar_link(frame: FrameId) -> SpatialInertia {
    // Unit mass with the rotational inertia of a slender link about its
    // joint axis.
    SpatialInertia::new(
        frame,
        1.0,
        Vector3::new(0.0, 0.0, -0.5),
        Matrix3::from_diagonal(&Vector3::new(0.0, 0.333, 0.0)),
    )
}

/// The classic double pendulum: two identical links rotating about y,
/// hanging along -z, unit masses and lengths.
#[must_use]
pub fn double_pendulum() -> Mechanism {
    let mut mechanism = Mechanism::new(
        "double_pendulum",
        RigidBody::massless("world"),
        *STANDARD_GRAVITY,
    );
    let upper = RigidBody::new("upper_link", planar_link(FrameId::fresh()));
    let shoulder = Joint::new("shoulder", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let shoulder_pose = Transform::identity(shoulder.frame_before, mechanism.root_frame());
    let upper_pose = Transform::identity(upper.frame, shoulder.frame_after);
    let upper_id = mechanism
        .attach(ROOT_ID, upper, shoulder, shoulder_pose, upper_pose)
        .unwrap();

    let lower = RigidBody::new("lower_link", planar_link(FrameId::fresh()));
    let elbow = Joint::new("elbow", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let elbow_pose = Transform::translation(
        elbow.frame_before,
        mechanism.bodies()[upper_id].frame,
        Vector3::new(0.0, 0.0, -1.0),
    );
    let lower_pose = Transform::identity(lower.frame, elbow.frame_after);
    mechanism
        .attach(upper_id, lower, elbow, elbow_pose, lower_pose)
        .unwrap();
    mechanism
}

/// The acrobot: shoulder and elbow about y, upper link of length 1 and
/// lower link of length 2, with the usual underactuated-robotics
/// parameters.
#[must_use]
pub fn acrobot() -> Mechanism {
    let mut mechanism = Mechanism::new("acrobot", RigidBody::massless("world"), *STANDARD_GRAVITY);
    let upper_frame = FrameId::fresh();
    let upper = RigidBody::new(
        "upper_link",
        SpatialInertia::new(
            upper_frame,
            1.0,
            Vector3::new(0.0, 0.0, -0.5),
            Matrix3::from_diagonal(&Vector3::new(0.0, 0.333, 0.0)),
        ),
    );
    let shoulder = Joint::new("shoulder", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let shoulder_pose = Transform::identity(shoulder.frame_before, mechanism.root_frame());
    let upper_pose = Transform::identity(upper.frame, shoulder.frame_after);
    let upper_id = mechanism
        .attach(ROOT_ID, upper, shoulder, shoulder_pose, upper_pose)
        .unwrap();

    let lower_frame = FrameId::fresh();
    let lower = RigidBody::new(
        "lower_link",
        SpatialInertia::new(
            lower_frame,
            1.0,
            Vector3::new(0.0, 0.0, -1.0),
            Matrix3::from_diagonal(&Vector3::new(0.0, 1.33, 0.0)),
        ),
    );
    let elbow = Joint::new("elbow", JointWrapper::revolute(JointModelRevolute::new_ry()));
    let elbow_pose = Transform::translation(
        elbow.frame_before,
        mechanism.bodies()[upper_id].frame,
        Vector3::new(0.0, 0.0, -1.0),
    );
    let lower_pose = Transform::identity(lower.frame, elbow.frame_after);
    mechanism
        .attach(upper_id, lower, elbow, elbow_pose, lower_pose)
        .unwrap();
    mechanism
}

/// A planar parallelogram four-bar linkage: three tree revolutes about z
/// plus one loop revolute closing the cycle, gravity in-plane.
///
/// At the zero configuration the loop is exactly closed, and velocities of
/// the form `(ω, -ω, ω)` are consistent with the loop constraint.
#[must_use]
pub fn four_bar() -> Mechanism {
    let mut mechanism = Mechanism::new(
        "four_bar",
        RigidBody::massless("world"),
        Vector3::new(0.0, -9.81, 0.0),
    );

    let crank1 = RigidBody::new("crank1", rod_inertia(FrameId::fresh(), 1.0, 0.5, -Vector3::y()));
    let j1 = Joint::new("j1", JointWrapper::revolute(JointModelRevolute::new_rz()));
    let j1_pose = Transform::identity(j1.frame_before, mechanism.root_frame());
    let crank1_pose = Transform::identity(crank1.frame, j1.frame_after);
    let b1 = mechanism
        .attach(ROOT_ID, crank1, j1, j1_pose, crank1_pose)
        .unwrap();

    let coupler = RigidBody::new("coupler", rod_inertia(FrameId::fresh(), 1.0, 1.0, Vector3::x()));
    let j2 = Joint::new("j2", JointWrapper::revolute(JointModelRevolute::new_rz()));
    let j2_pose = Transform::translation(
        j2.frame_before,
        mechanism.bodies()[b1].frame,
        Vector3::new(0.0, -0.5, 0.0),
    );
    let coupler_pose = Transform::identity(coupler.frame, j2.frame_after);
    let b2 = mechanism
        .attach(b1, coupler, j2, j2_pose, coupler_pose)
        .unwrap();

    let crank2 = RigidBody::new("crank2", rod_inertia(FrameId::fresh(), 1.0, 0.5, Vector3::y()));
    let j3 = Joint::new("j3", JointWrapper::revolute(JointModelRevolute::new_rz()));
    let j3_pose = Transform::translation(
        j3.frame_before,
        mechanism.bodies()[b2].frame,
        Vector3::new(1.0, 0.0, 0.0),
    );
    let crank2_pose = Transform::identity(crank2.frame, j3.frame_after);
    let b3 = mechanism
        .attach(b2, crank2, j3, j3_pose, crank2_pose)
        .unwrap();

    let loop_joint = Joint::new("j4", JointWrapper::revolute(JointModelRevolute::new_rz()));
    let anchor_pose = Transform::translation(
        loop_joint.frame_before,
        mechanism.root_frame(),
        Vector3::new(1.0, 0.0, 0.0),
    );
    let tip_pose = Transform::translation(
        mechanism.bodies()[b3].frame,
        loop_joint.frame_after,
        Vector3::new(0.0, -0.5, 0.0),
    );
    mechanism
        .attach_loop(ROOT_ID, b3, loop_joint, anchor_pose, tip_pose)
        .unwrap();
    mechanism
}

/// A fixed-base serial arm mixing revolute, prismatic, and planar joints.
#[must_use]
pub fn serial_arm() -> Mechanism {
    let mut mechanism = Mechanism::new("arm", RigidBody::massless("world"), *STANDARD_GRAVITY);
    let models = [
        JointWrapper::revolute(JointModelRevolute::new_ry()),
        JointWrapper::prismatic(JointModelPrismatic::new_px()),
        JointWrapper::planar(JointModelPlanar::new_xy()),
        JointWrapper::revolute(JointModelRevolute::new_rz()),
        JointWrapper::revolute(JointModelRevolute::new_rx()),
    ];
    let mut parent = ROOT_ID;
    for (i, model) in models.into_iter().enumerate() {
        let frame = FrameId::fresh();
        let body = RigidBody::new(
            format!("link{i}"),
            SpatialInertia::from_solid_ellipsoid(frame, 1.0 + 0.3 * i as f64, 0.3, 0.2, 0.4)
                .unwrap(),
        );
        let joint = Joint::new(format!("joint{i}"), model);
        let joint_pose = Transform::translation(
            joint.frame_before,
            mechanism.bodies()[parent].frame,
            Vector3::new(0.1, 0.0, -0.4),
        );
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        parent = mechanism
            .attach(parent, body, joint, joint_pose, successor_pose)
            .unwrap();
    }
    mechanism
}

/// A floating-base chain: a quaternion-floating pelvis followed by `n`
/// revolute joints with alternating axes, in the spirit of a humanoid's
/// kinematic depth.
#[must_use]
pub fn floating_chain(n: usize) -> Mechanism {
    let mut mechanism = Mechanism::new("humanoid", RigidBody::massless("world"), *STANDARD_GRAVITY);
    let pelvis_frame = FrameId::fresh();
    let pelvis = RigidBody::new(
        "pelvis",
        SpatialInertia::from_solid_ellipsoid(pelvis_frame, 10.0, 0.2, 0.15, 0.1).unwrap(),
    );
    let root_joint = Joint::new(
        "floating_base",
        JointWrapper::quaternion_floating(JointModelQuaternionFloating::default()),
    );
    let root_pose = Transform::identity(root_joint.frame_before, mechanism.root_frame());
    let pelvis_pose = Transform::identity(pelvis.frame, root_joint.frame_after);
    let mut parent = mechanism
        .attach(ROOT_ID, pelvis, root_joint, root_pose, pelvis_pose)
        .unwrap();

    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    for i in 0..n {
        let frame = FrameId::fresh();
        let body = RigidBody::new(
            format!("segment{i}"),
            SpatialInertia::from_solid_ellipsoid(frame, 1.0, 0.12, 0.1, 0.25).unwrap(),
        );
        let joint = Joint::new(
            format!("dof{i}"),
            JointWrapper::revolute(JointModelRevolute::new(axes[i % 3])),
        );
        let joint_pose = Transform::translation(
            joint.frame_before,
            mechanism.bodies()[parent].frame,
            Vector3::new(0.0, 0.05, -0.25),
        );
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        parent = mechanism
            .attach(parent, body, joint, joint_pose, successor_pose)
            .unwrap();
    }
    mechanism
}
