//! [`Mechanism`]: the immutable topological description of an articulated
//! system.

use crate::body::RigidBody;
use crate::errors::TopologyError;
use articulated_joint::joint::{JointModel, JointType, JointWrapper};
use articulated_spatial::frame::{FrameId, FrameMismatch, check_frame};
use articulated_spatial::transform::Transform;
use nalgebra::Vector3;
use ptree::TreeBuilder;
use std::ops::Range;
use std::sync::LazyLock;

/// Body index of the root (world) body.
pub const ROOT_ID: usize = 0;

/// Standard gravity vector (0, 0, -9.81).
pub static STANDARD_GRAVITY: LazyLock<Vector3<f64>> =
    LazyLock::new(|| Vector3::new(0.0, 0.0, -9.81));

impl From<FrameMismatch> for TopologyError {
    fn from(e: FrameMismatch) -> Self {
        TopologyError::PoseFrameMismatch(e)
    }
}

/// A joint: a joint model plus its attachment data inside a mechanism.
///
/// A joint owns two frames: `frame_before`, rigidly attached to the
/// predecessor body, and `frame_after`, rigidly attached to the successor
/// body. The joint model describes the motion of `frame_after` relative to
/// `frame_before`.
#[derive(Clone, Debug)]
pub struct Joint {
    /// Name of the joint.
    pub name: String,
    /// The joint model.
    pub model: JointWrapper,
    /// Joint frame fixed on the predecessor body.
    pub frame_before: FrameId,
    /// Joint frame fixed on the successor body.
    pub frame_after: FrameId,
    /// Body index of the predecessor.
    pub predecessor: usize,
    /// Body index of the successor.
    pub successor: usize,
    /// Transform from `frame_before` to the predecessor's body frame.
    pub before_to_predecessor: Transform,
    /// Transform from the successor's body frame to `frame_after`.
    pub successor_to_after: Transform,
    /// Range of this joint's coordinates in the configuration vector.
    pub q_range: Range<usize>,
    /// Range of this joint's coordinates in the velocity vector.
    pub v_range: Range<usize>,
    /// Range of this joint's rows in the loop-constraint system (non-tree
    /// joints only).
    pub c_range: Range<usize>,
}

impl Joint {
    /// Creates a new joint with fresh before/after frames.
    ///
    /// Attachment data (bodies, poses, index ranges) is filled in by
    /// [`Mechanism::attach`] or [`Mechanism::attach_loop`].
    #[must_use]
    pub fn new(name: impl Into<String>, model: JointWrapper) -> Self {
        let frame_before = FrameId::fresh();
        let frame_after = FrameId::fresh();
        Joint {
            name: name.into(),
            model,
            frame_before,
            frame_after,
            predecessor: ROOT_ID,
            successor: ROOT_ID,
            before_to_predecessor: Transform::identity(frame_before, frame_before),
            successor_to_after: Transform::identity(frame_after, frame_after),
            q_range: 0..0,
            v_range: 0..0,
            c_range: 0..0,
        }
    }
}

/// An auxiliary body-fixed frame and its transform to the body frame.
#[derive(Clone, Debug)]
pub struct FrameAttachment {
    /// The attached frame.
    pub frame: FrameId,
    /// Body the frame is fixed on.
    pub body: usize,
    /// Transform from `frame` to the body's default frame.
    pub to_body: Transform,
}

/// Data structure that contains the immutable properties of an articulated
/// mechanism: its bodies, the spanning tree of joints, and the non-tree
/// joints closing kinematic loops.
///
/// Topology is only edited through the construction API; any edit bumps an
/// internal version so that outstanding states detect the change and fail
/// with a stale-state error instead of computing nonsense.
pub struct Mechanism {
    /// Name of the mechanism.
    pub name: String,
    /// Gravitational acceleration, expressed in the root frame.
    pub gravity: Vector3<f64>,
    bodies: Vec<RigidBody>,
    tree_joints: Vec<Joint>,
    loop_joints: Vec<Joint>,
    frame_attachments: Vec<FrameAttachment>,
    nq: usize,
    nv: usize,
    nc: usize,
    version: u64,
}

impl Mechanism {
    /// Creates a new mechanism containing only the given root body.
    #[must_use]
    pub fn new(name: impl Into<String>, root: RigidBody, gravity: Vector3<f64>) -> Self {
        Mechanism {
            name: name.into(),
            gravity,
            bodies: vec![root],
            tree_joints: Vec::new(),
            loop_joints: Vec::new(),
            frame_attachments: Vec::new(),
            nq: 0,
            nv: 0,
            nc: 0,
            version: 0,
        }
    }

    /// Attaches a new successor body to the mechanism through a joint.
    ///
    /// # Arguments
    ///
    /// * `predecessor` - Body index the joint is attached to.
    /// * `successor` - The new body; becomes the successor of the joint.
    /// * `joint` - The joint connecting the two bodies.
    /// * `joint_pose` - Transform from `joint.frame_before` to the
    ///   predecessor's body frame.
    /// * `successor_pose` - Transform from the successor's body frame to
    ///   `joint.frame_after`.
    ///
    /// # Returns
    /// The body index of the newly added successor.
    pub fn attach(
        &mut self,
        predecessor: usize,
        successor: RigidBody,
        mut joint: Joint,
        joint_pose: Transform,
        successor_pose: Transform,
    ) -> Result<usize, TopologyError> {
        if predecessor >= self.bodies.len() {
            return Err(TopologyError::PredecessorDoesNotExist(predecessor));
        }
        if self.bodies.iter().any(|b| b.name == successor.name) {
            return Err(TopologyError::BodyNameAlreadyUsed(successor.name));
        }
        self.check_joint_name(&joint.name)?;
        check_frame(joint.frame_before, joint_pose.from)?;
        check_frame(self.bodies[predecessor].frame, joint_pose.to)?;
        check_frame(successor.frame, successor_pose.from)?;
        check_frame(joint.frame_after, successor_pose.to)?;

        let id = self.bodies.len();
        joint.predecessor = predecessor;
        joint.successor = id;
        joint.before_to_predecessor = joint_pose;
        joint.successor_to_after = successor_pose;
        self.bodies.push(successor);
        self.tree_joints.push(joint);
        self.reindex();
        self.version += 1;
        Ok(id)
    }

    /// Closes a kinematic loop between two bodies that already belong to the
    /// mechanism.
    ///
    /// The joint is stored as a non-tree joint: it contributes no
    /// configuration or velocity coordinates and does not alter the spanning
    /// tree. Its effect on the dynamics is the set of constraint forces
    /// spanned by its constraint wrench subspace.
    ///
    /// # Returns
    /// The index of the joint among the mechanism's loop joints.
    pub fn attach_loop(
        &mut self,
        predecessor: usize,
        successor: usize,
        mut joint: Joint,
        joint_pose: Transform,
        successor_pose: Transform,
    ) -> Result<usize, TopologyError> {
        if predecessor >= self.bodies.len() {
            return Err(TopologyError::PredecessorDoesNotExist(predecessor));
        }
        if successor >= self.bodies.len() {
            return Err(TopologyError::SuccessorDoesNotExist(successor));
        }
        self.check_joint_name(&joint.name)?;
        check_frame(joint.frame_before, joint_pose.from)?;
        check_frame(self.bodies[predecessor].frame, joint_pose.to)?;
        check_frame(self.bodies[successor].frame, successor_pose.from)?;
        check_frame(joint.frame_after, successor_pose.to)?;

        joint.predecessor = predecessor;
        joint.successor = successor;
        joint.before_to_predecessor = joint_pose;
        joint.successor_to_after = successor_pose;
        let id = self.loop_joints.len();
        self.loop_joints.push(joint);
        self.reindex();
        self.version += 1;
        Ok(id)
    }

    /// Attaches an auxiliary body-fixed frame.
    ///
    /// # Arguments
    ///
    /// * `body` - Body the frame is fixed on.
    /// * `to_body` - Transform from the new frame to the body's default
    ///   frame.
    pub fn add_body_fixed_frame(
        &mut self,
        body: usize,
        to_body: Transform,
    ) -> Result<(), TopologyError> {
        if body >= self.bodies.len() {
            return Err(TopologyError::PredecessorDoesNotExist(body));
        }
        check_frame(self.bodies[body].frame, to_body.to)?;
        self.frame_attachments.push(FrameAttachment {
            frame: to_body.from,
            body,
            to_body,
        });
        Ok(())
    }

    /// Merges every fixed tree joint into its predecessor.
    ///
    /// Inertias are transformed into the predecessor frame and added, child
    /// joints and loop-joint endpoints are re-rooted with composed poses,
    /// and the merged body's frame stays resolvable as an auxiliary frame.
    /// The dynamics on the remaining coordinates are unchanged.
    pub fn remove_fixed_joints(&mut self) -> Result<(), TopologyError> {
        while let Some(j) = self
            .tree_joints
            .iter()
            .position(|joint| joint.model.joint_type() == JointType::Fixed)
        {
            self.merge_fixed_joint(j)?;
        }
        self.reindex();
        self.version += 1;
        Ok(())
    }

    fn merge_fixed_joint(&mut self, j: usize) -> Result<(), TopologyError> {
        let joint = self.tree_joints.remove(j);
        let succ = joint.successor;
        let pred = joint.predecessor;
        let joint_transform = joint
            .model
            .joint_transform(joint.frame_after, joint.frame_before, &[]);
        let after_to_pred = joint.before_to_predecessor.compose(&joint_transform)?;
        let succ_to_pred = after_to_pred.compose(&joint.successor_to_after)?;
        let removed = self.bodies.remove(succ);

        // Welding a body to the root discards its inertia: it can no longer
        // move.
        if pred != ROOT_ID {
            if let Some(inertia) = removed.inertia {
                let moved = inertia.transform(&succ_to_pred)?;
                let pred_body = &mut self.bodies[pred];
                pred_body.inertia = Some(match &pred_body.inertia {
                    Some(existing) => existing.add(&moved)?,
                    None => moved,
                });
            }
        }

        self.frame_attachments.push(FrameAttachment {
            frame: removed.frame,
            body: pred,
            to_body: succ_to_pred,
        });
        self.frame_attachments.push(FrameAttachment {
            frame: joint.frame_before,
            body: pred,
            to_body: joint.before_to_predecessor,
        });
        self.frame_attachments.push(FrameAttachment {
            frame: joint.frame_after,
            body: pred,
            to_body: after_to_pred,
        });

        for att in &mut self.frame_attachments {
            if att.body == succ {
                att.body = pred;
                att.to_body = succ_to_pred.compose(&att.to_body)?;
            } else if att.body > succ {
                att.body -= 1;
            }
        }

        for other in self
            .tree_joints
            .iter_mut()
            .chain(self.loop_joints.iter_mut())
        {
            if other.predecessor == succ {
                other.predecessor = pred;
                other.before_to_predecessor =
                    succ_to_pred.compose(&other.before_to_predecessor)?;
            } else if other.predecessor > succ {
                other.predecessor -= 1;
            }
            if other.successor == succ {
                // Only loop joints can still reference the removed body.
                other.successor = pred;
                other.successor_to_after =
                    other.successor_to_after.compose(&succ_to_pred.inverse())?;
            } else if other.successor > succ {
                other.successor -= 1;
            }
        }
        Ok(())
    }

    /// Replaces the model of a tree joint and reassigns all configuration
    /// and velocity index ranges.
    ///
    /// Outstanding states become stale.
    pub fn change_joint_type(
        &mut self,
        joint: usize,
        new_model: JointWrapper,
    ) -> Result<(), TopologyError> {
        let j = self
            .tree_joints
            .get_mut(joint)
            .ok_or(TopologyError::JointDoesNotExist(joint))?;
        j.model = new_model;
        self.reindex();
        self.version += 1;
        Ok(())
    }

    fn check_joint_name(&self, name: &str) -> Result<(), TopologyError> {
        if self
            .tree_joints
            .iter()
            .chain(self.loop_joints.iter())
            .any(|j| j.name == name)
        {
            return Err(TopologyError::JointNameAlreadyUsed(name.to_string()));
        }
        Ok(())
    }

    fn reindex(&mut self) {
        let mut q = 0;
        let mut v = 0;
        for joint in &mut self.tree_joints {
            joint.q_range = q..q + joint.model.nq();
            joint.v_range = v..v + joint.model.nv();
            joint.c_range = 0..0;
            q = joint.q_range.end;
            v = joint.v_range.end;
        }
        self.nq = q;
        self.nv = v;
        let mut c = 0;
        for joint in &mut self.loop_joints {
            joint.q_range = 0..0;
            joint.v_range = 0..0;
            joint.c_range = c..c + joint.model.nc();
            c = joint.c_range.end;
        }
        self.nc = c;
    }

    /// Returns the bodies of the mechanism; index 0 is the root.
    #[must_use]
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Returns the spanning-tree joints in topological order.
    ///
    /// Tree joint `i` has successor body `i + 1`, and every predecessor
    /// index is smaller than its successor index; the forward and backward
    /// sweeps of the dynamics algorithms rely on this.
    #[must_use]
    pub fn tree_joints(&self) -> &[Joint] {
        &self.tree_joints
    }

    /// Returns the non-tree (loop) joints.
    #[must_use]
    pub fn loop_joints(&self) -> &[Joint] {
        &self.loop_joints
    }

    /// Returns the auxiliary frame attachments.
    #[must_use]
    pub fn frame_attachments(&self) -> &[FrameAttachment] {
        &self.frame_attachments
    }

    /// Returns the number of bodies, including the root.
    #[must_use]
    pub fn nbodies(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the dimension of the configuration vector.
    #[must_use]
    pub fn nq(&self) -> usize {
        self.nq
    }

    /// Returns the dimension of the velocity vector.
    #[must_use]
    pub fn nv(&self) -> usize {
        self.nv
    }

    /// Returns the total number of loop-constraint rows.
    #[must_use]
    pub fn nc(&self) -> usize {
        self.nc
    }

    /// Returns the current topology version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the root (world) frame.
    #[must_use]
    pub fn root_frame(&self) -> FrameId {
        self.bodies[ROOT_ID].frame
    }

    /// Returns the index of the body with the given name.
    #[must_use]
    pub fn body_id(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.name == name)
    }

    /// Returns the index of the tree joint with the given name.
    #[must_use]
    pub fn tree_joint_id(&self, name: &str) -> Option<usize> {
        self.tree_joints.iter().position(|j| j.name == name)
    }

    /// Returns the total mass of the mechanism.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.bodies
            .iter()
            .filter_map(|b| b.inertia.as_ref())
            .map(|inertia| inertia.mass)
            .sum()
    }

    /// Locates a frame on the mechanism.
    ///
    /// # Returns
    /// The index of the body the frame is fixed on, and the transform from
    /// the frame to that body's default frame; `None` if the frame is not
    /// part of the mechanism.
    #[must_use]
    pub fn frame_location(&self, frame: FrameId) -> Option<(usize, Transform)> {
        if let Some(id) = self.bodies.iter().position(|b| b.frame == frame) {
            return Some((id, Transform::identity(frame, frame)));
        }
        for joint in self.tree_joints.iter().chain(self.loop_joints.iter()) {
            if joint.frame_before == frame {
                return Some((joint.predecessor, joint.before_to_predecessor));
            }
            if joint.frame_after == frame {
                return Some((joint.successor, joint.successor_to_after.inverse()));
            }
        }
        self.frame_attachments
            .iter()
            .find(|att| att.frame == frame)
            .map(|att| (att.body, att.to_body))
    }

    /// Prints the spanning tree to standard output.
    pub fn write_tree(&self) -> std::io::Result<()> {
        let mut builder = TreeBuilder::new(self.bodies[ROOT_ID].name.clone());
        self.build_subtree(&mut builder, ROOT_ID);
        let tree = builder.build();
        ptree::print_tree(&tree)
    }

    fn build_subtree(&self, builder: &mut TreeBuilder, body: usize) {
        for joint in &self.tree_joints {
            if joint.predecessor == body {
                builder.begin_child(format!(
                    "{} [{:?}] {}",
                    joint.name,
                    joint.model.joint_type(),
                    self.bodies[joint.successor].name
                ));
                self.build_subtree(builder, joint.successor);
                builder.end_child();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use articulated_inertia::inertia::SpatialInertia;
    use articulated_joint::fixed::JointModelFixed;
    use articulated_joint::revolute::JointModelRevolute;
    use approx::assert_relative_eq;

    fn unit_sphere_body(name: &str) -> RigidBody {
        let frame = FrameId::fresh();
        RigidBody::new(name, SpatialInertia::from_solid_sphere(frame, 1.0, 0.5).unwrap())
    }

    fn attach_revolute(mechanism: &mut Mechanism, predecessor: usize, name: &str) -> usize {
        let body = unit_sphere_body(&format!("{name}_body"));
        let joint = Joint::new(name, JointWrapper::revolute(JointModelRevolute::new_rz()));
        let joint_pose = Transform::translation(
            joint.frame_before,
            mechanism.bodies()[predecessor].frame,
            Vector3::new(0.0, 0.0, -1.0),
        );
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        mechanism
            .attach(predecessor, body, joint, joint_pose, successor_pose)
            .unwrap()
    }

    #[test]
    fn attach_preserves_tree_ordering() {
        let mut mechanism = Mechanism::new("chain", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let b1 = attach_revolute(&mut mechanism, ROOT_ID, "j1");
        let b2 = attach_revolute(&mut mechanism, b1, "j2");
        let b3 = attach_revolute(&mut mechanism, b2, "j3");
        assert_eq!((b1, b2, b3), (1, 2, 3));
        assert_eq!(mechanism.nq(), 3);
        assert_eq!(mechanism.nv(), 3);
        for (i, joint) in mechanism.tree_joints().iter().enumerate() {
            assert_eq!(joint.successor, i + 1);
            assert!(joint.predecessor < joint.successor);
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut mechanism = Mechanism::new("m", RigidBody::massless("world"), *STANDARD_GRAVITY);
        attach_revolute(&mut mechanism, ROOT_ID, "j1");
        let body = unit_sphere_body("other");
        let joint = Joint::new("j1", JointWrapper::revolute(JointModelRevolute::new_rz()));
        let joint_pose = Transform::identity(joint.frame_before, mechanism.root_frame());
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        let result = mechanism.attach(ROOT_ID, body, joint, joint_pose, successor_pose);
        assert!(matches!(result, Err(TopologyError::JointNameAlreadyUsed(_))));
    }

    #[test]
    fn mismatched_pose_frames_are_rejected() {
        let mut mechanism = Mechanism::new("m", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let body = unit_sphere_body("b");
        let joint = Joint::new("j", JointWrapper::revolute(JointModelRevolute::new_rz()));
        // joint_pose must start at frame_before, not at the body frame.
        let bad_pose = Transform::identity(body.frame, mechanism.root_frame());
        let successor_pose = Transform::identity(body.frame, joint.frame_after);
        let result = mechanism.attach(ROOT_ID, body, joint, bad_pose, successor_pose);
        assert!(matches!(result, Err(TopologyError::PoseFrameMismatch(_))));
    }

    #[test]
    fn loop_joints_allocate_constraint_rows_only() {
        let mut mechanism = Mechanism::new("m", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let b1 = attach_revolute(&mut mechanism, ROOT_ID, "j1");
        let b2 = attach_revolute(&mut mechanism, b1, "j2");
        let loop_joint = Joint::new("loop", JointWrapper::revolute(JointModelRevolute::new_rz()));
        let joint_pose = Transform::identity(loop_joint.frame_before, mechanism.root_frame());
        let successor_pose =
            Transform::identity(mechanism.bodies()[b2].frame, loop_joint.frame_after);
        mechanism
            .attach_loop(ROOT_ID, b2, loop_joint, joint_pose, successor_pose)
            .unwrap();
        assert_eq!(mechanism.nq(), 2);
        assert_eq!(mechanism.nv(), 2);
        assert_eq!(mechanism.nc(), 5);
        assert_eq!(mechanism.loop_joints().len(), 1);
    }

    #[test]
    fn removing_fixed_joints_merges_inertia() {
        let mut mechanism = Mechanism::new("m", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let b1 = attach_revolute(&mut mechanism, ROOT_ID, "j1");

        let extra_frame = FrameId::fresh();
        let extra =
            RigidBody::new("extra", SpatialInertia::from_solid_sphere(extra_frame, 2.0, 0.3).unwrap());
        let joint = Joint::new("weld", JointWrapper::fixed(JointModelFixed::default()));
        let offset = Vector3::new(0.0, 0.0, -0.7);
        let joint_pose = Transform::translation(
            joint.frame_before,
            mechanism.bodies()[b1].frame,
            offset,
        );
        let successor_pose = Transform::identity(extra.frame, joint.frame_after);
        mechanism
            .attach(b1, extra, joint, joint_pose, successor_pose)
            .unwrap();

        let version_before = mechanism.version();
        let mass_before = mechanism.mass();
        mechanism.remove_fixed_joints().unwrap();

        assert_eq!(mechanism.nbodies(), 2);
        assert_eq!(mechanism.tree_joints().len(), 1);
        assert!(mechanism.version() > version_before);
        assert_relative_eq!(mechanism.mass(), mass_before);
        let merged = mechanism.bodies()[1].inertia.as_ref().unwrap();
        assert_relative_eq!(merged.mass, 3.0);
        // 2 kg moved to the weld offset shifts the combined center of mass.
        assert_relative_eq!(
            merged.center_of_mass(),
            offset * 2.0 / 3.0,
            epsilon = 1e-12
        );
        // The welded body's frame is still resolvable.
        assert!(mechanism.frame_location(extra_frame).is_some());
    }

    #[test]
    fn changing_a_joint_type_reassigns_indices() {
        let mut mechanism = Mechanism::new("m", RigidBody::massless("world"), *STANDARD_GRAVITY);
        let b1 = attach_revolute(&mut mechanism, ROOT_ID, "j1");
        attach_revolute(&mut mechanism, b1, "j2");
        assert_eq!(mechanism.nv(), 2);
        mechanism
            .change_joint_type(0, JointWrapper::fixed(JointModelFixed::default()))
            .unwrap();
        assert_eq!(mechanism.nq(), 1);
        assert_eq!(mechanism.nv(), 1);
        assert_eq!(mechanism.tree_joints()[1].v_range, 0..1);
    }
}
