//! [`MechanismState`]: configuration, velocity, and lazily recomputed
//! kinematic caches for one mechanism.

use crate::errors::AlgorithmError;
use crate::mechanism::Mechanism;
use articulated_inertia::inertia::SpatialInertia;
use articulated_joint::joint::JointModel;
use articulated_spatial::frame::FrameId;
use articulated_spatial::jacobian::{GeometricJacobian, WrenchMatrix};
use articulated_spatial::motion::{SpatialAcceleration, Twist};
use articulated_spatial::transform::Transform;
use nalgebra::DVector;
use rand::rngs::ThreadRng;

/// Validity bit per cached quantity group.
///
/// The invalidation rule is exhaustive: writing any part of `q` clears every
/// group, writing any part of `v` clears the twist and bias groups, and
/// [`MechanismState::set_dirty`] clears everything.
#[derive(Clone, Copy, Debug)]
struct CacheValidity {
    transforms: bool,
    twists: bool,
    biases: bool,
    inertias: bool,
    crb: bool,
    subspaces: bool,
    constraint_subspaces: bool,
}

impl CacheValidity {
    fn none() -> Self {
        CacheValidity {
            transforms: false,
            twists: false,
            biases: false,
            inertias: false,
            crb: false,
            subspaces: false,
            constraint_subspaces: false,
        }
    }

    fn invalidate_configuration_dependent(&mut self) {
        *self = CacheValidity::none();
    }

    fn invalidate_velocity_dependent(&mut self) {
        self.twists = false;
        self.biases = false;
    }
}

/// The mutable state of a mechanism: the configuration and velocity vectors
/// plus per-body caches that refresh lazily on first read.
///
/// The state borrows its mechanism immutably for its whole lifetime, so
/// several states of the same mechanism can be used from different threads;
/// they share no mutable memory. All caches are sized at construction and
/// refreshing never allocates.
pub struct MechanismState<'a> {
    mechanism: &'a Mechanism,
    version: u64,
    q: DVector<f64>,
    v: DVector<f64>,
    validity: CacheValidity,
    transforms_to_root: Vec<Transform>,
    twists_wrt_world: Vec<Twist>,
    bias_accelerations: Vec<SpatialAcceleration>,
    inertias_world: Vec<SpatialInertia>,
    crb_inertias: Vec<SpatialInertia>,
    motion_subspaces: Vec<GeometricJacobian>,
    constraint_subspaces: Vec<WrenchMatrix>,
}

impl<'a> MechanismState<'a> {
    /// Creates a state for the given mechanism, at the zero configuration
    /// and zero velocity.
    #[must_use]
    pub fn new(mechanism: &'a Mechanism) -> Self {
        let nbodies = mechanism.nbodies();
        let world = mechanism.root_frame();
        let mut q = DVector::zeros(mechanism.nq());
        for joint in mechanism.tree_joints() {
            joint
                .model
                .zero_configuration(&mut q.as_mut_slice()[joint.q_range.clone()]);
        }
        let motion_subspaces = mechanism
            .tree_joints()
            .iter()
            .map(|joint| {
                GeometricJacobian::zeros(
                    joint.frame_after,
                    joint.frame_before,
                    world,
                    joint.model.nv(),
                )
            })
            .collect();
        let constraint_subspaces = mechanism
            .loop_joints()
            .iter()
            .map(|joint| WrenchMatrix::zeros(joint.frame_after, joint.model.nc()))
            .collect();
        MechanismState {
            mechanism,
            version: mechanism.version(),
            q,
            v: DVector::zeros(mechanism.nv()),
            validity: CacheValidity::none(),
            transforms_to_root: vec![Transform::identity(world, world); nbodies],
            twists_wrt_world: vec![Twist::zero(world, world, world); nbodies],
            bias_accelerations: vec![SpatialAcceleration::zero(world, world, world); nbodies],
            inertias_world: vec![SpatialInertia::zero(world); nbodies],
            crb_inertias: vec![SpatialInertia::zero(world); nbodies],
            motion_subspaces,
            constraint_subspaces,
        }
    }

    /// Returns the mechanism this state belongs to.
    #[must_use]
    pub fn mechanism(&self) -> &'a Mechanism {
        self.mechanism
    }

    /// Returns the configuration vector.
    #[must_use]
    pub fn configuration(&self) -> &DVector<f64> {
        &self.q
    }

    /// Returns the velocity vector.
    #[must_use]
    pub fn velocity(&self) -> &DVector<f64> {
        &self.v
    }

    /// Fails with [`AlgorithmError::StaleState`] when the mechanism topology
    /// has changed since this state was created.
    pub fn ensure_fresh(&self) -> Result<(), AlgorithmError> {
        if self.version != self.mechanism.version() {
            return Err(AlgorithmError::StaleState);
        }
        Ok(())
    }

    /// Overwrites the whole configuration vector.
    pub fn set_configuration(&mut self, q: &DVector<f64>) -> Result<(), AlgorithmError> {
        if q.len() != self.q.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "q",
                expected: self.q.len(),
                got: q.len(),
            });
        }
        self.q.copy_from(q);
        self.validity.invalidate_configuration_dependent();
        Ok(())
    }

    /// Overwrites the whole velocity vector.
    pub fn set_velocity(&mut self, v: &DVector<f64>) -> Result<(), AlgorithmError> {
        if v.len() != self.v.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "v",
                expected: self.v.len(),
                got: v.len(),
            });
        }
        self.v.copy_from(v);
        self.validity.invalidate_velocity_dependent();
        Ok(())
    }

    /// Returns the configuration segment of one tree joint.
    pub fn joint_configuration(&self, joint: usize) -> Result<&[f64], AlgorithmError> {
        let joint = self
            .mechanism
            .tree_joints()
            .get(joint)
            .ok_or(AlgorithmError::UnknownJoint(joint))?;
        Ok(&self.q.as_slice()[joint.q_range.clone()])
    }

    /// Returns the velocity segment of one tree joint.
    pub fn joint_velocity(&self, joint: usize) -> Result<&[f64], AlgorithmError> {
        let joint = self
            .mechanism
            .tree_joints()
            .get(joint)
            .ok_or(AlgorithmError::UnknownJoint(joint))?;
        Ok(&self.v.as_slice()[joint.v_range.clone()])
    }

    /// Overwrites the configuration segment of one tree joint.
    pub fn set_joint_configuration(
        &mut self,
        joint: usize,
        values: &[f64],
    ) -> Result<(), AlgorithmError> {
        let joint = self
            .mechanism
            .tree_joints()
            .get(joint)
            .ok_or(AlgorithmError::UnknownJoint(joint))?;
        if values.len() != joint.q_range.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "values",
                expected: joint.q_range.len(),
                got: values.len(),
            });
        }
        self.q.as_mut_slice()[joint.q_range.clone()].copy_from_slice(values);
        self.validity.invalidate_configuration_dependent();
        Ok(())
    }

    /// Overwrites the velocity segment of one tree joint.
    pub fn set_joint_velocity(
        &mut self,
        joint: usize,
        values: &[f64],
    ) -> Result<(), AlgorithmError> {
        let joint = self
            .mechanism
            .tree_joints()
            .get(joint)
            .ok_or(AlgorithmError::UnknownJoint(joint))?;
        if values.len() != joint.v_range.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "values",
                expected: joint.v_range.len(),
                got: values.len(),
            });
        }
        self.v.as_mut_slice()[joint.v_range.clone()].copy_from_slice(values);
        self.validity.invalidate_velocity_dependent();
        Ok(())
    }

    /// Resets the configuration to the zero configuration of every joint.
    pub fn zero_configuration(&mut self) {
        for joint in self.mechanism.tree_joints() {
            joint
                .model
                .zero_configuration(&mut self.q.as_mut_slice()[joint.q_range.clone()]);
        }
        self.validity.invalidate_configuration_dependent();
    }

    /// Resets the velocity to zero.
    pub fn zero_velocity(&mut self) {
        self.v.fill(0.0);
        self.validity.invalidate_velocity_dependent();
    }

    /// Samples a random configuration for every joint.
    pub fn rand_configuration(&mut self, rng: &mut ThreadRng) {
        for joint in self.mechanism.tree_joints() {
            joint
                .model
                .rand_configuration(&mut self.q.as_mut_slice()[joint.q_range.clone()], rng);
        }
        self.validity.invalidate_configuration_dependent();
    }

    /// Normalizes the configuration of every joint in place.
    pub fn normalize_configuration(&mut self) -> Result<(), AlgorithmError> {
        for joint in self.mechanism.tree_joints() {
            joint
                .model
                .normalize_configuration(&mut self.q.as_mut_slice()[joint.q_range.clone()])?;
        }
        self.validity.invalidate_configuration_dependent();
        Ok(())
    }

    /// Marks every cache group dirty.
    pub fn set_dirty(&mut self) {
        self.validity = CacheValidity::none();
    }

    /// Maps the current velocity to the configuration time derivative, for
    /// use by integrators.
    pub fn velocity_to_configuration_derivative(
        &self,
        q_dot: &mut DVector<f64>,
    ) -> Result<(), AlgorithmError> {
        if q_dot.len() != self.q.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "q_dot",
                expected: self.q.len(),
                got: q_dot.len(),
            });
        }
        for joint in self.mechanism.tree_joints() {
            joint.model.velocity_to_configuration_derivative(
                &self.q.as_slice()[joint.q_range.clone()],
                &self.v.as_slice()[joint.v_range.clone()],
                &mut q_dot.as_mut_slice()[joint.q_range.clone()],
            );
        }
        Ok(())
    }

    /// Maps a configuration time derivative to a velocity vector.
    pub fn configuration_derivative_to_velocity(
        &self,
        q_dot: &DVector<f64>,
        v: &mut DVector<f64>,
    ) -> Result<(), AlgorithmError> {
        if q_dot.len() != self.q.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "q_dot",
                expected: self.q.len(),
                got: q_dot.len(),
            });
        }
        if v.len() != self.v.len() {
            return Err(AlgorithmError::DimensionMismatch {
                name: "v",
                expected: self.v.len(),
                got: v.len(),
            });
        }
        for joint in self.mechanism.tree_joints() {
            joint.model.configuration_derivative_to_velocity(
                &self.q.as_slice()[joint.q_range.clone()],
                &q_dot.as_slice()[joint.q_range.clone()],
                &mut v.as_mut_slice()[joint.v_range.clone()],
            );
        }
        Ok(())
    }

    /// Refreshes the body transforms to the root frame.
    ///
    /// Like every refresh, this runs a single topological forward sweep, is
    /// idempotent, and does nothing while the group is valid.
    pub fn update_transforms(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.transforms {
            return Ok(());
        }
        let mech = self.mechanism;
        let world = mech.root_frame();
        self.transforms_to_root[0] = Transform::identity(world, world);
        for joint in mech.tree_joints() {
            let joint_transform = joint.model.joint_transform(
                joint.frame_after,
                joint.frame_before,
                &self.q.as_slice()[joint.q_range.clone()],
            );
            let successor_to_predecessor = joint
                .before_to_predecessor
                .compose(&joint_transform)?
                .compose(&joint.successor_to_after)?;
            self.transforms_to_root[joint.successor] =
                self.transforms_to_root[joint.predecessor].compose(&successor_to_predecessor)?;
        }
        self.validity.transforms = true;
        Ok(())
    }

    /// Refreshes the per-joint motion subspaces, expressed in the root
    /// frame.
    pub fn update_motion_subspaces(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.subspaces {
            return Ok(());
        }
        self.update_transforms()?;
        let mech = self.mechanism;
        for (i, joint) in mech.tree_joints().iter().enumerate() {
            let after_to_root = self.transforms_to_root[joint.successor]
                .compose(&joint.successor_to_after.inverse())?;
            let out = &mut self.motion_subspaces[i];
            joint.model.motion_subspace(
                joint.frame_after,
                joint.frame_before,
                &self.q.as_slice()[joint.q_range.clone()],
                out,
            );
            out.transform(&after_to_root)?;
            // The joint frames are rigid on the bodies they are attached to,
            // so the columns can be re-tagged with the body frames.
            out.body = mech.bodies()[joint.successor].frame;
            out.base = mech.bodies()[joint.predecessor].frame;
        }
        self.validity.subspaces = true;
        Ok(())
    }

    /// Refreshes the body twists with respect to the world.
    pub fn update_twists(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.twists {
            return Ok(());
        }
        self.update_transforms()?;
        let mech = self.mechanism;
        let world = mech.root_frame();
        self.twists_wrt_world[0] = Twist::zero(world, world, world);
        for joint in mech.tree_joints() {
            let after_to_root = self.transforms_to_root[joint.successor]
                .compose(&joint.successor_to_after.inverse())?;
            let joint_twist = joint
                .model
                .joint_twist(
                    joint.frame_after,
                    joint.frame_before,
                    &self.q.as_slice()[joint.q_range.clone()],
                    &self.v.as_slice()[joint.v_range.clone()],
                )
                .transform(&after_to_root)?;
            let joint_twist = Twist {
                body: mech.bodies()[joint.successor].frame,
                base: mech.bodies()[joint.predecessor].frame,
                ..joint_twist
            };
            self.twists_wrt_world[joint.successor] =
                joint_twist.add(&self.twists_wrt_world[joint.predecessor])?;
        }
        self.validity.twists = true;
        Ok(())
    }

    /// Refreshes the velocity-dependent bias accelerations: the part of each
    /// body's spatial acceleration that does not depend on `v̇`.
    pub fn update_bias_accelerations(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.biases {
            return Ok(());
        }
        self.update_twists()?;
        let mech = self.mechanism;
        let world = mech.root_frame();
        self.bias_accelerations[0] = SpatialAcceleration::zero(world, world, world);
        for joint in mech.tree_joints() {
            let after_to_root = self.transforms_to_root[joint.successor]
                .compose(&joint.successor_to_after.inverse())?;
            let joint_bias = joint
                .model
                .bias_acceleration(
                    joint.frame_after,
                    joint.frame_before,
                    &self.q.as_slice()[joint.q_range.clone()],
                    &self.v.as_slice()[joint.v_range.clone()],
                )
                .transform(&after_to_root)?;
            let joint_bias = SpatialAcceleration {
                body: mech.bodies()[joint.successor].frame,
                base: mech.bodies()[joint.predecessor].frame,
                ..joint_bias
            };
            let joint_twist = self.twists_wrt_world[joint.successor]
                .sub(&self.twists_wrt_world[joint.predecessor])?;
            // Coriolis term from differentiating the frame change of the
            // joint twist.
            let coriolis = self.twists_wrt_world[joint.predecessor].cross(&joint_twist)?;
            self.bias_accelerations[joint.successor] = joint_bias
                .add(&coriolis)?
                .add(&self.bias_accelerations[joint.predecessor])?;
        }
        self.validity.biases = true;
        Ok(())
    }

    /// Refreshes the body inertias expressed in the root frame.
    pub fn update_inertias(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.inertias {
            return Ok(());
        }
        self.update_transforms()?;
        let mech = self.mechanism;
        let world = mech.root_frame();
        self.inertias_world[0] = SpatialInertia::zero(world);
        for (id, body) in mech.bodies().iter().enumerate().skip(1) {
            self.inertias_world[id] = match &body.inertia {
                Some(inertia) => inertia.transform(&self.transforms_to_root[id])?,
                None => SpatialInertia::zero(world),
            };
        }
        self.validity.inertias = true;
        Ok(())
    }

    /// Refreshes the composite rigid-body inertias: for each body, the
    /// world-frame inertia of the subtree rooted at it.
    pub fn update_crb_inertias(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.crb {
            return Ok(());
        }
        self.update_inertias()?;
        let mech = self.mechanism;
        self.crb_inertias.copy_from_slice(&self.inertias_world);
        for joint in mech.tree_joints().iter().rev() {
            self.crb_inertias[joint.predecessor] =
                self.crb_inertias[joint.predecessor].add(&self.crb_inertias[joint.successor])?;
        }
        self.validity.crb = true;
        Ok(())
    }

    /// Refreshes the loop-joint constraint wrench subspaces, expressed in
    /// the root frame.
    pub fn update_constraint_subspaces(&mut self) -> Result<(), AlgorithmError> {
        if self.validity.constraint_subspaces {
            return Ok(());
        }
        self.update_transforms()?;
        let mech = self.mechanism;
        for (l, joint) in mech.loop_joints().iter().enumerate() {
            let after_to_root = self.transforms_to_root[joint.successor]
                .compose(&joint.successor_to_after.inverse())?;
            let out = &mut self.constraint_subspaces[l];
            joint.model.constraint_wrench_subspace(joint.frame_after, &[], out);
            out.transform(&after_to_root)?;
        }
        self.validity.constraint_subspaces = true;
        Ok(())
    }

    /// Returns the cached body transforms; valid after
    /// [`MechanismState::update_transforms`].
    #[must_use]
    pub fn transforms_to_root(&self) -> &[Transform] {
        debug_assert!(self.validity.transforms);
        &self.transforms_to_root
    }

    /// Returns the cached body twists; valid after
    /// [`MechanismState::update_twists`].
    #[must_use]
    pub fn twists_wrt_world(&self) -> &[Twist] {
        debug_assert!(self.validity.twists);
        &self.twists_wrt_world
    }

    /// Returns the cached bias accelerations; valid after
    /// [`MechanismState::update_bias_accelerations`].
    #[must_use]
    pub fn bias_accelerations(&self) -> &[SpatialAcceleration] {
        debug_assert!(self.validity.biases);
        &self.bias_accelerations
    }

    /// Returns the cached world-frame inertias; valid after
    /// [`MechanismState::update_inertias`].
    #[must_use]
    pub fn inertias_world(&self) -> &[SpatialInertia] {
        debug_assert!(self.validity.inertias);
        &self.inertias_world
    }

    /// Returns the cached composite inertias; valid after
    /// [`MechanismState::update_crb_inertias`].
    #[must_use]
    pub fn crb_inertias(&self) -> &[SpatialInertia] {
        debug_assert!(self.validity.crb);
        &self.crb_inertias
    }

    /// Returns the cached world-frame motion subspaces; valid after
    /// [`MechanismState::update_motion_subspaces`].
    #[must_use]
    pub fn motion_subspaces(&self) -> &[GeometricJacobian] {
        debug_assert!(self.validity.subspaces);
        &self.motion_subspaces
    }

    /// Returns the cached world-frame constraint wrench subspaces; valid
    /// after [`MechanismState::update_constraint_subspaces`].
    #[must_use]
    pub fn constraint_subspaces(&self) -> &[WrenchMatrix] {
        debug_assert!(self.validity.constraint_subspaces);
        &self.constraint_subspaces
    }

    /// Returns the transform from `frame` to the root frame.
    ///
    /// `frame` may be a body frame, a joint frame, or an auxiliary frame.
    pub fn transform_to_root(&mut self, frame: FrameId) -> Result<Transform, AlgorithmError> {
        self.ensure_fresh()?;
        self.update_transforms()?;
        let (body, to_body) = self
            .mechanism
            .frame_location(frame)
            .ok_or(AlgorithmError::UnknownFrame(frame))?;
        Ok(self.transforms_to_root[body].compose(&to_body)?)
    }

    /// Returns the transform from `from` to `to`.
    pub fn relative_transform(
        &mut self,
        from: FrameId,
        to: FrameId,
    ) -> Result<Transform, AlgorithmError> {
        let from_to_root = self.transform_to_root(from)?;
        let to_to_root = self.transform_to_root(to)?;
        Ok(to_to_root.inverse().compose(&from_to_root)?)
    }

    /// Returns the twist of a body with respect to the world, expressed in
    /// the root frame.
    pub fn twist_wrt_world(&mut self, body: usize) -> Result<Twist, AlgorithmError> {
        self.ensure_fresh()?;
        if body >= self.mechanism.nbodies() {
            return Err(AlgorithmError::UnknownBody(body));
        }
        self.update_twists()?;
        Ok(self.twists_wrt_world[body])
    }

    /// Returns the twist of `body` with respect to `base`, expressed in the
    /// root frame.
    pub fn relative_twist(&mut self, body: usize, base: usize) -> Result<Twist, AlgorithmError> {
        let body_twist = self.twist_wrt_world(body)?;
        let base_twist = self.twist_wrt_world(base)?;
        Ok(body_twist.sub(&base_twist)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::mechanism::{Joint, ROOT_ID, STANDARD_GRAVITY};
    use articulated_joint::joint::JointWrapper;
    use articulated_joint::revolute::JointModelRevolute;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// A single pendulum rotating about y, with the link extending one unit
    /// down the z axis.
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
    fn transform_to_root_follows_the_joint_angle() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        state
            .set_joint_configuration(0, &[std::f64::consts::FRAC_PI_2])
            .unwrap();
        let frame = mechanism.bodies()[1].frame;
        let t = state.transform_to_root(frame).unwrap();
        // Rotating by π/2 about y maps ẑ onto x̂.
        let tip = t.transform_point(&nalgebra::Point3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(tip.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(tip.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn twist_of_the_link_matches_the_joint_rate() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        state.set_joint_velocity(0, &[2.0]).unwrap();
        let twist = state.twist_wrt_world(1).unwrap();
        assert_relative_eq!(twist.angular, Vector3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(twist.linear, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn velocity_writes_do_not_touch_transforms() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        state.set_joint_configuration(0, &[0.7]).unwrap();
        let frame = mechanism.bodies()[1].frame;
        let before = state.transform_to_root(frame).unwrap();
        state.set_joint_velocity(0, &[1.5]).unwrap();
        let after = state.transform_to_root(frame).unwrap();
        assert_relative_eq!(before, after);
    }

    #[test]
    fn relative_transform_round_trip_is_identity() {
        let mechanism = pendulum();
        let mut state = MechanismState::new(&mechanism);
        state.set_joint_configuration(0, &[0.3]).unwrap();
        let link = mechanism.bodies()[1].frame;
        let world = mechanism.root_frame();
        let forward = state.relative_transform(link, world).unwrap();
        let backward = state.relative_transform(world, link).unwrap();
        let round_trip = forward.compose(&backward).unwrap();
        assert_relative_eq!(round_trip, Transform::identity(world, world), epsilon = 1e-10);
    }
}
