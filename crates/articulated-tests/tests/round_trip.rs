//! Inverse/forward dynamics round trips and kinematic consistency on
//! randomly sampled states.

use articulated_mechanism::dynamics::dynamics;
use articulated_mechanism::inverse_dynamics::inverse_dynamics;
use articulated_mechanism::mass_matrix::mass_matrix;
use articulated_mechanism::result::DynamicsResult;
use articulated_mechanism::state::MechanismState;
use articulated_spatial::force::Wrench;
use articulated_tests::{floating_chain, serial_arm};
use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector, Point3, Vector3};
use rand::Rng;

fn random_vector(n: usize, rng: &mut rand::rngs::ThreadRng) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.random_range(-1.0..1.0))
}

#[test]
fn inverse_then_forward_dynamics_round_trips_on_the_arm() {
    let mechanism = serial_arm();
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let mut rng = rand::rng();
    for _ in 0..5 {
        state.rand_configuration(&mut rng);
        state.set_velocity(&random_vector(mechanism.nv(), &mut rng)).unwrap();
        let vd = random_vector(mechanism.nv(), &mut rng);
        let mut tau = DVector::zeros(mechanism.nv());
        inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result).unwrap();
        dynamics(&mut state, &tau, &[], &mut result).unwrap();
        assert_relative_eq!(result.vd, vd, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn round_trip_holds_with_external_wrenches() {
    let mechanism = serial_arm();
    let world = mechanism.root_frame();
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let mut rng = rand::rng();
    state.rand_configuration(&mut rng);
    state.set_velocity(&random_vector(mechanism.nv(), &mut rng)).unwrap();
    let externals = [
        (
            2,
            Wrench::new(world, Vector3::new(0.4, -0.2, 0.9), Vector3::new(1.0, 2.0, -0.5)),
        ),
        (
            5,
            Wrench::from_force_at_point(world, Vector3::new(0.0, 0.0, -4.0), Vector3::new(0.3, 0.1, 0.2)),
        ),
    ];
    let vd = random_vector(mechanism.nv(), &mut rng);
    let mut tau = DVector::zeros(mechanism.nv());
    inverse_dynamics(&mut state, &vd, &externals, &mut tau, &mut result).unwrap();
    dynamics(&mut state, &tau, &externals, &mut result).unwrap();
    assert_relative_eq!(result.vd, vd, epsilon = 1e-9, max_relative = 1e-9);
}

#[test]
fn mass_matrix_is_symmetric_and_positive_definite() {
    let mechanism = serial_arm();
    let mut state = MechanismState::new(&mechanism);
    let mut rng = rand::rng();
    let mut m = DMatrix::zeros(mechanism.nv(), mechanism.nv());
    for _ in 0..5 {
        state.rand_configuration(&mut rng);
        mass_matrix(&mut state, &mut m).unwrap();
        assert_relative_eq!(m, m.transpose(), epsilon = 1e-12);
        assert!(m.clone().cholesky().is_some());
    }
}

#[test]
fn round_trip_holds_for_the_floating_chain() {
    let mechanism = floating_chain(5);
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let mut rng = rand::rng();
    state.rand_configuration(&mut rng);
    state.set_velocity(&random_vector(mechanism.nv(), &mut rng)).unwrap();
    let vd = random_vector(mechanism.nv(), &mut rng);
    let mut tau = DVector::zeros(mechanism.nv());
    inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result).unwrap();
    dynamics(&mut state, &tau, &[], &mut result).unwrap();
    assert_relative_eq!(result.vd, vd, epsilon = 1e-8, max_relative = 1e-8);
}

#[test]
fn twist_predicts_the_numerical_point_velocity() {
    // Kinematic consistency: the time derivative of a body-fixed point's
    // world position, along the configuration derivative induced by `v`,
    // must match the velocity predicted by the body's twist.
    let mechanism = serial_arm();
    let mut state = MechanismState::new(&mechanism);
    let mut rng = rand::rng();
    state.rand_configuration(&mut rng);
    state.set_velocity(&random_vector(mechanism.nv(), &mut rng)).unwrap();

    let body = mechanism.nbodies() - 1;
    let frame = mechanism.bodies()[body].frame;
    let local_point = Point3::new(0.1, -0.05, 0.2);

    let before = state.transform_to_root(frame).unwrap().transform_point(&local_point);
    let twist = state.twist_wrt_world(body).unwrap();
    let predicted = twist.linear + twist.angular.cross(&before.coords);

    let dt = 1e-7;
    let mut q_dot = DVector::zeros(mechanism.nq());
    state.velocity_to_configuration_derivative(&mut q_dot).unwrap();
    let q_next = state.configuration() + dt * &q_dot;
    state.set_configuration(&q_next).unwrap();
    let after = state.transform_to_root(frame).unwrap().transform_point(&local_point);
    let numeric = (after - before) / dt;

    assert_relative_eq!(numeric, predicted, epsilon = 1e-5);
}
