//! Floating-base chain at humanoid-like depth: all three algorithms run and
//! agree at a random state.

use articulated_mechanism::dynamics::dynamics;
use articulated_mechanism::energy::kinetic_energy;
use articulated_mechanism::inverse_dynamics::inverse_dynamics;
use articulated_mechanism::mass_matrix::mass_matrix;
use articulated_mechanism::result::DynamicsResult;
use articulated_mechanism::state::MechanismState;
use articulated_tests::floating_chain;
use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use rand::Rng;

#[test]
fn floating_base_chain_runs_all_algorithms() {
    let mechanism = floating_chain(30);
    assert_eq!(mechanism.nq(), 7 + 30);
    assert_eq!(mechanism.nv(), 6 + 30);

    let mut state = MechanismState::new(&mechanism);
    let mut rng = rand::rng();
    state.rand_configuration(&mut rng);
    let v = DVector::from_fn(mechanism.nv(), |_, _| rng.random_range(-1.0..1.0));
    state.set_velocity(&v).unwrap();

    let mut m = DMatrix::zeros(mechanism.nv(), mechanism.nv());
    mass_matrix(&mut state, &mut m).unwrap();
    assert_relative_eq!(m, m.transpose(), epsilon = 1e-10);
    assert!(m.clone().cholesky().is_some(), "mass matrix must be PD");

    // Kinetic energy agrees with the quadratic form.
    let quadratic = 0.5 * (v.transpose() * &m * &v)[(0, 0)];
    assert_relative_eq!(kinetic_energy(&mut state).unwrap(), quadratic, epsilon = 1e-8);

    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::from_fn(mechanism.nv(), |_, _| rng.random_range(-1.0..1.0));
    let mut tau = DVector::zeros(mechanism.nv());
    inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result).unwrap();
    dynamics(&mut state, &tau, &[], &mut result).unwrap();
    assert_relative_eq!(result.vd, vd, epsilon = 1e-7, max_relative = 1e-7);
}

#[test]
fn quaternion_segments_normalize_to_unit_length() {
    let mechanism = floating_chain(3);
    let mut state = MechanismState::new(&mechanism);
    let mut rng = rand::rng();
    state.rand_configuration(&mut rng);

    // Denormalize the floating-base quaternion, then normalize the whole
    // configuration.
    let mut q = state.configuration().clone();
    for i in 0..4 {
        q[i] *= 3.7;
    }
    state.set_configuration(&q).unwrap();
    state.normalize_configuration().unwrap();
    let q = state.configuration();
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
}
