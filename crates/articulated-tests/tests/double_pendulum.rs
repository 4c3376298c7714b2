//! Reference numbers for the double pendulum.

use articulated_mechanism::energy::{gravitational_potential_energy, kinetic_energy};
use articulated_mechanism::inverse_dynamics::inverse_dynamics;
use articulated_mechanism::kinematics::center_of_mass;
use articulated_mechanism::mass_matrix::mass_matrix;
use articulated_mechanism::result::DynamicsResult;
use articulated_mechanism::state::MechanismState;
use articulated_tests::double_pendulum;
use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

#[test]
fn mass_matrix_matches_the_reference_values() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    state
        .set_configuration(&DVector::from_row_slice(&[0.3, 0.4]))
        .unwrap();
    let mut m = DMatrix::zeros(2, 2);
    mass_matrix(&mut state, &mut m).unwrap();
    assert_relative_eq!(m[(0, 0)], 2.58706, epsilon = 1e-5);
    assert_relative_eq!(m[(0, 1)], 0.79353, epsilon = 1e-5);
    assert_relative_eq!(m[(1, 0)], 0.79353, epsilon = 1e-5);
    assert_relative_eq!(m[(1, 1)], 0.333, epsilon = 1e-12);
}

#[test]
fn inverse_dynamics_matches_the_reference_torques() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    state
        .set_configuration(&DVector::from_row_slice(&[0.3, 0.4]))
        .unwrap();
    state
        .set_velocity(&DVector::from_row_slice(&[1.0, 2.0]))
        .unwrap();
    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::from_row_slice(&[1.0, 2.0]);
    let mut tau = DVector::zeros(2);
    inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result).unwrap();
    assert_relative_eq!(tau[0], 10.124916, epsilon = 1e-6);
    assert_relative_eq!(tau[1], 4.814127, epsilon = 1e-6);
}

#[test]
fn hanging_configuration_needs_no_torque() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::zeros(2);
    let mut tau = DVector::zeros(2);
    inverse_dynamics(&mut state, &vd, &[], &mut tau, &mut result).unwrap();
    assert_relative_eq!(tau[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(tau[1], 0.0, epsilon = 1e-12);
}

#[test]
fn kinetic_energy_agrees_with_the_mass_matrix() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let q = DVector::from_row_slice(&[-0.7, 1.2]);
    let v = DVector::from_row_slice(&[0.9, -2.1]);
    state.set_configuration(&q).unwrap();
    state.set_velocity(&v).unwrap();
    let mut m = DMatrix::zeros(2, 2);
    mass_matrix(&mut state, &mut m).unwrap();
    let quadratic = 0.5 * (v.transpose() * &m * &v)[(0, 0)];
    let energy = kinetic_energy(&mut state).unwrap();
    assert_relative_eq!(energy, quadratic, epsilon = 1e-10);
}

#[test]
fn mass_and_potential_energy_of_the_hanging_pendulum() {
    let mechanism = double_pendulum();
    assert_relative_eq!(mechanism.mass(), 2.0);
    let mut state = MechanismState::new(&mechanism);
    // Centers of mass at z = -0.5 and z = -1.5.
    let com = center_of_mass(&mut state).unwrap();
    assert_relative_eq!(com.z, -1.0, epsilon = 1e-12);
    let pe = gravitational_potential_energy(&mut state).unwrap();
    assert_relative_eq!(pe, -19.62, epsilon = 1e-10);
}
