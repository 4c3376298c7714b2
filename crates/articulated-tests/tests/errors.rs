//! Error paths: wrong buffer sizes, wrong frames, unknown bodies.

use articulated_mechanism::errors::AlgorithmError;
use articulated_mechanism::inverse_dynamics::inverse_dynamics;
use articulated_mechanism::mass_matrix::mass_matrix;
use articulated_mechanism::result::DynamicsResult;
use articulated_mechanism::state::MechanismState;
use articulated_spatial::force::Wrench;
use articulated_spatial::frame::FrameId;
use articulated_tests::double_pendulum;
use nalgebra::{DMatrix, DVector, Vector3};

#[test]
fn wrong_configuration_size_is_rejected() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let result = state.set_configuration(&DVector::zeros(3));
    assert!(matches!(result, Err(AlgorithmError::DimensionMismatch { .. })));
}

#[test]
fn wrong_mass_matrix_buffer_is_rejected() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let mut too_small = DMatrix::zeros(1, 1);
    let result = mass_matrix(&mut state, &mut too_small);
    assert!(matches!(result, Err(AlgorithmError::DimensionMismatch { .. })));
}

#[test]
fn external_wrench_in_a_foreign_frame_is_rejected() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::zeros(2);
    let mut tau = DVector::zeros(2);
    let foreign = Wrench::new(FrameId::fresh(), Vector3::zeros(), Vector3::z());
    let outcome = inverse_dynamics(&mut state, &vd, &[(1, foreign)], &mut tau, &mut result);
    assert!(matches!(outcome, Err(AlgorithmError::FrameMismatch(_))));
}

#[test]
fn external_wrench_on_an_unknown_body_is_rejected() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let mut result = DynamicsResult::new(&mechanism);
    let vd = DVector::zeros(2);
    let mut tau = DVector::zeros(2);
    let wrench = Wrench::zero(mechanism.root_frame());
    let outcome = inverse_dynamics(&mut state, &vd, &[(9, wrench)], &mut tau, &mut result);
    assert!(matches!(outcome, Err(AlgorithmError::UnknownBody(9))));
}

#[test]
fn unknown_frame_queries_are_rejected() {
    let mechanism = double_pendulum();
    let mut state = MechanismState::new(&mechanism);
    let outcome = state.transform_to_root(FrameId::fresh());
    assert!(matches!(outcome, Err(AlgorithmError::UnknownFrame(_))));
}
