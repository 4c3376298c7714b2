//! Momentum and energy of a mechanism.

use crate::errors::AlgorithmError;
use crate::state::MechanismState;
use articulated_spatial::force::Momentum;

/// Computes the total spatial momentum of the mechanism, expressed in the
/// root frame.
pub fn momentum(state: &mut MechanismState) -> Result<Momentum, AlgorithmError> {
    state.ensure_fresh()?;
    state.update_twists()?;
    state.update_inertias()?;
    let mut total = Momentum::zero(state.mechanism().root_frame());
    let twists = state.twists_wrt_world();
    for (inertia, twist) in state.inertias_world().iter().zip(twists) {
        total = total.add(&inertia.mul_twist(twist)?)?;
    }
    Ok(total)
}

/// Computes the total kinetic energy of the mechanism.
///
/// Equal to `½ vᵀ M v` for the mass matrix `M` at the same configuration.
pub fn kinetic_energy(state: &mut MechanismState) -> Result<f64, AlgorithmError> {
    state.ensure_fresh()?;
    state.update_twists()?;
    state.update_inertias()?;
    let twists = state.twists_wrt_world();
    let mut energy = 0.0;
    for (inertia, twist) in state.inertias_world().iter().zip(twists) {
        energy += inertia.kinetic_energy(twist)?;
    }
    Ok(energy)
}

/// Computes the gravitational potential energy of the mechanism, relative
/// to the root origin.
pub fn gravitational_potential_energy(
    state: &mut MechanismState,
) -> Result<f64, AlgorithmError> {
    state.ensure_fresh()?;
    state.update_inertias()?;
    let gravity = state.mechanism().gravity;
    let mut energy = 0.0;
    for inertia in state.inertias_world() {
        energy -= gravity.dot(&inertia.cross_part);
    }
    Ok(energy)
}
