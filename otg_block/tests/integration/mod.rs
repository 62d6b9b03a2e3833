//! Shared fixtures for the integration suite.

mod binary;
mod bootstrap;
mod config_file;
mod engine_error;
mod lifecycle;
mod runner;
mod scenario;

use otg_block::config::{CheckMode, GeneratorConfig};
use otg_block::error::TickError;
use otg_block::lifecycle::LifecycleManager;
use otg_block::tick::{TickInputs, TickOutcome, TickOutputs};
use otg_common::motion::{ConstraintSet, KinematicState};

pub const DT: f64 = 0.01;

pub fn state(p: &[f64], v: &[f64], a: &[f64]) -> KinematicState {
    KinematicState::from_slices(p, v, a).unwrap()
}

pub fn at_rest(p: &[f64]) -> KinematicState {
    let zeros = vec![0.0; p.len()];
    state(p, &zeros, &zeros)
}

pub fn limits(dofs: usize, vel: f64, acc: f64, jerk: f64) -> ConstraintSet {
    ConstraintSet::uniform(dofs, vel, acc, jerk).unwrap()
}

pub fn started(dofs: usize, initial: &ConstraintSet) -> LifecycleManager {
    let mut mgr = LifecycleManager::new(GeneratorConfig::new(dofs, DT), CheckMode::Checked);
    mgr.start(initial).unwrap();
    mgr
}

/// One tick through the manager, returning the commanded state.
pub fn tick(
    mgr: &mut LifecycleManager,
    target: &KinematicState,
    current: &KinematicState,
    constraints: &ConstraintSet,
) -> Result<(TickOutcome, KinematicState), TickError> {
    let mut out = KinematicState::zeroed(current.dofs()).unwrap();
    let outcome = mgr.tick(
        &TickInputs::from_states(target, current),
        constraints,
        &mut TickOutputs::from_state(&mut out),
    )?;
    Ok((outcome, out))
}

/// Closed loop against an ideal plant; returns every command.
pub fn closed_loop(
    mgr: &mut LifecycleManager,
    initial: &KinematicState,
    target: &KinematicState,
    constraints: &ConstraintSet,
    ticks: usize,
) -> Vec<(TickOutcome, KinematicState)> {
    let mut current = initial.clone();
    let mut trace = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        let (outcome, next) = tick(mgr, target, &current, constraints).unwrap();
        current.clone_from(&next);
        trace.push((outcome, next));
    }
    trace
}
