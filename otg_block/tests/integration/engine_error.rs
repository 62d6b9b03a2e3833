//! Integration test: negative result codes fail the tick and leave outputs alone.

use super::*;
use otg_block::error::TickError;
use otg_block::tick::TickPhase;
use otg_common::motion::ResultCode;

/// Steady tick into pre-filled output buffers.
fn steady_tick_into(
    mgr: &mut LifecycleManager,
    target: &KinematicState,
    current: &KinematicState,
    constraints: &ConstraintSet,
    out: &mut KinematicState,
) -> Result<TickOutcome, TickError> {
    mgr.tick(
        &TickInputs::from_states(target, current),
        constraints,
        &mut TickOutputs::from_state(out),
    )
}

#[test]
fn zero_limit_on_steady_tick_reports_code_and_keeps_outputs() {
    let l = limits(2, 1.0, 2.0, 5.0);
    let mut mgr = started(2, &l);
    let current = at_rest(&[0.0, 0.0]);
    let target = at_rest(&[1.0, 1.0]);
    tick(&mut mgr, &target, &current, &l).unwrap();

    let mut zero_jerk = l.clone();
    zero_jerk.max_jerk[1] = 0.0;
    let sentinel = state(&[7.0, 7.0], &[8.0, 8.0], &[9.0, 9.0]);
    let mut out = sentinel.clone();
    let err = steady_tick_into(&mut mgr, &target, &current, &zero_jerk, &mut out).unwrap_err();

    assert_eq!(err, TickError::Engine(ResultCode::ErrorZeroLimits));
    assert_eq!(err.result_code().map(ResultCode::code), Some(-104));
    assert_eq!(out, sentinel);
}

#[test]
fn non_finite_feedback_is_invalid_input() {
    let l = limits(1, 1.0, 2.0, 5.0);
    let mut mgr = started(1, &l);
    let target = at_rest(&[1.0]);
    tick(&mut mgr, &target, &at_rest(&[0.0]), &l).unwrap();

    let broken = state(&[f64::NAN], &[0.0], &[0.0]);
    let mut out = at_rest(&[0.5]);
    let err = steady_tick_into(&mut mgr, &target, &broken, &l, &mut out).unwrap_err();
    assert_eq!(err, TickError::Engine(ResultCode::ErrorInvalidInput));
    assert_eq!(out, at_rest(&[0.5]));
}

#[test]
fn host_decides_after_failure() {
    // The block neither retries nor halts on its own: the next tick with
    // valid limits advances normally.
    let l = limits(1, 1.0, 2.0, 5.0);
    let mut mgr = started(1, &l);
    let current = at_rest(&[0.0]);
    let target = at_rest(&[1.0]);
    tick(&mut mgr, &target, &current, &l).unwrap();
    assert!(tick(&mut mgr, &target, &current, &limits(1, 1.0, 0.0, 5.0)).is_err());
    assert_eq!(mgr.phase(), TickPhase::Steady);

    let (outcome, _) = tick(&mut mgr, &target, &current, &l).unwrap();
    assert_eq!(outcome, TickOutcome::Advanced(ResultCode::Working));
}
