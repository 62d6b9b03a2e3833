//! Integration test: two DOFs from rest to 1.0 with vel/acc/jerk = 1/2/5, dt = 10 ms.

use super::*;
use otg_common::motion::ResultCode;

const VMAX: f64 = 1.0;
const AMAX: f64 = 2.0;
const JMAX: f64 = 5.0;
const EPS: f64 = 1e-9;

#[test]
fn tick_one_is_current_state_and_tick_two_moves_within_limits() {
    let l = limits(2, VMAX, AMAX, JMAX);
    let mut mgr = started(2, &l);
    let current = at_rest(&[0.0, 0.0]);
    let target = at_rest(&[1.0, 1.0]);

    let (outcome, first) = tick(&mut mgr, &target, &current, &l).unwrap();
    assert_eq!(outcome, TickOutcome::Bootstrapped);
    assert_eq!(first, current);

    let (outcome, second) = tick(&mut mgr, &target, &first, &l).unwrap();
    assert_eq!(outcome, TickOutcome::Advanced(ResultCode::Working));

    // Reachable from rest in one period under the jerk limit.
    let max_step = JMAX * DT.powi(3) / 6.0;
    for dof in 0..2 {
        let p = second.position[dof];
        assert!(p > 0.0 && p < 1.0, "dof {dof}: {p}");
        assert!(p <= max_step + EPS, "dof {dof}: {p} > {max_step}");
        assert!(second.velocity[dof] <= VMAX);
        assert!(second.acceleration[dof].abs() <= JMAX * DT + EPS);
    }
}

#[test]
fn closed_loop_reaches_target_without_violating_limits() {
    let l = limits(2, VMAX, AMAX, JMAX);
    let mut mgr = started(2, &l);
    let trace = closed_loop(&mut mgr, &at_rest(&[0.0, 0.0]), &at_rest(&[1.0, 1.0]), &l, 1500);

    let mut prev_a = [0.0, 0.0];
    for (n, (_, s)) in trace.iter().enumerate() {
        for dof in 0..2 {
            assert!(s.velocity[dof].abs() <= VMAX + EPS, "tick {n} dof {dof}");
            assert!(s.acceleration[dof].abs() <= AMAX + EPS, "tick {n} dof {dof}");
            let jerk = (s.acceleration[dof] - prev_a[dof]) / DT;
            assert!(jerk.abs() <= JMAX + 1e-6, "tick {n} dof {dof}: jerk {jerk}");
            prev_a[dof] = s.acceleration[dof];
        }
    }

    let finished = trace.iter().position(|(o, _)| o.is_finished());
    let finished = finished.expect("target not reached in 15 s");
    let (_, end) = &trace[finished];
    for dof in 0..2 {
        assert!((end.position[dof] - 1.0).abs() < 1e-5);
    }
}

#[test]
fn moving_target_is_met_and_reported_finished() {
    let l = limits(1, VMAX, AMAX, JMAX);
    let mut mgr = started(1, &l);
    let target = state(&[1.0], &[0.5], &[0.0]);
    let trace = closed_loop(&mut mgr, &at_rest(&[0.0]), &target, &l, 800);

    let landed_at = trace
        .iter()
        .position(|(outcome, _)| outcome.is_finished())
        .expect("moving target never reached");
    let (_, s) = &trace[landed_at];
    assert!((s.position[0] - 1.0).abs() <= 1e-6, "p = {}", s.position[0]);
    assert!((s.velocity[0] - 0.5).abs() <= 1e-6, "v = {}", s.velocity[0]);
    assert!(trace[landed_at..].iter().all(|(outcome, _)| outcome.is_finished()));
    for (n, (_, s)) in trace.iter().enumerate() {
        assert!(s.velocity[0].abs() <= VMAX + EPS, "tick {n}");
        assert!(s.acceleration[0].abs() <= AMAX + EPS, "tick {n}");
    }
}
