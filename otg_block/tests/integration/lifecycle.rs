//! Integration test: one create per start, one destroy per stop, no ticks
//! without an instance.

use super::*;
use otg_block::config::{CheckMode, GeneratorConfig};
use otg_block::error::{BlockConfigError, TickError};
use otg_block::tick::TickPhase;
use otg_common::consts::MAX_DOFS;

#[test]
fn configuration_errors_prevent_any_tick() {
    let cases: [(GeneratorConfig, ConstraintSet); 4] = [
        (GeneratorConfig::new(0, DT), limits(0, 1.0, 1.0, 1.0)),
        (GeneratorConfig::new(2, -0.001), limits(2, 1.0, 1.0, 1.0)),
        (GeneratorConfig::new(2, DT), ConstraintSet::from_slices(&[1.0, 1.0], &[1.0], &[1.0, 1.0]).unwrap()),
        (GeneratorConfig::new(MAX_DOFS + 1, DT), limits(2, 1.0, 1.0, 1.0)),
    ];
    for (config, l) in cases {
        let mut mgr: LifecycleManager = LifecycleManager::new(config, CheckMode::Checked);
        assert!(mgr.start(&l).is_err(), "{config:?}");
        assert!(!mgr.is_running());
        let s = at_rest(&[0.0, 0.0]);
        assert_eq!(tick(&mut mgr, &s, &s, &limits(2, 1.0, 1.0, 1.0)).unwrap_err(), TickError::NotRunning);
    }
}

#[test]
fn limit_count_errors_name_the_limit() {
    let config = GeneratorConfig::new(2, DT);
    let two = [1.0, 1.0];
    let one = [1.0];
    let expect = |v: &[f64], a: &[f64], j: &[f64], kind: &str| {
        let mut mgr: LifecycleManager = LifecycleManager::new(config, CheckMode::Checked);
        let err = mgr.start(&ConstraintSet::from_slices(v, a, j).unwrap()).unwrap_err();
        assert!(
            err.to_string().starts_with(&format!("Each DoF must have {kind} limit defined")),
            "{err}"
        );
    };
    expect(&one, &two, &two, "a velocity");
    expect(&two, &one, &two, "an acceleration");
    expect(&two, &two, &one, "a jerk");
}

#[test]
fn sample_period_error_message() {
    let mut mgr: LifecycleManager = LifecycleManager::new(GeneratorConfig::new(1, -1.0), CheckMode::Checked);
    let err = mgr.start(&limits(1, 1.0, 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, BlockConfigError::InvalidSamplePeriod(p) if p == -1.0));
    assert!(err.to_string().contains("Sample time must be a positive scalar"));
}

#[test]
fn stop_then_tick_is_not_running_and_start_again_bootstraps() {
    let l = limits(1, 1.0, 2.0, 5.0);
    let mut mgr = started(1, &l);
    let s = at_rest(&[0.2]);
    tick(&mut mgr, &at_rest(&[1.0]), &s, &l).unwrap();
    mgr.stop();
    assert_eq!(tick(&mut mgr, &s, &s, &l).unwrap_err(), TickError::NotRunning);

    mgr.start(&l).unwrap();
    assert_eq!(mgr.phase(), TickPhase::Bootstrap);
    let (outcome, out) = tick(&mut mgr, &at_rest(&[1.0]), &s, &l).unwrap();
    assert_eq!(outcome, TickOutcome::Bootstrapped);
    assert_eq!(out, s);
}

#[test]
fn full_capacity_runs() {
    let l = limits(MAX_DOFS, 1.0, 2.0, 5.0);
    let mut mgr = started(MAX_DOFS, &l);
    let target = at_rest(&vec![0.5; MAX_DOFS]);
    let trace = closed_loop(&mut mgr, &at_rest(&vec![0.0; MAX_DOFS]), &target, &l, 10);
    assert_eq!(trace.len(), 10);
    assert!(trace[9].1.position.iter().all(|p| *p > 0.0));
}
