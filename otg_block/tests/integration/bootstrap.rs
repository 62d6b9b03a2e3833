//! Integration test: the first tick after start or restart passes feedback through.

use super::*;
use otg_block::config::{CheckMode, GeneratorConfig};
use otg_block::tick::TickPhase;
use otg_common::motion::{ControlMode, DurationDiscretization, Synchronization};

#[test]
fn first_tick_is_feedback_for_every_configuration() {
    let controls = [ControlMode::Position, ControlMode::Velocity];
    let syncs = [
        Synchronization::None,
        Synchronization::TimeIfNecessary,
        Synchronization::Time,
        Synchronization::Phase,
    ];
    let durations = [DurationDiscretization::Continuous, DurationDiscretization::Discrete];

    for dofs in [1usize, 3, 7] {
        for control in controls {
            for sync in syncs {
                for duration in durations {
                    let config = GeneratorConfig::new(dofs, DT)
                        .with_control_mode(control)
                        .with_synchronization(sync)
                        .with_duration_discretization(duration);
                    let initial = limits(dofs, 1.0, 2.0, 5.0);
                    let mut mgr: LifecycleManager = LifecycleManager::new(config, CheckMode::Checked);
                    mgr.start(&initial).unwrap();

                    let p: Vec<f64> = (0..dofs).map(|i| 0.1 * i as f64 - 0.2).collect();
                    let v: Vec<f64> = (0..dofs).map(|i| 0.05 * i as f64).collect();
                    let a: Vec<f64> = (0..dofs).map(|i| -0.3 * i as f64).collect();
                    let current = state(&p, &v, &a);
                    let target = at_rest(&vec![5.0; dofs]);

                    let (outcome, out) = tick(&mut mgr, &target, &current, &initial).unwrap();
                    assert_eq!(outcome, TickOutcome::Bootstrapped);
                    assert_eq!(out, current, "dofs={dofs} {control:?} {sync:?} {duration:?}");
                    assert_eq!(mgr.phase(), TickPhase::Steady);
                }
            }
        }
    }
}

#[test]
fn bootstrap_does_not_consult_limits_values() {
    let mut mgr = started(2, &limits(2, 1.0, 2.0, 5.0));
    let current = state(&[0.4, -0.4], &[0.2, 0.0], &[0.0, 0.0]);
    let target = at_rest(&[1.0, 1.0]);
    let (outcome, out) = tick(&mut mgr, &target, &current, &limits(2, 0.0, 0.0, 0.0)).unwrap();
    assert_eq!(outcome, TickOutcome::Bootstrapped);
    assert_eq!(out, current);
    assert_eq!(
        mgr.instance().map(|i| i.engine().calculations()),
        Some(0),
        "engine must not run on the bootstrap tick"
    );
}

#[test]
fn restart_bootstraps_again_after_steady() {
    let l = limits(1, 1.0, 2.0, 5.0);
    let mut mgr = started(1, &l);
    let target = at_rest(&[1.0]);
    let trace = closed_loop(&mut mgr, &at_rest(&[0.0]), &target, &l, 50);
    assert!(matches!(trace[49].0, TickOutcome::Advanced(_)));

    mgr.restart();
    assert_eq!(mgr.phase(), TickPhase::Bootstrap);

    // Feedback unrelated to the last command still comes out verbatim.
    let feedback = state(&[-3.0], &[0.7], &[1.5]);
    let (outcome, out) = tick(&mut mgr, &target, &feedback, &l).unwrap();
    assert_eq!(outcome, TickOutcome::Bootstrapped);
    assert_eq!(out, feedback);

    let (outcome, _) = tick(&mut mgr, &target, &feedback, &l).unwrap();
    assert!(matches!(outcome, TickOutcome::Advanced(_)));
}
