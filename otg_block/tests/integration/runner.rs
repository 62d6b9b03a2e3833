//! Integration test: cycle runner against the ideal plant.

use std::sync::atomic::AtomicBool;

use super::*;
use otg_block::cycle::CycleRunner;
use otg_block::plant::IdealPlant;

#[test]
fn runner_drives_plant_to_target_and_stops_generator() {
    let l = limits(2, 1.0, 2.0, 5.0);
    let mgr = started(2, &l);
    let target = at_rest(&[1.0, 0.5]);
    let plant = IdealPlant::new(at_rest(&[0.0, 0.0]), target.clone(), l.clone());
    let mut runner = CycleRunner::new(mgr, plant)
        .unwrap()
        .paced(false)
        .stop_when_finished(true);

    let running = AtomicBool::new(true);
    let stats = runner.run(Some(3000), &running).unwrap();

    let finished_at = runner.io().finished_at().expect("target not reached");
    assert_eq!(stats.cycle_count, finished_at + 1);
    assert!(!runner.manager().is_running());
    for dof in 0..2 {
        assert!((runner.io().state().position[dof] - target.position[dof]).abs() < 1e-5);
    }
}

#[test]
fn runner_without_start_reports_not_running() {
    let mgr: LifecycleManager = LifecycleManager::new(
        otg_block::config::GeneratorConfig::new(1, DT),
        otg_block::config::CheckMode::Checked,
    );
    let l = limits(1, 1.0, 2.0, 5.0);
    let plant = IdealPlant::new(at_rest(&[0.0]), at_rest(&[1.0]), l);
    let mut runner = CycleRunner::new(mgr, plant).unwrap().paced(false);
    let running = AtomicBool::new(true);
    let err = runner.run(None, &running).unwrap_err();
    assert!(err.to_string().contains("not started"));
}

#[test]
fn plant_retune_caps_velocity_from_the_next_cycle() {
    let base = limits(1, 1.0, 2.0, 5.0);
    let plant = IdealPlant::new(at_rest(&[0.0]), at_rest(&[3.0]), base.clone());
    let mut runner = CycleRunner::new(started(1, &base), plant)
        .unwrap()
        .paced(false);

    for _ in 0..120 {
        runner.step().unwrap();
    }
    assert!(runner.command().velocity[0] > 0.3);

    runner.io_mut().set_limits(limits(1, 0.3, 2.0, 5.0));
    for _ in 0..400 {
        runner.step().unwrap();
        let v = runner.command().velocity[0];
        assert!(v.abs() <= 0.3 + 1e-12, "v = {v}");
    }
    assert!(runner.io().state().position[0] > 1.0);
}
