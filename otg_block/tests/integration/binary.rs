//! Integration test: the standalone binary's flow against the shipped config.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use super::*;
use otg_block::config::{LoadedConfig, load_config, load_config_from_str};
use otg_block::export::ExportDescriptor;
use otg_block::plant::standalone_runner;
use otg_common::consts::DEFAULT_CONFIG_PATH;
use otg_common::motion::ResultCode;

fn shipped_config() -> LoadedConfig {
    load_config(&Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH)).unwrap()
}

#[test]
fn shipped_config_drives_plant_to_its_target() {
    let loaded = shipped_config();
    let target = loaded.plant.as_ref().unwrap().target_state(loaded.generator.dofs).unwrap();

    let mut runner = standalone_runner(&loaded)
        .unwrap()
        .paced(false)
        .stop_when_finished(true);
    assert!(runner.manager().is_running());

    let running = AtomicBool::new(true);
    let stats = runner.run(Some(3000), &running).unwrap();

    let finished_at = runner.io().finished_at().expect("target not reached");
    assert_eq!(stats.cycle_count, finished_at + 1);
    assert!(!runner.manager().is_running());
    for (dof, goal) in target.position.iter().enumerate() {
        assert!((runner.io().state().position[dof] - goal).abs() < 1e-5, "dof {dof}");
    }
}

#[test]
fn shipped_config_exports_its_limits() {
    let loaded = shipped_config();
    let json = ExportDescriptor::describe(&loaded.generator, &loaded.limits)
        .to_json()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["port_width"], 2);
    assert_eq!(value["tunable"][0]["name"], "VelLimit");
    assert_eq!(value["tunable"][2]["values"][1], 5.0);
}

#[test]
fn missing_plant_table_holds_the_origin() {
    let loaded = load_config_from_str(
        r#"
[shared]
service_name = "otg-origin"

[block]
sample_period = 0.01
dofs = 3

[block.limits]
max_velocity = [1.0, 1.0, 1.0]
max_acceleration = [2.0, 2.0, 2.0]
max_jerk = [5.0, 5.0, 5.0]
"#,
    )
    .unwrap();
    assert!(loaded.plant.is_none());

    let mut runner = standalone_runner(&loaded).unwrap().paced(false);
    assert_eq!(runner.step().unwrap(), TickOutcome::Bootstrapped);
    assert_eq!(
        runner.step().unwrap(),
        TickOutcome::Advanced(ResultCode::Finished)
    );
    assert_eq!(runner.io().state(), &at_rest(&[0.0, 0.0, 0.0]));
    assert_eq!(runner.io().finished_at(), Some(1));
}

#[test]
fn plant_width_mismatch_is_a_setup_error() {
    let mut loaded = shipped_config();
    if let Some(plant) = loaded.plant.as_mut() {
        plant.target_position.push(0.0);
    }
    let err = standalone_runner(&loaded).err().expect("mismatched plant accepted");
    assert!(err.to_string().contains("target_position"), "{err}");
}
