//! Integration test: TOML file → validated config → running block.

use std::io::Write;

use super::*;
use otg_block::config::{CheckMode, load_config};
use otg_block::error::BlockConfigError;
use otg_common::config::{ConfigError, LogLevel};
use otg_common::motion::{ControlMode, DurationDiscretization, Synchronization};

const BLOCK_TOML: &str = r#"
[shared]
log_level = "debug"
service_name = "otg-test"

[block]
sample_period = 0.01
dofs = 2
control_interface = "POSITION"
synchronization = "TIME_SYNCHRONIZATION_IF_NECESSARY"
duration_discretization = "DISCRETE"

[block.limits]
max_velocity = [1.0, 1.0]
max_acceleration = [2.0, 2.0]
max_jerk = [5.0, 5.0]

[plant]
initial_position = [0.0, 0.0]
target_position = [1.0, 1.0]
"#;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn file_loads_and_drives_block() {
    let file = write_temp(BLOCK_TOML);
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.shared.log_level, LogLevel::Debug);
    assert_eq!(loaded.check_mode, CheckMode::Checked);
    assert_eq!(loaded.generator.dofs, 2);
    assert_eq!(loaded.generator.control_mode, ControlMode::Position);
    assert_eq!(loaded.generator.synchronization, Synchronization::TimeIfNecessary);
    assert_eq!(
        loaded.generator.duration_discretization,
        DurationDiscretization::Discrete
    );

    let plant = loaded.plant.as_ref().unwrap();
    let initial = plant.initial_state(2).unwrap();
    let target = plant.target_state(2).unwrap();

    let mut mgr: LifecycleManager = LifecycleManager::new(loaded.generator, loaded.check_mode);
    mgr.start(&loaded.limits).unwrap();
    let trace = closed_loop(&mut mgr, &initial, &target, &loaded.limits, 3);
    assert_eq!(trace[0].1, initial);
    assert!(trace[2].1.position[0] > 0.0);
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, BlockConfigError::File(ConfigError::FileNotFound(_))));
}

#[test]
fn unrecognized_tokens_fall_back_to_defaults() {
    let content = BLOCK_TOML
        .replace("\"POSITION\"", "\"POSITON\"")
        .replace("TIME_SYNCHRONIZATION_IF_NECESSARY", "time")
        .replace("\"DISCRETE\"", "\"discrete\"");
    let file = write_temp(&content);
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.generator.control_mode, ControlMode::Position);
    assert_eq!(loaded.generator.synchronization, Synchronization::Time);
    assert_eq!(
        loaded.generator.duration_discretization,
        DurationDiscretization::Continuous
    );
}

#[test]
fn limit_count_mismatch_in_file_is_fatal() {
    let content = BLOCK_TOML.replace("max_jerk = [5.0, 5.0]", "max_jerk = [5.0]");
    let file = write_temp(&content);
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, BlockConfigError::LimitCount { kind: "a jerk", expected: 2, actual: 1 }));
}

#[test]
fn pre_validated_file_defers_to_deployment() {
    let content = BLOCK_TOML
        .replace("max_jerk = [5.0, 5.0]", "max_jerk = [5.0]")
        .replace(
            "duration_discretization = \"DISCRETE\"",
            "duration_discretization = \"DISCRETE\"\ncheck_mode = \"pre_validated\"",
        );
    let file = write_temp(&content);
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.check_mode, CheckMode::PreValidated);
    assert_eq!(loaded.limits.max_jerk.len(), 1);

    // The first tick catches the width mismatch instead.
    let mut mgr: LifecycleManager = LifecycleManager::new(loaded.generator, loaded.check_mode);
    mgr.start(&loaded.limits).unwrap();
    let s = at_rest(&[0.0, 0.0]);
    assert!(tick(&mut mgr, &s, &s, &loaded.limits).is_err());
}
