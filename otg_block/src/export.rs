//! Static block metadata for host code-generation paths.
//!
//! Purely descriptive: nothing here affects tick behavior. The descriptor
//! lists the persistent work records, the port layout, the parameter
//! tunability table and, for a concrete configuration, the parameter values
//! a generated-code host must carry.

use serde::Serialize;

use crate::config::GeneratorConfig;
use otg_common::consts::{INPUT_PORT_COUNT, OUTPUT_PORT_COUNT};
use otg_common::motion::ConstraintSet;

// ─── Work Records ───────────────────────────────────────────────────

/// How a persistent resource is stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    /// One integer slot.
    IntegerFlag,
    /// One opaque handle to a block-owned object.
    OpaqueHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkRecord {
    pub name: &'static str,
    pub storage: StorageClass,
}

/// Tick phase flag, then engine, request and response handles.
pub const WORK_RECORDS: [WorkRecord; 4] = [
    WorkRecord {
        name: "BlockInit",
        storage: StorageClass::IntegerFlag,
    },
    WorkRecord {
        name: "Generator",
        storage: StorageClass::OpaqueHandle,
    },
    WorkRecord {
        name: "Request",
        storage: StorageClass::OpaqueHandle,
    },
    WorkRecord {
        name: "Response",
        storage: StorageClass::OpaqueHandle,
    },
];

// ─── Ports ──────────────────────────────────────────────────────────

/// One signal port, `dofs` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortSpec {
    pub index: usize,
    pub name: &'static str,
    /// Output on the same tick depends on this input.
    pub direct_feedthrough: bool,
}

/// Input ports in host order. Only the current state feeds straight through
/// (bootstrap tick).
pub const INPUT_PORTS: [PortSpec; INPUT_PORT_COUNT] = [
    PortSpec { index: 0, name: "target_position", direct_feedthrough: false },
    PortSpec { index: 1, name: "target_velocity", direct_feedthrough: false },
    PortSpec { index: 2, name: "target_acceleration", direct_feedthrough: false },
    PortSpec { index: 3, name: "current_position", direct_feedthrough: true },
    PortSpec { index: 4, name: "current_velocity", direct_feedthrough: true },
    PortSpec { index: 5, name: "current_acceleration", direct_feedthrough: true },
];

pub const OUTPUT_PORTS: [PortSpec; OUTPUT_PORT_COUNT] = [
    PortSpec { index: 0, name: "position", direct_feedthrough: false },
    PortSpec { index: 1, name: "velocity", direct_feedthrough: false },
    PortSpec { index: 2, name: "acceleration", direct_feedthrough: false },
];

// ─── Parameters ─────────────────────────────────────────────────────

/// Block dialog parameter and whether it may change while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub index: usize,
    pub name: &'static str,
    pub tunable: bool,
}

pub const PARAMETERS: [ParameterSpec; 8] = [
    ParameterSpec { index: 0, name: "SampleTime", tunable: false },
    ParameterSpec { index: 1, name: "NumberOfDoFs", tunable: false },
    ParameterSpec { index: 2, name: "VelLimit", tunable: true },
    ParameterSpec { index: 3, name: "AccLimit", tunable: true },
    ParameterSpec { index: 4, name: "JrkLimit", tunable: true },
    ParameterSpec { index: 5, name: "ControlInterface", tunable: false },
    ParameterSpec { index: 6, name: "Synchronization", tunable: false },
    ParameterSpec { index: 7, name: "DurationDiscretization", tunable: false },
];

// ─── Descriptor ─────────────────────────────────────────────────────

/// Tunable parameter with its current per-DOF values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunableRecord {
    pub name: &'static str,
    pub values: Vec<f64>,
}

/// Fixed setting value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Real(f64),
    Integer(usize),
    Token(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingRecord {
    pub name: &'static str,
    pub value: SettingValue,
}

/// Everything a generated-code host needs to reproduce one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDescriptor {
    pub work: Vec<WorkRecord>,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub port_width: usize,
    pub parameters: Vec<ParameterSpec>,
    pub tunable: Vec<TunableRecord>,
    pub settings: Vec<SettingRecord>,
}

impl ExportDescriptor {
    /// Describe a block configured with `config` and the current `limits`.
    pub fn describe(config: &GeneratorConfig, limits: &ConstraintSet) -> Self {
        Self {
            work: WORK_RECORDS.to_vec(),
            inputs: INPUT_PORTS.to_vec(),
            outputs: OUTPUT_PORTS.to_vec(),
            port_width: config.dofs,
            parameters: PARAMETERS.to_vec(),
            tunable: vec![
                TunableRecord {
                    name: "VelLimit",
                    values: limits.max_velocity.to_vec(),
                },
                TunableRecord {
                    name: "AccLimit",
                    values: limits.max_acceleration.to_vec(),
                },
                TunableRecord {
                    name: "JrkLimit",
                    values: limits.max_jerk.to_vec(),
                },
            ],
            settings: vec![
                SettingRecord {
                    name: "SampleTime",
                    value: SettingValue::Real(config.sample_period),
                },
                SettingRecord {
                    name: "NumberOfDoFs",
                    value: SettingValue::Integer(config.dofs),
                },
                SettingRecord {
                    name: "ControlInterface",
                    value: SettingValue::Token(config.control_mode.as_token()),
                },
                SettingRecord {
                    name: "Synchronization",
                    value: SettingValue::Token(config.synchronization.as_token()),
                },
                SettingRecord {
                    name: "DurationDiscretization",
                    value: SettingValue::Token(config.duration_discretization.as_token()),
                },
            ],
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
