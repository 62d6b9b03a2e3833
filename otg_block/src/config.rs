//! TOML configuration loader with validation.
//!
//! The block file has three tables:
//!
//! ```toml
//! [shared]
//! service_name = "otg-block"
//!
//! [block]
//! sample_period = 0.001
//! dofs = 2
//! control_interface = "POSITION"
//! synchronization = "ONLY_TIME_SYNCHRONIZATION"
//! duration_discretization = "CONTINUOUS"
//! check_mode = "checked"
//!
//! [block.limits]
//! max_velocity = [1.0, 1.0]
//! max_acceleration = [2.0, 2.0]
//! max_jerk = [5.0, 5.0]
//!
//! [plant]            # optional, used by the standalone runner
//! initial_position = [0.0, 0.0]
//! target_position = [1.0, 1.0]
//! ```
//!
//! Mode tokens resolve through the total mappings in
//! [`otg_common::motion::modes`]; an unrecognized token silently becomes the
//! selector's default. Parameter checks run only in [`CheckMode::Checked`];
//! [`CheckMode::PreValidated`] assumes a deployment toolchain already did them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use otg_common::config::{ConfigLoader, SharedConfig};
use otg_common::consts::{
    DEFAULT_SAMPLE_PERIOD, MAX_DOFS, control_tokens, duration_tokens, sync_tokens,
};
use otg_common::motion::{
    ConstraintSet, ControlMode, DurationDiscretization, KinematicState, MotionError,
    Synchronization, dof_vec_zeroed,
};

use crate::error::BlockConfigError;

// ─── Raw File Layout ────────────────────────────────────────────────

/// Whether creation-time parameter checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Development: every configuration check runs before the loop starts.
    #[default]
    Checked,
    /// Deployed: parameters were validated upstream; only the checks needed
    /// to size the generator run.
    PreValidated,
}

/// Tunable limit vectors as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitConfig {
    pub max_velocity: Vec<f64>,
    pub max_acceleration: Vec<f64>,
    pub max_jerk: Vec<f64>,
}

/// `[block]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockConfig {
    /// Sample period [s]. Not tunable.
    #[serde(default = "default_sample_period")]
    pub sample_period: f64,

    /// Number of DOFs. Signed so a non-positive value reaches validation.
    pub dofs: i64,

    #[serde(default = "default_control_interface")]
    pub control_interface: String,

    #[serde(default = "default_synchronization")]
    pub synchronization: String,

    #[serde(default = "default_duration_discretization")]
    pub duration_discretization: String,

    #[serde(default)]
    pub check_mode: CheckMode,

    pub limits: LimitConfig,
}

fn default_sample_period() -> f64 {
    DEFAULT_SAMPLE_PERIOD
}
fn default_control_interface() -> String {
    control_tokens::POSITION.to_string()
}
fn default_synchronization() -> String {
    sync_tokens::TIME.to_string()
}
fn default_duration_discretization() -> String {
    duration_tokens::CONTINUOUS.to_string()
}

/// `[plant]` table: initial feedback and motion target for the standalone runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    pub initial_position: Vec<f64>,
    pub target_position: Vec<f64>,
    /// Empty means zero for every DOF.
    #[serde(default)]
    pub target_velocity: Vec<f64>,
}

impl PlantConfig {
    /// Initial feedback state: given positions, at rest.
    pub fn initial_state(&self, dofs: usize) -> Result<KinematicState, BlockConfigError> {
        plant_state("initial_position", &self.initial_position, &[], dofs)
    }

    /// Motion target; acceleration target is zero.
    pub fn target_state(&self, dofs: usize) -> Result<KinematicState, BlockConfigError> {
        plant_state(
            "target_position",
            &self.target_position,
            &self.target_velocity,
            dofs,
        )
    }
}

fn plant_state(
    field: &'static str,
    position: &[f64],
    velocity: &[f64],
    dofs: usize,
) -> Result<KinematicState, BlockConfigError> {
    if position.len() != dofs {
        return Err(BlockConfigError::Plant(MotionError::LengthMismatch {
            field,
            expected: dofs,
            actual: position.len(),
        }));
    }
    let zeros = dof_vec_zeroed(dofs).map_err(BlockConfigError::Plant)?;
    let velocity = if velocity.is_empty() { &zeros[..] } else { velocity };
    KinematicState::from_slices(position, velocity, &zeros).map_err(BlockConfigError::Plant)
}

/// Whole config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockFile {
    pub shared: SharedConfig,
    pub block: BlockConfig,
    #[serde(default)]
    pub plant: Option<PlantConfig>,
}

// ─── Resolved Generator Configuration ───────────────────────────────

/// Immutable per-run generator configuration.
///
/// Fixed when the generator is created; never mutated while the loop runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    pub dofs: usize,
    /// Sample period [s].
    pub sample_period: f64,
    pub control_mode: ControlMode,
    pub synchronization: Synchronization,
    pub duration_discretization: DurationDiscretization,
}

impl GeneratorConfig {
    /// Configuration with the default mode selectors.
    pub fn new(dofs: usize, sample_period: f64) -> Self {
        Self {
            dofs,
            sample_period,
            control_mode: ControlMode::default(),
            synchronization: Synchronization::default(),
            duration_discretization: DurationDiscretization::default(),
        }
    }

    pub fn with_control_mode(mut self, mode: ControlMode) -> Self {
        self.control_mode = mode;
        self
    }

    pub fn with_synchronization(mut self, sync: Synchronization) -> Self {
        self.synchronization = sync;
        self
    }

    pub fn with_duration_discretization(mut self, d: DurationDiscretization) -> Self {
        self.duration_discretization = d;
        self
    }

    /// Checks that must hold for the generator records to be sized at all.
    /// Run in every [`CheckMode`].
    pub fn check_capacity(&self) -> Result<(), BlockConfigError> {
        if self.dofs == 0 {
            return Err(BlockConfigError::NonPositiveDofs(0));
        }
        if self.dofs > MAX_DOFS {
            return Err(BlockConfigError::TooManyDofs {
                requested: self.dofs,
                capacity: MAX_DOFS,
            });
        }
        Ok(())
    }

    /// Full creation-time parameter check against the initial limits.
    ///
    /// Order: sample period, DOF count, velocity/acceleration/jerk limit
    /// counts, limit values.
    pub fn validate(&self, limits: &ConstraintSet) -> Result<(), BlockConfigError> {
        check_sample_period(self.sample_period)?;
        self.check_capacity()?;

        for (kind, len) in [
            ("a velocity", limits.max_velocity.len()),
            ("an acceleration", limits.max_acceleration.len()),
            ("a jerk", limits.max_jerk.len()),
        ] {
            if len != self.dofs {
                return Err(BlockConfigError::LimitCount {
                    kind,
                    expected: self.dofs,
                    actual: len,
                });
            }
        }

        limits.validate(self.dofs).map_err(BlockConfigError::Limit)
    }
}

fn check_sample_period(period: f64) -> Result<(), BlockConfigError> {
    if period.is_finite() && period > 0.0 {
        Ok(())
    } else {
        Err(BlockConfigError::InvalidSamplePeriod(period))
    }
}

impl BlockConfig {
    /// Resolve tokens and limits into a [`GeneratorConfig`] + initial [`ConstraintSet`].
    ///
    /// Checks run in the same order as [`GeneratorConfig::validate`], so a file
    /// with several problems always reports the sample period first.
    pub fn resolve(&self) -> Result<(GeneratorConfig, ConstraintSet), BlockConfigError> {
        if self.check_mode == CheckMode::Checked {
            check_sample_period(self.sample_period)?;
        }
        if self.dofs < 1 {
            return Err(BlockConfigError::NonPositiveDofs(self.dofs));
        }
        let generator = GeneratorConfig {
            dofs: self.dofs as usize,
            sample_period: self.sample_period,
            control_mode: resolve_token(
                "control_interface",
                &self.control_interface,
                ControlMode::parse_token,
                ControlMode::from_token,
            ),
            synchronization: resolve_token(
                "synchronization",
                &self.synchronization,
                Synchronization::parse_token,
                Synchronization::from_token,
            ),
            duration_discretization: resolve_token(
                "duration_discretization",
                &self.duration_discretization,
                DurationDiscretization::parse_token,
                DurationDiscretization::from_token,
            ),
        };
        generator.check_capacity()?;

        let limits = ConstraintSet::from_slices(
            &self.limits.max_velocity,
            &self.limits.max_acceleration,
            &self.limits.max_jerk,
        )
        .map_err(BlockConfigError::Limit)?;

        if self.check_mode == CheckMode::Checked {
            generator.validate(&limits)?;
        }

        Ok((generator, limits))
    }
}

/// Total mapping of `token`; a miss is logged at DEBUG and nothing else.
fn resolve_token<T: std::fmt::Debug>(
    name: &str,
    token: &str,
    parse: fn(&str) -> Option<T>,
    total: fn(&str) -> T,
) -> T {
    let value = total(token);
    if parse(token).is_none() {
        debug!("{name}: unrecognized token {token:?}, using {value:?}");
    }
    value
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub shared: SharedConfig,
    pub generator: GeneratorConfig,
    pub limits: ConstraintSet,
    pub check_mode: CheckMode,
    pub plant: Option<PlantConfig>,
}

impl LoadedConfig {
    fn from_file(file: BlockFile) -> Result<Self, BlockConfigError> {
        file.shared.validate()?;
        let (generator, limits) = file.block.resolve()?;
        Ok(Self {
            shared: file.shared,
            generator,
            limits,
            check_mode: file.block.check_mode,
            plant: file.plant,
        })
    }
}

/// Load and validate the block configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, BlockConfigError> {
    LoadedConfig::from_file(BlockFile::load(path)?)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, BlockConfigError> {
    LoadedConfig::from_file(BlockFile::parse(content)?)
}

// ─── Tests ──────────────────────────────────────────────────────────
