//! Error types for the trajectory generator block.
//!
//! Two classes, matching when they can happen:
//! - [`BlockConfigError`]: detected while loading or creating the generator.
//!   Fatal to loop start: no tick may run.
//! - [`TickError`]: a single tick failed. Reported upward immediately; the
//!   block never retries and never substitutes an output.
//!
//! [`CycleError`] is raised by the fixed-period runner.

use otg_common::config::ConfigError;
use otg_common::motion::{MotionError, ResultCode};
use thiserror::Error;

/// Configuration error raised at load or generator creation.
#[derive(Debug, Clone, Error)]
pub enum BlockConfigError {
    /// Config file could not be read or parsed.
    #[error(transparent)]
    File(#[from] ConfigError),

    #[error("Number of DoFs must be a positive integer (got {0})")]
    NonPositiveDofs(i64),

    #[error("Number of DoFs {requested} exceeds the supported maximum of {capacity}")]
    TooManyDofs { requested: usize, capacity: usize },

    #[error("Sample time must be a positive scalar (got {0})")]
    InvalidSamplePeriod(f64),

    #[error("Each DoF must have {kind} limit defined (expected {expected}, got {actual})")]
    LimitCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("limit rejected: {0}")]
    Limit(MotionError),

    /// Plant section of the config file does not match the DOF count.
    #[error("plant: {0}")]
    Plant(MotionError),

    /// Generator records could not be sized.
    #[error("generator allocation failed: {0}")]
    Allocation(MotionError),
}

/// Failure of a single tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    /// The engine returned a negative result code.
    #[error("trajectory generator failed: {0}")]
    Engine(ResultCode),

    /// An input or output signal vector has the wrong width.
    #[error("signal width: {0}")]
    Signal(MotionError),

    /// A tuned constraint vector has the wrong width.
    #[error("constraint width: {0}")]
    Constraints(MotionError),

    /// Tick requested while no generator instance exists.
    #[error("no generator instance: block not started")]
    NotRunning,
}

impl TickError {
    /// Raw engine code, if this is an engine failure.
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            Self::Engine(rc) => Some(*rc),
            _ => None,
        }
    }
}

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Sample period cannot be turned into a cycle time.
    #[error("invalid cycle period: {0} s")]
    InvalidPeriod(f64),

    /// Generator or plant could not be set up from the configuration.
    #[error("setup failed: {0}")]
    Config(#[from] BlockConfigError),

    #[error("tick failed: {0}")]
    Tick(#[from] TickError),

    /// Cycle body exceeded its budget.
    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun {
        /// Actual cycle duration [ns].
        actual_ns: i64,
        /// Configured cycle budget [ns].
        budget_ns: i64,
    },
}
