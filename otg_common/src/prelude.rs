//! Prelude module for common re-exports.
//!
//! ```rust
//! use otg_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_SAMPLE_PERIOD, MAX_DOFS};

// ─── Motion Types ───────────────────────────────────────────────────
pub use crate::motion::{
    ConstraintSet, ControlMode, DofVec, DurationDiscretization, KinematicState, MotionError,
    ResultCode, Synchronization,
};
