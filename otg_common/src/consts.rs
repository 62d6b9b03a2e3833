//! System-wide constants for the OTG workspace.
//!
//! Single source of truth for capacity limits, defaults and the literal
//! configuration tokens accepted by the block.

use static_assertions::const_assert;

/// Maximum number of degrees of freedom a single block instance can drive.
///
/// All per-DOF vectors are fixed-capacity buffers of this size, so the tick
/// path never touches the heap.
pub const MAX_DOFS: usize = 64;

/// Default sample period [s] (1 kHz).
pub const DEFAULT_SAMPLE_PERIOD: f64 = 0.001;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/otg_block.toml";

/// Number of input ports: target p/v/a + current p/v/a.
pub const INPUT_PORT_COUNT: usize = 6;

/// Number of output ports: commanded p/v/a.
pub const OUTPUT_PORT_COUNT: usize = 3;

const_assert!(MAX_DOFS > 0 && MAX_DOFS <= 256);
const_assert!(INPUT_PORT_COUNT == 2 * OUTPUT_PORT_COUNT);

// ─── Configuration Tokens ───────────────────────────────────────────

/// Control interface tokens.
pub mod control_tokens {
    pub const POSITION: &str = "POSITION";
    pub const VELOCITY: &str = "VELOCITY";
}

/// Synchronization tokens.
pub mod sync_tokens {
    pub const NONE: &str = "NO_SYNCHRONIZATION";
    pub const TIME_IF_NECESSARY: &str = "TIME_SYNCHRONIZATION_IF_NECESSARY";
    pub const TIME: &str = "ONLY_TIME_SYNCHRONIZATION";
    pub const PHASE: &str = "ONLY_PHASE_SYNCHRONIZATION";
}

/// Duration discretization tokens.
pub mod duration_tokens {
    pub const CONTINUOUS: &str = "CONTINUOUS";
    pub const DISCRETE: &str = "DISCRETE";
}
