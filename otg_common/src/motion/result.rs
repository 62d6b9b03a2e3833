//! Outcome of one generator step.

use serde::{Deserialize, Serialize};

/// Result of a single-period generator advance.
///
/// Codes `>= 0` are success, codes `< 0` are unrecoverable for the tick.
/// The numeric values are part of the host contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResultCode {
    /// Trajectory computed, target not yet reached.
    Working = 0,
    /// Target state reached.
    Finished = 1,
    /// Unclassified error.
    Error = -1,
    /// Request is malformed (non-finite values, wrong sizes).
    ErrorInvalidInput = -100,
    /// Trajectory duration exceeds what the engine can represent.
    ErrorTrajectoryDuration = -101,
    /// Position limits cannot be kept.
    ErrorPositionalLimits = -102,
    /// A zero limit makes the target unreachable.
    ErrorZeroLimits = -104,
    /// Per-DOF minimum time could not be computed.
    ErrorExecutionTimeCalculation = -110,
    /// Common duration for synchronized DOFs could not be found.
    ErrorSynchronizationCalculation = -111,
}

impl ResultCode {
    /// Raw integer code.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Convert from a raw code. Unknown negative codes map to [`ResultCode::Error`],
    /// unknown positive codes to [`ResultCode::Working`].
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Working,
            1 => Self::Finished,
            -100 => Self::ErrorInvalidInput,
            -101 => Self::ErrorTrajectoryDuration,
            -102 => Self::ErrorPositionalLimits,
            -104 => Self::ErrorZeroLimits,
            -110 => Self::ErrorExecutionTimeCalculation,
            -111 => Self::ErrorSynchronizationCalculation,
            c if c < 0 => Self::Error,
            _ => Self::Working,
        }
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.code() < 0
    }

    #[inline]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}
