//! Errors raised while building or filling per-DOF motion records.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// More DOFs requested than a fixed-capacity buffer can hold.
    #[error("{requested} DOFs exceed capacity of {capacity}")]
    Capacity { requested: usize, capacity: usize },

    /// A per-DOF vector does not match the configured DOF count.
    #[error("{field}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A limit entry is negative or not a number.
    #[error("{field}[{dof}] = {value} must be a non-negative number")]
    InvalidLimit {
        field: &'static str,
        dof: usize,
        value: f64,
    },
}
