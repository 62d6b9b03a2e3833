//! Tunable per-DOF kinematic limits.

use serde::{Deserialize, Serialize};

use super::{DofVec, MotionError, dof_vec_from_slice};

/// Maximum velocity, acceleration and jerk, one entry per DOF.
///
/// Limits are tunable: the block re-reads the whole set once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub max_velocity: DofVec,
    pub max_acceleration: DofVec,
    pub max_jerk: DofVec,
}

impl ConstraintSet {
    /// Build a constraint set from slices. Lengths are checked by [`validate`](Self::validate).
    pub fn from_slices(
        max_velocity: &[f64],
        max_acceleration: &[f64],
        max_jerk: &[f64],
    ) -> Result<Self, MotionError> {
        Ok(Self {
            max_velocity: dof_vec_from_slice(max_velocity)?,
            max_acceleration: dof_vec_from_slice(max_acceleration)?,
            max_jerk: dof_vec_from_slice(max_jerk)?,
        })
    }

    /// Same limits on every DOF.
    pub fn uniform(dofs: usize, vel: f64, acc: f64, jerk: f64) -> Result<Self, MotionError> {
        let mut set = Self {
            max_velocity: DofVec::new(),
            max_acceleration: DofVec::new(),
            max_jerk: DofVec::new(),
        };
        let capacity = |_| MotionError::Capacity {
            requested: dofs,
            capacity: crate::consts::MAX_DOFS,
        };
        set.max_velocity.resize(dofs, vel).map_err(capacity)?;
        set.max_acceleration.resize(dofs, acc).map_err(capacity)?;
        set.max_jerk.resize(dofs, jerk).map_err(capacity)?;
        Ok(set)
    }

    /// Check that every vector has `dofs` entries.
    ///
    /// Reports velocity, then acceleration, then jerk.
    pub fn check_lengths(&self, dofs: usize) -> Result<(), MotionError> {
        for (field, v) in self.fields() {
            if v.len() != dofs {
                return Err(MotionError::LengthMismatch {
                    field,
                    expected: dofs,
                    actual: v.len(),
                });
            }
        }
        Ok(())
    }

    /// Full validation: lengths plus non-negative, non-NaN entries.
    pub fn validate(&self, dofs: usize) -> Result<(), MotionError> {
        self.check_lengths(dofs)?;
        for (field, v) in self.fields() {
            if let Some((dof, &value)) = v.iter().enumerate().find(|(_, x)| x.is_nan() || **x < 0.0) {
                return Err(MotionError::InvalidLimit { field, dof, value });
            }
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, &[f64]); 3] {
        [
            ("max_velocity", self.max_velocity.as_slice()),
            ("max_acceleration", self.max_acceleration.as_slice()),
            ("max_jerk", self.max_jerk.as_slice()),
        ]
    }
}
