//! Per-DOF kinematic state (position, velocity, acceleration).

use serde::{Deserialize, Serialize};

use super::{DofVec, MotionError, copy_into, dof_vec_from_slice, dof_vec_zeroed};

/// Position, velocity and acceleration, one entry per DOF.
///
/// All three vectors always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub position: DofVec,
    pub velocity: DofVec,
    pub acceleration: DofVec,
}

impl KinematicState {
    /// All-zero state for `dofs` DOFs.
    pub fn zeroed(dofs: usize) -> Result<Self, MotionError> {
        Ok(Self {
            position: dof_vec_zeroed(dofs)?,
            velocity: dof_vec_zeroed(dofs)?,
            acceleration: dof_vec_zeroed(dofs)?,
        })
    }

    /// Build a state from three equally long slices.
    pub fn from_slices(
        position: &[f64],
        velocity: &[f64],
        acceleration: &[f64],
    ) -> Result<Self, MotionError> {
        let dofs = position.len();
        check_len("velocity", dofs, velocity.len())?;
        check_len("acceleration", dofs, acceleration.len())?;
        Ok(Self {
            position: dof_vec_from_slice(position)?,
            velocity: dof_vec_from_slice(velocity)?,
            acceleration: dof_vec_from_slice(acceleration)?,
        })
    }

    /// Number of DOFs.
    #[inline]
    pub fn dofs(&self) -> usize {
        self.position.len()
    }

    /// Overwrite this state in place from raw signal slices.
    ///
    /// All lengths are checked before anything is written, so on error the
    /// state is unchanged.
    pub fn copy_from_slices(
        &mut self,
        position: &[f64],
        velocity: &[f64],
        acceleration: &[f64],
    ) -> Result<(), MotionError> {
        let dofs = self.dofs();
        check_len("position", dofs, position.len())?;
        check_len("velocity", dofs, velocity.len())?;
        check_len("acceleration", dofs, acceleration.len())?;
        self.position.copy_from_slice(position);
        self.velocity.copy_from_slice(velocity);
        self.acceleration.copy_from_slice(acceleration);
        Ok(())
    }

    /// Copy this state out into raw signal slices.
    pub fn write_into(
        &self,
        position: &mut [f64],
        velocity: &mut [f64],
        acceleration: &mut [f64],
    ) -> Result<(), MotionError> {
        let dofs = self.dofs();
        check_len("position", position.len(), dofs)?;
        check_len("velocity", velocity.len(), dofs)?;
        check_len("acceleration", acceleration.len(), dofs)?;
        copy_into("position", position, &self.position)?;
        copy_into("velocity", velocity, &self.velocity)?;
        copy_into("acceleration", acceleration, &self.acceleration)
    }

    /// True when every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.position
            .iter()
            .chain(self.velocity.iter())
            .chain(self.acceleration.iter())
            .all(|x| x.is_finite())
    }
}

#[inline]
fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), MotionError> {
    if expected != actual {
        return Err(MotionError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
