//! Motion data types shared between the trajectory generator block and its
//! hosts.
//!
//! All per-DOF data lives in fixed-capacity [`DofVec`] buffers sized to
//! [`MAX_DOFS`](crate::consts::MAX_DOFS). Buffers are sized once when a
//! generator is created and are only ever overwritten in place afterwards.

pub mod constraints;
pub mod error;
pub mod kinematics;
pub mod modes;
pub mod result;

use crate::consts::MAX_DOFS;

pub use constraints::ConstraintSet;
pub use error::MotionError;
pub use kinematics::KinematicState;
pub use modes::{ControlMode, DurationDiscretization, Synchronization};
pub use result::ResultCode;

/// Fixed-capacity per-DOF vector of reals.
pub type DofVec = heapless::Vec<f64, MAX_DOFS>;

/// Build a zero-filled [`DofVec`] of length `dofs`.
pub fn dof_vec_zeroed(dofs: usize) -> Result<DofVec, MotionError> {
    let mut v = DofVec::new();
    v.resize(dofs, 0.0).map_err(|_| MotionError::Capacity {
        requested: dofs,
        capacity: MAX_DOFS,
    })?;
    Ok(v)
}

/// Build a [`DofVec`] holding a copy of `values`.
pub fn dof_vec_from_slice(values: &[f64]) -> Result<DofVec, MotionError> {
    DofVec::from_slice(values).map_err(|_| MotionError::Capacity {
        requested: values.len(),
        capacity: MAX_DOFS,
    })
}

/// Overwrite `dst` with `src` without changing its length.
///
/// # Errors
/// [`MotionError::LengthMismatch`] if the lengths differ; `dst` is untouched.
#[inline]
pub fn copy_into(field: &'static str, dst: &mut [f64], src: &[f64]) -> Result<(), MotionError> {
    if dst.len() != src.len() {
        return Err(MotionError::LengthMismatch {
            field,
            expected: dst.len(),
            actual: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}
