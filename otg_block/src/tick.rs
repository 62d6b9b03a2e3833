//! Per-tick orchestration: the Bootstrap/Steady state machine.
//!
//! # Protocol
//!
//! - **Bootstrap** (first tick after start or restart): the current feedback
//!   is written to the outputs verbatim. The engine is not called.
//! - **Steady** (every later tick): feedback, target and the freshly tuned
//!   constraints are copied into the request, the engine advances one
//!   period, and its next state becomes the output.
//!
//! A failed Steady tick leaves the output buffers untouched and reports the
//! engine code upward. Nothing on this path allocates.

use tracing::{debug, error};

use crate::engine::GeneratorEngine;
use crate::error::TickError;
use crate::instance::GeneratorInstance;
use otg_common::consts::{INPUT_PORT_COUNT, OUTPUT_PORT_COUNT};
use otg_common::motion::{ConstraintSet, KinematicState, MotionError, ResultCode, copy_into};

// ─── Phase ──────────────────────────────────────────────────────────

/// Private per-run block state deciding what the next tick does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickPhase {
    /// Next tick passes feedback through.
    #[default]
    Bootstrap,
    /// Next tick advances the engine.
    Steady,
}

/// What a successful tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Feedback was passed through.
    Bootstrapped,
    /// Engine advanced with a non-negative code.
    Advanced(ResultCode),
}

impl TickOutcome {
    /// True once the engine reports the target reached.
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Advanced(ResultCode::Finished))
    }
}

// ─── Signals ────────────────────────────────────────────────────────

/// The six input ports of one tick, each one value per DOF.
#[derive(Debug, Clone, Copy)]
pub struct TickInputs<'a> {
    pub target_position: &'a [f64],
    pub target_velocity: &'a [f64],
    pub target_acceleration: &'a [f64],
    pub current_position: &'a [f64],
    pub current_velocity: &'a [f64],
    pub current_acceleration: &'a [f64],
}

impl<'a> TickInputs<'a> {
    /// From ports in host order: target p/v/a, then current p/v/a.
    pub fn from_ports(ports: [&'a [f64]; INPUT_PORT_COUNT]) -> Self {
        let [tp, tv, ta, cp, cv, ca] = ports;
        Self {
            target_position: tp,
            target_velocity: tv,
            target_acceleration: ta,
            current_position: cp,
            current_velocity: cv,
            current_acceleration: ca,
        }
    }

    pub fn from_states(target: &'a KinematicState, current: &'a KinematicState) -> Self {
        Self {
            target_position: &target.position,
            target_velocity: &target.velocity,
            target_acceleration: &target.acceleration,
            current_position: &current.position,
            current_velocity: &current.velocity,
            current_acceleration: &current.acceleration,
        }
    }

    fn check_current(&self, dofs: usize) -> Result<(), MotionError> {
        check_width("current_position", self.current_position, dofs)?;
        check_width("current_velocity", self.current_velocity, dofs)?;
        check_width("current_acceleration", self.current_acceleration, dofs)
    }

    /// All six ports must be `dofs` wide.
    pub fn check(&self, dofs: usize) -> Result<(), MotionError> {
        check_width("target_position", self.target_position, dofs)?;
        check_width("target_velocity", self.target_velocity, dofs)?;
        check_width("target_acceleration", self.target_acceleration, dofs)?;
        self.check_current(dofs)
    }
}

/// The three output ports of one tick.
#[derive(Debug)]
pub struct TickOutputs<'a> {
    pub position: &'a mut [f64],
    pub velocity: &'a mut [f64],
    pub acceleration: &'a mut [f64],
}

impl<'a> TickOutputs<'a> {
    pub fn from_ports(ports: [&'a mut [f64]; OUTPUT_PORT_COUNT]) -> Self {
        let [position, velocity, acceleration] = ports;
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    pub fn from_state(state: &'a mut KinematicState) -> Self {
        Self {
            position: &mut state.position,
            velocity: &mut state.velocity,
            acceleration: &mut state.acceleration,
        }
    }

    pub fn check(&self, dofs: usize) -> Result<(), MotionError> {
        check_width("output_position", self.position, dofs)?;
        check_width("output_velocity", self.velocity, dofs)?;
        check_width("output_acceleration", self.acceleration, dofs)
    }
}

#[inline]
fn check_width(field: &'static str, signal: &[f64], dofs: usize) -> Result<(), MotionError> {
    if signal.len() != dofs {
        return Err(MotionError::LengthMismatch {
            field,
            expected: dofs,
            actual: signal.len(),
        });
    }
    Ok(())
}

// ─── Orchestrator ───────────────────────────────────────────────────

/// Runs one tick per sample period against a [`GeneratorInstance`].
#[derive(Debug, Default)]
pub struct TickOrchestrator {
    phase: TickPhase,
    ticks: u64,
}

impl TickOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Ticks completed since the last restart.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Return to Bootstrap. The next tick passes feedback through again.
    pub fn restart(&mut self) {
        debug!(after_ticks = self.ticks, "tick orchestrator restarted");
        self.phase = TickPhase::Bootstrap;
        self.ticks = 0;
    }

    /// Execute one tick.
    ///
    /// `constraints` is read exactly once, before the engine advances.
    pub fn tick<E: GeneratorEngine>(
        &mut self,
        instance: &mut GeneratorInstance<E>,
        inputs: &TickInputs<'_>,
        constraints: &ConstraintSet,
        outputs: &mut TickOutputs<'_>,
    ) -> Result<TickOutcome, TickError> {
        let dofs = instance.dofs();
        constraints
            .check_lengths(dofs)
            .map_err(TickError::Constraints)?;
        outputs.check(dofs).map_err(TickError::Signal)?;

        let outcome = match self.phase {
            TickPhase::Bootstrap => {
                inputs.check_current(dofs).map_err(TickError::Signal)?;
                outputs.position.copy_from_slice(inputs.current_position);
                outputs.velocity.copy_from_slice(inputs.current_velocity);
                outputs.acceleration.copy_from_slice(inputs.current_acceleration);
                self.phase = TickPhase::Steady;
                TickOutcome::Bootstrapped
            }
            TickPhase::Steady => {
                inputs.check(dofs).map_err(TickError::Signal)?;
                let rc = Self::advance(instance, inputs, constraints).map_err(TickError::Signal)?;
                if rc.is_error() {
                    error!(code = rc.code(), result = %rc, tick = self.ticks, "generator advance failed");
                    return Err(TickError::Engine(rc));
                }
                instance
                    .response()
                    .next
                    .write_into(outputs.position, outputs.velocity, outputs.acceleration)
                    .map_err(TickError::Signal)?;
                TickOutcome::Advanced(rc)
            }
        };
        self.ticks += 1;
        Ok(outcome)
    }

    /// Assemble the request in place and run the engine.
    fn advance<E: GeneratorEngine>(
        instance: &mut GeneratorInstance<E>,
        inputs: &TickInputs<'_>,
        constraints: &ConstraintSet,
    ) -> Result<ResultCode, MotionError> {
        let request = instance.request_mut();
        request.current.copy_from_slices(
            inputs.current_position,
            inputs.current_velocity,
            inputs.current_acceleration,
        )?;
        request.target.copy_from_slices(
            inputs.target_position,
            inputs.target_velocity,
            inputs.target_acceleration,
        )?;
        let limits = &mut request.limits;
        copy_into("max_velocity", &mut limits.max_velocity, &constraints.max_velocity)?;
        copy_into(
            "max_acceleration",
            &mut limits.max_acceleration,
            &constraints.max_acceleration,
        )?;
        copy_into("max_jerk", &mut limits.max_jerk, &constraints.max_jerk)?;
        Ok(instance.advance())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
