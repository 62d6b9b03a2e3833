//! Ideal plant: feedback equals the previous command.
//!
//! Stands in for the controlled system when the block runs standalone;
//! [`standalone_runner`] wires it to a started generator from a block file.

use tracing::{info, warn};

use crate::config::LoadedConfig;
use crate::cycle::{CycleRunner, SignalFrame, SignalIo};
use crate::error::{BlockConfigError, CycleError};
use crate::lifecycle::LifecycleManager;
use crate::tick::TickOutcome;
use otg_common::motion::{ConstraintSet, KinematicState};

/// Perfect-tracking plant with a fixed target and tunable limits.
#[derive(Debug, Clone)]
pub struct IdealPlant {
    state: KinematicState,
    target: KinematicState,
    limits: ConstraintSet,
    finished_at: Option<u64>,
}

impl IdealPlant {
    pub fn new(initial: KinematicState, target: KinematicState, limits: ConstraintSet) -> Self {
        Self {
            state: initial,
            target,
            limits,
            finished_at: None,
        }
    }

    /// Current plant state (last command taken).
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Cycle on which the generator first reported `Finished`.
    pub fn finished_at(&self) -> Option<u64> {
        self.finished_at
    }

    /// Retune limits; takes effect from the next cycle.
    pub fn set_limits(&mut self, limits: ConstraintSet) {
        self.limits = limits;
    }

    /// Move the target; clears the finished marker.
    pub fn set_target(&mut self, target: KinematicState) {
        self.target = target;
        self.finished_at = None;
    }
}

impl SignalIo for IdealPlant {
    fn fill(&mut self, _cycle: u64, frame: &mut SignalFrame) {
        frame.current.clone_from(&self.state);
        frame.target.clone_from(&self.target);
        frame.limits.clone_from(&self.limits);
    }

    fn commit(&mut self, cycle: u64, command: &KinematicState, outcome: TickOutcome) {
        self.state.clone_from(command);
        if outcome.is_finished() && self.finished_at.is_none() {
            self.finished_at = Some(cycle);
            info!(cycle, "target reached");
        }
    }
}

/// Start the generator described by `loaded` and attach an [`IdealPlant`].
///
/// Initial feedback and target come from the `[plant]` table; without one
/// every DOF is held at the origin. The runner is paced and never stops on
/// its own.
pub fn standalone_runner(loaded: &LoadedConfig) -> Result<CycleRunner<IdealPlant>, CycleError> {
    let dofs = loaded.generator.dofs;
    let (initial, target) = match &loaded.plant {
        Some(plant) => (plant.initial_state(dofs)?, plant.target_state(dofs)?),
        None => {
            warn!("no [plant] table, holding all DoFs at the origin");
            let origin = KinematicState::zeroed(dofs).map_err(BlockConfigError::Plant)?;
            (origin.clone(), origin)
        }
    };

    let mut manager: LifecycleManager = LifecycleManager::new(loaded.generator, loaded.check_mode);
    manager.start(&loaded.limits)?;

    let plant = IdealPlant::new(initial, target, loaded.limits.clone());
    CycleRunner::new(manager, plant)
}
