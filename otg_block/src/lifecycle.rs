//! Generator lifecycle: one create per start, one destroy per stop.
//!
//! [`LifecycleManager`] is the sole owner of the [`GeneratorInstance`] and of
//! the tick phase. Dropping a manager that still holds an instance destroys
//! it, so abnormal loop exits do not leak.

use tracing::{debug, info};

use crate::config::{CheckMode, GeneratorConfig};
use crate::engine::{GeneratorEngine, JerkStepper};
use crate::error::{BlockConfigError, TickError};
use crate::instance::GeneratorInstance;
use crate::tick::{TickInputs, TickOrchestrator, TickOutcome, TickOutputs, TickPhase};
use otg_common::motion::ConstraintSet;

/// Owns the generator across one or more control-loop runs.
#[derive(Debug)]
pub struct LifecycleManager<E: GeneratorEngine = JerkStepper> {
    config: GeneratorConfig,
    check_mode: CheckMode,
    instance: Option<GeneratorInstance<E>>,
    orchestrator: TickOrchestrator,
    runs: u64,
}

impl<E: GeneratorEngine> LifecycleManager<E> {
    /// Manager for `config`. Nothing is allocated until [`start`](Self::start).
    pub fn new(config: GeneratorConfig, check_mode: CheckMode) -> Self {
        Self {
            config,
            check_mode,
            instance: None,
            orchestrator: TickOrchestrator::new(),
            runs: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Create the generator for a new run.
    ///
    /// In [`CheckMode::Checked`] the configuration and the initial `limits`
    /// are validated first; any error means no instance exists and no tick
    /// may run. A still-running instance is destroyed before the new one is
    /// created.
    pub fn start(&mut self, limits: &ConstraintSet) -> Result<(), BlockConfigError> {
        if self.check_mode == CheckMode::Checked {
            self.config.validate(limits)?;
        }
        if self.instance.is_some() {
            debug!("start on running generator, destroying previous instance");
            self.stop();
        }

        self.instance = Some(GeneratorInstance::create(&self.config)?);
        self.orchestrator.restart();
        self.runs += 1;
        info!(
            dofs = self.config.dofs,
            sample_period = self.config.sample_period,
            control = self.config.control_mode.as_token(),
            sync = self.config.synchronization.as_token(),
            duration = self.config.duration_discretization.as_token(),
            run = self.runs,
            "generator started"
        );
        Ok(())
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    /// Run one tick. See [`TickOrchestrator::tick`].
    pub fn tick(
        &mut self,
        inputs: &TickInputs<'_>,
        constraints: &ConstraintSet,
        outputs: &mut TickOutputs<'_>,
    ) -> Result<TickOutcome, TickError> {
        let instance = self.instance.as_mut().ok_or(TickError::NotRunning)?;
        self.orchestrator.tick(instance, inputs, constraints, outputs)
    }

    /// Host restart signal: the next tick bootstraps again.
    ///
    /// The instance and its engine state are kept.
    pub fn restart(&mut self) {
        info!(after_ticks = self.orchestrator.ticks(), "generator restart");
        self.orchestrator.restart();
    }

    /// Destroy the instance. No-op when not running.
    pub fn stop(&mut self) {
        if let Some(instance) = self.instance.take() {
            let ticks = self.orchestrator.ticks();
            instance.destroy();
            info!(ticks, run = self.runs, "generator stopped");
        }
    }

    #[inline]
    pub fn phase(&self) -> TickPhase {
        self.orchestrator.phase()
    }

    /// Ticks completed since the last start or restart.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.orchestrator.ticks()
    }

    #[inline]
    pub fn instance(&self) -> Option<&GeneratorInstance<E>> {
        self.instance.as_ref()
    }
}

impl<E: GeneratorEngine> Drop for LifecycleManager<E> {
    fn drop(&mut self) {
        self.stop();
    }
}
