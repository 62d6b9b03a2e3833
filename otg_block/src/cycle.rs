//! Fixed-period cycle: fill → tick → commit.
//!
//! [`CycleRunner`] paces [`LifecycleManager::tick`] at the generator's sample
//! period. Signals come from and go to a [`SignalIo`] implementation (a
//! plant model, a fieldbus adapter, a test harness).
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` to lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! ## Cycle Loop
//! With the `rt` feature: absolute-time sleep on `CLOCK_MONOTONIC`, first
//! overrun is fatal. Without it: `Instant` + `thread::sleep`, overruns are
//! only counted.
//!
//! The loop ends on the first tick error, after `max_cycles`, when the
//! shutdown flag clears, or (optionally) when the target is reached. The
//! generator instance is destroyed before [`CycleRunner::run`] returns in
//! every case.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::engine::{GeneratorEngine, JerkStepper};
use crate::error::CycleError;
use crate::lifecycle::LifecycleManager;
use crate::tick::{TickInputs, TickOutcome, TickOutputs};
use otg_common::motion::{ConstraintSet, KinematicState, MotionError};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (time between expected and actual wake).
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Signal Exchange ────────────────────────────────────────────────

/// Input signals for one cycle, overwritten in place by [`SignalIo::fill`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub target: KinematicState,
    pub current: KinematicState,
    /// Tuned limits for this cycle.
    pub limits: ConstraintSet,
}

impl SignalFrame {
    pub fn zeroed(dofs: usize) -> Result<Self, MotionError> {
        Ok(Self {
            target: KinematicState::zeroed(dofs)?,
            current: KinematicState::zeroed(dofs)?,
            limits: ConstraintSet::uniform(dofs, 0.0, 0.0, 0.0)?,
        })
    }
}

/// Source of feedback/target/limits and sink for the commanded state.
///
/// Both calls happen on the cycle thread and must not block.
pub trait SignalIo {
    /// Write this cycle's inputs into `frame`.
    fn fill(&mut self, cycle: u64, frame: &mut SignalFrame);

    /// Take the commanded state of a successful tick.
    fn commit(&mut self, cycle: u64, command: &KinematicState, outcome: TickOutcome);
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockAllFlags, mlockall};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the cycle never page-faults on it.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup. Call before [`CycleRunner::run`].
///
/// Without the `rt` feature only the stack prefault runs.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    debug!(cpu_core, rt_priority, rt = cfg!(feature = "rt"), "RT setup complete");
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Drives a started [`LifecycleManager`] once per sample period.
pub struct CycleRunner<Io: SignalIo, E: GeneratorEngine = JerkStepper> {
    manager: LifecycleManager<E>,
    io: Io,
    frame: SignalFrame,
    command: KinematicState,
    stats: CycleStats,
    cycle: u64,
    cycle_time_ns: i64,
    paced: bool,
    stop_when_finished: bool,
}

impl<Io: SignalIo, E: GeneratorEngine> CycleRunner<Io, E> {
    /// Runner for `manager`, which should already be started.
    pub fn new(manager: LifecycleManager<E>, io: Io) -> Result<Self, CycleError> {
        let config = *manager.config();
        let period = config.sample_period;
        let cycle_time_ns = period * 1e9;
        if !cycle_time_ns.is_finite() || cycle_time_ns < 1.0 {
            return Err(CycleError::InvalidPeriod(period));
        }
        let frame = SignalFrame::zeroed(config.dofs)
            .map_err(|e| CycleError::RtSetup(format!("signal frame: {e}")))?;
        let command = KinematicState::zeroed(config.dofs)
            .map_err(|e| CycleError::RtSetup(format!("command buffer: {e}")))?;

        Ok(Self {
            manager,
            io,
            frame,
            command,
            stats: CycleStats::new(),
            cycle: 0,
            cycle_time_ns: cycle_time_ns.round() as i64,
            paced: true,
            stop_when_finished: false,
        })
    }

    /// Sleep to the period boundary between cycles (default on).
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// End the loop on the first `Finished` tick (default off).
    pub fn stop_when_finished(mut self, stop: bool) -> Self {
        self.stop_when_finished = stop;
        self
    }

    #[inline]
    pub fn cycle_time_ns(&self) -> i64 {
        self.cycle_time_ns
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn io(&self) -> &Io {
        &self.io
    }

    #[inline]
    pub fn manager(&self) -> &LifecycleManager<E> {
        &self.manager
    }

    /// Signal endpoint, e.g. to move the target or retune limits between cycles.
    #[inline]
    pub fn io_mut(&mut self) -> &mut Io {
        &mut self.io
    }

    /// Last commanded state.
    #[inline]
    pub fn command(&self) -> &KinematicState {
        &self.command
    }

    /// One unpaced cycle body: fill, tick, commit.
    pub fn step(&mut self) -> Result<TickOutcome, CycleError> {
        let cycle = self.cycle;
        self.io.fill(cycle, &mut self.frame);
        let inputs = TickInputs::from_states(&self.frame.target, &self.frame.current);
        let outcome = self.manager.tick(
            &inputs,
            &self.frame.limits,
            &mut TickOutputs::from_state(&mut self.command),
        )?;
        self.io.commit(cycle, &self.command, outcome);
        self.cycle += 1;
        Ok(outcome)
    }

    /// Run until `max_cycles` (if any), until `running` clears, or until the
    /// first error. The generator is stopped before returning.
    pub fn run(
        &mut self,
        max_cycles: Option<u64>,
        running: &AtomicBool,
    ) -> Result<CycleStats, CycleError> {
        info!(
            cycle_time_ns = self.cycle_time_ns,
            max_cycles = max_cycles.unwrap_or(0),
            paced = self.paced,
            "cycle loop starting"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(max_cycles, running);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(max_cycles, running);

        self.manager.stop();
        match &result {
            Ok(()) => info!(
                cycles = self.stats.cycle_count,
                avg_ns = self.stats.avg_cycle_ns(),
                max_ns = self.stats.max_cycle_ns,
                overruns = self.stats.overruns,
                "cycle loop finished"
            ),
            Err(e) => warn!(cycle = self.cycle, "cycle loop aborted: {e}"),
        }
        result.map(|()| self.stats.clone())
    }

    #[inline]
    fn keep_going(&self, max_cycles: Option<u64>, running: &AtomicBool) -> bool {
        running.load(Ordering::Relaxed) && max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    /// RT cycle loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_cycles: Option<u64>, running: &AtomicBool) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")));
        let mut next_wake = now()?;

        while self.keep_going(max_cycles, running) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now()?;
            let outcome = self.step()?;
            let cycle_end = now()?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            let latency_ns = if self.paced {
                timespec_diff_ns(&cycle_start, &next_wake).abs()
            } else {
                0
            };
            self.stats.record(duration_ns, latency_ns);

            if self.paced && duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }
            if self.stop_when_finished && outcome.is_finished() {
                break;
            }
            if self.paced {
                let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            }
        }
        Ok(())
    }

    /// Simulation cycle loop using `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_cycles: Option<u64>, running: &AtomicBool) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns as u64);

        while self.keep_going(max_cycles, running) {
            let cycle_start = Instant::now();
            let outcome = self.step()?;
            let elapsed = cycle_start.elapsed();
            let duration_ns = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);

            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                // Counted only; the RT loop treats this as fatal.
                self.stats.overruns += 1;
            }
            if self.stop_when_finished && outcome.is_finished() {
                break;
            }
            if let Some(remaining) = cycle_duration.checked_sub(elapsed).filter(|_| self.paced) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
