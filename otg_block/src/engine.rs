//! Generator engine contract and the reference jerk-limited stepper.
//!
//! The block drives any [`GeneratorEngine`]: given the full [`Request`] it
//! writes the state one sample period ahead into a [`Response`] and returns a
//! [`ResultCode`]. Engines must be deterministic: identical requests applied to
//! identical engine state produce identical responses and codes.
//!
//! [`JerkStepper`] is the engine shipped with the block. It is a per-DOF
//! cascaded tracker (position → velocity → acceleration) whose acceleration
//! change per period is bounded by the jerk limit and whose acceleration and
//! velocity are clamped to their limits. It is not a time-optimal profile
//! generator: synchronization is approximated by scaling each DOF's cruise
//! velocity so that estimated arrival times line up.
//!
//! A position target with non-zero velocity or acceleration is only ever
//! crossed, never parked on, so for those the stepper plans a *landing*
//! instead: the shortest common number of periods over which a
//! piecewise-constant jerk sequence meets every DOF's target exactly while
//! staying inside the limits. Once landed it keeps following the target
//! motion and keeps reporting `Finished` until the target or the fed-back
//! state changes.

use otg_common::motion::{
    ConstraintSet, ControlMode, DofVec, DurationDiscretization, KinematicState, MotionError,
    ResultCode, Synchronization, dof_vec_zeroed,
};

use static_assertions::const_assert;

use crate::config::GeneratorConfig;

// ─── Records ────────────────────────────────────────────────────────

/// Everything the engine needs for one advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub current: KinematicState,
    pub target: KinematicState,
    pub limits: ConstraintSet,
    pub control_mode: ControlMode,
    pub synchronization: Synchronization,
    pub duration_discretization: DurationDiscretization,
}

impl Request {
    /// Zeroed request sized for `config.dofs`.
    pub fn new(config: &GeneratorConfig) -> Result<Self, MotionError> {
        Ok(Self {
            current: KinematicState::zeroed(config.dofs)?,
            target: KinematicState::zeroed(config.dofs)?,
            limits: ConstraintSet::uniform(config.dofs, 0.0, 0.0, 0.0)?,
            control_mode: config.control_mode,
            synchronization: config.synchronization,
            duration_discretization: config.duration_discretization,
        })
    }

    #[inline]
    pub fn dofs(&self) -> usize {
        self.current.dofs()
    }
}

/// State one sample period ahead, written by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub next: KinematicState,
    /// Estimated time [s] until the target is reached.
    pub duration: f64,
    /// True when this advance started a new profile (target changed).
    pub new_calculation: bool,
}

impl Response {
    pub fn new(dofs: usize) -> Result<Self, MotionError> {
        Ok(Self {
            next: KinematicState::zeroed(dofs)?,
            duration: 0.0,
            new_calculation: false,
        })
    }
}

// ─── Contract ───────────────────────────────────────────────────────

/// A stateful single-step trajectory generator.
pub trait GeneratorEngine {
    /// Build an engine for `dofs` DOFs advancing by `sample_period` per call.
    fn new(dofs: usize, sample_period: f64) -> Result<Self, MotionError>
    where
        Self: Sized;

    /// Advance one sample period.
    ///
    /// On a negative code the contents of `response` are unspecified.
    fn advance(&mut self, request: &Request, response: &mut Response) -> ResultCode;
}

// ─── Reference Engine ───────────────────────────────────────────────

/// Fraction of the acceleration limit assumed when planning to brake.
const BRAKE_ACCEL_RATIO: f64 = 0.8;
/// Velocity-loop gain as a multiple of `max_jerk / max_acceleration`.
const VELOCITY_GAIN: f64 = 2.0;
/// Position-loop gain as a fraction of the velocity-loop gain.
const POSITION_GAIN_RATIO: f64 = 0.25;
/// Arrival tolerance on position [units], velocity and acceleration.
const FINISH_TOLERANCE: f64 = 1e-6;
/// Terminal error a planned landing may leave before it is rejected.
const LANDING_TOLERANCE: f64 = 1e-9;
/// Relative slack on the limits while checking a landing.
const LIMIT_SLACK: f64 = 1.0 + 1e-9;
/// Longest landing considered, in periods.
const MAX_LANDING_STEPS: usize = 1 << 16;

const_assert!(BRAKE_ACCEL_RATIO > 0.0 && BRAKE_ACCEL_RATIO < 1.0);
const_assert!(POSITION_GAIN_RATIO > 0.0 && POSITION_GAIN_RATIO < 1.0);
const_assert!(LANDING_TOLERANCE < FINISH_TOLERANCE);

/// Reference jerk-limited stepper. See the module docs.
#[derive(Debug, Clone)]
pub struct JerkStepper {
    dofs: usize,
    dt: f64,
    /// Target of the profile currently being followed.
    profile_target: KinematicState,
    /// Per-DOF cruise-limit scale from the last synchronization pass.
    scale: DofVec,
    /// Estimated profile duration [s] from the last calculation.
    profile_duration: f64,
    has_profile: bool,
    calculations: u64,
    /// Periods left in the landing being flown; zero when none is planned.
    landing_steps: usize,
    /// A moving target has been met; follow its motion from here on.
    landed: bool,
    /// State written by the last successful advance.
    emitted: KinematicState,
}

impl JerkStepper {
    /// Number of profile recalculations so far.
    pub fn calculations(&self) -> u64 {
        self.calculations
    }

    /// Per-DOF cruise-limit scale in effect.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Periods left until the planned landing on a moving target.
    pub fn landing_steps(&self) -> usize {
        self.landing_steps
    }

    fn check_request(&self, request: &Request) -> Result<(), ResultCode> {
        let n = self.dofs;
        if request.current.dofs() != n
            || request.target.dofs() != n
            || request.limits.check_lengths(n).is_err()
        {
            return Err(ResultCode::ErrorInvalidInput);
        }
        if !request.current.is_finite() || !request.target.is_finite() {
            return Err(ResultCode::ErrorInvalidInput);
        }

        let limits = &request.limits;
        for i in 0..n {
            let v = limits.max_velocity[i];
            let a = limits.max_acceleration[i];
            let j = limits.max_jerk[i];
            if !v.is_finite() || !a.is_finite() || !j.is_finite() || v < 0.0 || a < 0.0 || j < 0.0 {
                return Err(ResultCode::ErrorInvalidInput);
            }
            // Velocity control ignores position, so a zero velocity limit is fine there.
            let zero_velocity = request.control_mode == ControlMode::Position && v == 0.0;
            if zero_velocity || a == 0.0 || j == 0.0 {
                return Err(ResultCode::ErrorZeroLimits);
            }
        }
        Ok(())
    }

    /// Recompute per-DOF cruise scaling for a new target.
    fn plan(&mut self, request: &Request) {
        let n = self.dofs;
        let limits = &request.limits;

        let mut longest = 0.0_f64;
        for i in 0..n {
            let t = estimate_duration(
                request.control_mode,
                &request.current,
                &request.target,
                limits,
                i,
            );
            longest = longest.max(t);
        }
        if request.duration_discretization == DurationDiscretization::Discrete && self.dt > 0.0 {
            longest = (longest / self.dt).ceil() * self.dt;
        }
        self.profile_duration = longest;

        let synchronize = match request.synchronization {
            Synchronization::None => false,
            Synchronization::TimeIfNecessary => {
                request.target.velocity.iter().any(|v| *v != 0.0)
                    || request.target.acceleration.iter().any(|a| *a != 0.0)
            }
            Synchronization::Time | Synchronization::Phase => true,
        };

        for i in 0..n {
            self.scale[i] = if synchronize && request.control_mode == ControlMode::Position {
                sync_scale(&request.current, &request.target, limits, i, longest)
            } else {
                1.0
            };
        }
    }

    /// True when every DOF can land on the target in exactly `steps` periods.
    fn lands(&self, request: &Request, steps: usize) -> bool {
        (0..self.dofs).all(|i| {
            let from = Axis::of(&request.current, i);
            let to = Axis::of(&request.target, i);
            Landing::solve(from, to, self.dt, steps)
                .is_some_and(|landing| landing.fits(from, to, &request.limits, i, self.dt))
        })
    }

    /// Find the shortest common landing. Leaves `landing_steps` at zero when
    /// even the longest horizon does not fit.
    fn plan_landing(&mut self, request: &Request) -> bool {
        let mut hi = (0..self.dofs)
            .map(|i| {
                landing_horizon(
                    Axis::of(&request.current, i),
                    Axis::of(&request.target, i),
                    &request.limits,
                    i,
                    self.dt,
                )
            })
            .max()
            .unwrap_or(0);
        if !self.lands(request, hi) {
            return false;
        }
        let mut lo = 0;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.lands(request, mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        self.landing_steps = hi;
        self.profile_duration = hi as f64 * self.dt;
        true
    }

    /// Fly one period of the landing. False when there is no landing to fly,
    /// in which case `next` must be overwritten by the caller.
    fn land(&mut self, request: &Request, next: &mut KinematicState) -> bool {
        if self.landing_steps == 0 && !self.plan_landing(request) {
            return false;
        }
        for i in 0..self.dofs {
            let from = Axis::of(&request.current, i);
            let to = Axis::of(&request.target, i);
            let Some(landing) = Landing::solve(from, to, self.dt, self.landing_steps) else {
                self.landing_steps = 0;
                return false;
            };
            from.advanced(landing.jerk(0, self.dt), self.dt).write(next, i);
        }
        self.landing_steps -= 1;
        true
    }

    /// Follow the target's velocity and acceleration after landing.
    fn coast(&self, request: &Request, next: &mut KinematicState) {
        let dt = self.dt;
        for i in 0..self.dofs {
            let p = request.current.position[i];
            let v = request.current.velocity[i];
            let a = request.target.acceleration[i];
            let v_max = request.limits.max_velocity[i];

            let mut v_next = v + a * dt;
            let mut a_next = a;
            if v_next.abs() > v_max {
                v_next = v_next.clamp(-v_max, v_max);
                a_next = 0.0;
            }
            next.position[i] = p + v * dt + a * dt * dt / 2.0;
            next.velocity[i] = v_next;
            next.acceleration[i] = a_next;
        }
    }
}

impl GeneratorEngine for JerkStepper {
    fn new(dofs: usize, sample_period: f64) -> Result<Self, MotionError> {
        let mut scale = dof_vec_zeroed(dofs)?;
        scale.iter_mut().for_each(|s| *s = 1.0);
        Ok(Self {
            dofs,
            dt: sample_period,
            profile_target: KinematicState::zeroed(dofs)?,
            scale,
            profile_duration: 0.0,
            has_profile: false,
            calculations: 0,
            landing_steps: 0,
            landed: false,
            emitted: KinematicState::zeroed(dofs)?,
        })
    }

    fn advance(&mut self, request: &Request, response: &mut Response) -> ResultCode {
        if let Err(rc) = self.check_request(request) {
            return rc;
        }
        if response.next.dofs() != self.dofs {
            return ResultCode::ErrorInvalidInput;
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return ResultCode::ErrorTrajectoryDuration;
        }

        let new_calculation = !self.has_profile || self.profile_target != request.target;
        if new_calculation {
            self.plan(request);
            self.profile_target.clone_from(&request.target);
            self.has_profile = true;
            self.calculations += 1;
            self.landing_steps = 0;
            self.landed = false;
        }
        if self.landed && request.current != self.emitted {
            self.landed = false;
        }

        let moving_target = request.control_mode == ControlMode::Position
            && (request.target.velocity.iter().any(|v| *v != 0.0)
                || request.target.acceleration.iter().any(|a| *a != 0.0));
        let coasting = moving_target && self.landed;
        if coasting {
            self.coast(request, &mut response.next);
        } else if !(moving_target && self.land(request, &mut response.next)) {
            let dt = self.dt;
            for i in 0..self.dofs {
                let (p, v, a) = step_dof(request, i, self.scale[i], dt);
                response.next.position[i] = p;
                response.next.velocity[i] = v;
                response.next.acceleration[i] = a;
            }
        }

        let next = &response.next;
        let target = &request.target;
        let finished = coasting
            || (0..self.dofs).all(|i| {
                let at_target = match request.control_mode {
                    ControlMode::Position => {
                        (target.position[i] - next.position[i]).abs() <= FINISH_TOLERANCE
                            && (target.velocity[i] - next.velocity[i]).abs() <= FINISH_TOLERANCE
                    }
                    ControlMode::Velocity => {
                        (target.velocity[i] - next.velocity[i]).abs() <= FINISH_TOLERANCE
                    }
                };
                at_target
                    && (target.acceleration[i] - next.acceleration[i]).abs() <= FINISH_TOLERANCE
            });

        if !response.next.is_finite() {
            return ResultCode::ErrorExecutionTimeCalculation;
        }
        if finished && moving_target {
            self.landed = true;
        }
        self.emitted.clone_from(&response.next);

        response.new_calculation = new_calculation;
        response.duration = if finished {
            0.0
        } else {
            self.profile_duration
        };
        if finished {
            ResultCode::Finished
        } else {
            ResultCode::Working
        }
    }
}

// ─── Per-DOF Math ───────────────────────────────────────────────────

/// One period for DOF `i`. Returns the new (position, velocity, acceleration).
///
/// Acceleration moves toward its demand by at most `max_jerk * dt`, then is
/// clamped to `max_acceleration`; velocity is clamped to `max_velocity`.
#[inline]
fn step_dof(request: &Request, i: usize, scale: f64, dt: f64) -> (f64, f64, f64) {
    let p = request.current.position[i];
    let v = request.current.velocity[i];
    let a = request.current.acceleration[i];
    let v_max = request.limits.max_velocity[i];
    let a_max = request.limits.max_acceleration[i];
    let j_max = request.limits.max_jerk[i];

    let kv = (VELOCITY_GAIN * j_max / a_max).min(0.25 / dt);
    let v_target = request.target.velocity[i];

    let v_demand = match request.control_mode {
        ControlMode::Position => {
            let kp = POSITION_GAIN_RATIO * kv;
            let error = request.target.position[i] - p;
            let distance = error.abs();
            let approach = brake_velocity(distance, BRAKE_ACCEL_RATIO * a_max, j_max).min(kp * distance);
            let cruise = v_max * scale;
            (v_target + error.signum() * approach).clamp(-cruise, cruise)
        }
        ControlMode::Velocity if v_max > 0.0 => v_target.clamp(-v_max, v_max),
        ControlMode::Velocity => v_target,
    };

    let dv = v_demand - v;
    let a_demand =
        (dv.signum() * (j_max * dv.abs()).sqrt().min(kv * dv.abs())).clamp(-a_max, a_max);

    let da_max = j_max * dt;
    let a_next = (a + (a_demand - a).clamp(-da_max, da_max)).clamp(-a_max, a_max);
    let jerk = (a_next - a) / dt;

    let p_next = p + v * dt + a * dt * dt / 2.0 + jerk * dt * dt * dt / 6.0;
    let mut v_next = v + a * dt + jerk * dt * dt / 2.0;
    if v_max > 0.0 {
        v_next = v_next.clamp(-v_max, v_max);
    }
    (p_next, v_next, a_next)
}

/// Highest speed from which a jerk-limited stop fits in `distance`.
#[inline]
fn brake_velocity(distance: f64, a: f64, j: f64) -> f64 {
    let ramp = a / (2.0 * j);
    a * ((ramp * ramp + 2.0 * distance / a).sqrt() - ramp)
}

/// Rough rest-to-rest duration estimate for DOF `i`.
fn estimate_duration(
    mode: ControlMode,
    current: &KinematicState,
    target: &KinematicState,
    limits: &ConstraintSet,
    i: usize,
) -> f64 {
    let v_max = limits.max_velocity[i];
    let a_max = limits.max_acceleration[i];
    let j_max = limits.max_jerk[i];
    match mode {
        ControlMode::Position => {
            let distance = (target.position[i] - current.position[i]).abs();
            distance / v_max + v_max / a_max + a_max / j_max
        }
        ControlMode::Velocity => {
            (target.velocity[i] - current.velocity[i]).abs() / a_max + a_max / j_max
        }
    }
}

/// Cruise-limit scale so DOF `i` arrives after roughly `longest` seconds.
fn sync_scale(
    current: &KinematicState,
    target: &KinematicState,
    limits: &ConstraintSet,
    i: usize,
    longest: f64,
) -> f64 {
    let v_max = limits.max_velocity[i];
    let a_max = limits.max_acceleration[i];
    let j_max = limits.max_jerk[i];
    let distance = (target.position[i] - current.position[i]).abs();
    let cruise_time = longest - v_max / a_max - a_max / j_max;
    if distance <= FINISH_TOLERANCE || cruise_time <= 0.0 {
        return 1.0;
    }
    (distance / cruise_time / v_max).clamp(0.0, 1.0)
}

// ─── Landing ────────────────────────────────────────────────────────

/// Position, velocity and acceleration of one DOF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    p: f64,
    v: f64,
    a: f64,
}

impl Axis {
    #[inline]
    fn of(state: &KinematicState, i: usize) -> Self {
        Self {
            p: state.position[i],
            v: state.velocity[i],
            a: state.acceleration[i],
        }
    }

    #[inline]
    fn write(self, state: &mut KinematicState, i: usize) {
        state.position[i] = self.p;
        state.velocity[i] = self.v;
        state.acceleration[i] = self.a;
    }

    /// State after one period at constant `jerk`.
    #[inline]
    fn advanced(self, jerk: f64, dt: f64) -> Self {
        Self {
            p: self.p + self.v * dt + self.a * dt * dt / 2.0 + jerk * dt * dt * dt / 6.0,
            v: self.v + self.a * dt + jerk * dt * dt / 2.0,
            a: self.a + jerk * dt,
        }
    }
}

/// Minimum-norm jerk sequence that takes one DOF onto its target in exactly
/// `steps` periods.
///
/// Jerks are solved in period units (`jerk * dt^3`). The contribution of the
/// jerk applied in period `k` to the terminal (position, velocity,
/// acceleration) is [`landing_basis`]`(steps, k)`, so the sequence is a
/// combination of the three basis rows weighted by `weights`. One and two
/// periods are under-determined the other way round and are solved directly
/// in the least-squares sense.
#[derive(Debug, Clone, Copy)]
struct Landing {
    steps: usize,
    weights: [f64; 3],
    direct: [f64; 2],
}

impl Landing {
    fn solve(from: Axis, to: Axis, dt: f64, steps: usize) -> Option<Self> {
        let n = steps as f64;
        let residual = [
            to.p - (from.p + from.v * dt * n + from.a * dt * dt * n * n / 2.0),
            (to.v - (from.v + from.a * dt * n)) * dt,
            (to.a - from.a) * dt * dt,
        ];
        let mut landing = Self {
            steps,
            weights: [0.0; 3],
            direct: [0.0; 2],
        };
        match steps {
            0 => return None,
            1 => {
                let b = landing_basis(1, 0);
                landing.direct[0] = dot(&b, &residual) / dot(&b, &b);
            }
            2 => {
                let b0 = landing_basis(2, 0);
                let b1 = landing_basis(2, 1);
                let (g00, g01, g11) = (dot(&b0, &b0), dot(&b0, &b1), dot(&b1, &b1));
                let (r0, r1) = (dot(&b0, &residual), dot(&b1, &residual));
                let det = g00 * g11 - g01 * g01;
                if det == 0.0 {
                    return None;
                }
                landing.direct = [(r0 * g11 - r1 * g01) / det, (g00 * r1 - g01 * r0) / det];
            }
            _ => landing.weights = solve3(landing_gram(steps), residual)?,
        }
        Some(landing)
    }

    /// Physical jerk for period `k`.
    #[inline]
    fn jerk(&self, k: usize, dt: f64) -> f64 {
        let scaled = if self.steps >= 3 {
            dot(&self.weights, &landing_basis(self.steps, k))
        } else {
            self.direct[k]
        };
        scaled / (dt * dt * dt)
    }

    /// Replay the sequence: every period within the limits of DOF `i`, and
    /// the end state on the target.
    fn fits(&self, from: Axis, to: Axis, limits: &ConstraintSet, i: usize, dt: f64) -> bool {
        let v_max = limits.max_velocity[i] * LIMIT_SLACK;
        let a_max = limits.max_acceleration[i] * LIMIT_SLACK;
        let j_max = limits.max_jerk[i] * LIMIT_SLACK;

        let mut s = from;
        for k in 0..self.steps {
            let jerk = self.jerk(k, dt);
            if !jerk.is_finite() || jerk.abs() > j_max {
                return false;
            }
            s = s.advanced(jerk, dt);
            if s.a.abs() > a_max || s.v.abs() > v_max {
                return false;
            }
        }
        (s.p - to.p).abs() <= LANDING_TOLERANCE
            && (s.v - to.v).abs() <= LANDING_TOLERANCE
            && (s.a - to.a).abs() <= LANDING_TOLERANCE
    }
}

/// Terminal effect, in period units, of a unit jerk in period `k` of `steps`.
#[inline]
fn landing_basis(steps: usize, k: usize) -> [f64; 3] {
    let m = (steps - 1 - k) as f64;
    [(1.0 + 3.0 * m + 3.0 * m * m) / 6.0, (1.0 + 2.0 * m) / 2.0, 1.0]
}

/// Sum over all periods of the outer products of [`landing_basis`], in
/// closed form.
fn landing_gram(steps: usize) -> [[f64; 3]; 3] {
    let n = steps as f64;
    let m = n - 1.0;
    let s0 = n;
    let s1 = m * (m + 1.0) / 2.0;
    let s2 = m * (m + 1.0) * (2.0 * m + 1.0) / 6.0;
    let s3 = s1 * s1;
    let s4 = m * (m + 1.0) * (2.0 * m + 1.0) * (3.0 * m * m + 3.0 * m - 1.0) / 30.0;

    let cc = (s0 + 6.0 * s1 + 15.0 * s2 + 18.0 * s3 + 9.0 * s4) / 36.0;
    let cb = (s0 + 5.0 * s1 + 9.0 * s2 + 6.0 * s3) / 12.0;
    let c1 = (s0 + 3.0 * s1 + 3.0 * s2) / 6.0;
    let bb = (s0 + 4.0 * s1 + 4.0 * s2) / 4.0;
    let b1 = (s0 + 2.0 * s1) / 2.0;
    [[cc, cb, c1], [cb, bb, b1], [c1, b1, s0]]
}

/// Gaussian elimination with partial pivoting.
fn solve3(g: [[f64; 3]; 3], r: [f64; 3]) -> Option<[f64; 3]> {
    let mut m = [[0.0; 4]; 3];
    for (row, (g_row, r_i)) in m.iter_mut().zip(g.iter().zip(r)) {
        row[..3].copy_from_slice(g_row);
        row[3] = r_i;
    }
    for c in 0..3 {
        let pivot = (c..3).max_by(|&x, &y| m[x][c].abs().total_cmp(&m[y][c].abs()))?;
        if m[pivot][c] == 0.0 || !m[pivot][c].is_finite() {
            return None;
        }
        m.swap(c, pivot);
        for i in c + 1..3 {
            let f = m[i][c] / m[c][c];
            for k in c..4 {
                m[i][k] -= f * m[c][k];
            }
        }
    }
    let mut x = [0.0; 3];
    for i in (0..3).rev() {
        let mut s = m[i][3];
        for k in i + 1..3 {
            s -= m[i][k] * x[k];
        }
        x[i] = s / m[i][i];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[inline]
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Generous upper bound, in periods, on how long DOF `i` needs to land.
fn landing_horizon(from: Axis, to: Axis, limits: &ConstraintSet, i: usize, dt: f64) -> usize {
    let v_max = limits.max_velocity[i];
    let a_max = limits.max_acceleration[i];
    let j_max = limits.max_jerk[i];
    let distance = (to.p - from.p).abs();
    let speed = from.v.abs() + to.v.abs();

    let mut t = 2.0 * (distance / v_max + 2.0 * v_max / a_max + a_max / j_max + speed / a_max);
    if speed > 0.0 {
        t = t.max(2.0 * distance / speed);
    }
    ((t / dt).ceil() as usize).min(MAX_LANDING_STEPS)
}

// ─── Tests ──────────────────────────────────────────────────────────
