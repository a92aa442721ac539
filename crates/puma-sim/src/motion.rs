//! Per-tick motion along a start-to-end path.
//!
//! A [`MotionPlan`] is the deterministic half of the simulation loop. It
//! owns simulated time and the continuity hint, and turns each tick into a
//! [`Snapshot`] with two renderings of the same motion:
//!
//! * **commanded**: straight line in configuration space, rendered by
//!   forward kinematics;
//! * **achieved**: straight line and slerp in Cartesian space, re-solved by
//!   inverse kinematics using the previous tick's solution as hint.
//!
//! Wall-clock pacing and publication live in [`runner`](crate::runner).

use std::time::Duration;

use puma_core::{ConfigError, RunConfig, SimTime};
use puma_ik::{
    configuration_space_delta, interpolate_configuration, interpolate_frames, ConfigurationSpace,
    Frame, IkSet, IkSolver, Lengths, PumaChain,
};
use tracing::trace;

use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// RunParams
// ---------------------------------------------------------------------------

/// Immutable parameters of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    pub start: Frame,
    pub end: Frame,
    /// Percent of the path covered per simulated second.
    pub speed: f32,
    pub lengths: Lengths,
    /// Fixed tick period, both simulated and wall-clock.
    pub tick_period: Duration,
}

impl RunParams {
    /// Validate a run configuration and build frames from its poses.
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            start: Frame::from_isometry(&config.start.to_isometry()?),
            end: Frame::from_isometry(&config.end.to_isometry()?),
            speed: config.speed,
            lengths: config.lengths_vector(),
            tick_period: config.tick_period(),
        })
    }
}

// ---------------------------------------------------------------------------
// MotionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a motion plan. Transitions one way only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    /// Ticking towards the end pose.
    #[default]
    Running,
    /// The end pose has been published; further ticks do nothing.
    Terminated,
}

impl MotionState {
    /// Returns `true` while ticks still advance the motion.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` once the final pose has been produced.
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

// ---------------------------------------------------------------------------
// MotionPlan
// ---------------------------------------------------------------------------

/// Start/end solutions plus the running state of one motion.
#[derive(Debug, Clone)]
pub struct MotionPlan {
    params: RunParams,
    chain: PumaChain,
    solver: IkSolver,
    start_config: ConfigurationSpace,
    end_config: ConfigurationSpace,
    delta: ConfigurationSpace,
    previous: Option<IkSet>,
    time: SimTime,
    ticks: u64,
    state: MotionState,
}

impl MotionPlan {
    /// Solve both endpoints once and prepare the configuration-space delta.
    #[must_use]
    pub fn new(params: RunParams) -> Self {
        let chain = PumaChain::new(params.lengths);
        let solver = IkSolver::with_defaults();
        let start_config = solver.solve(&chain, &params.start, None).config;
        let end_config = solver.solve(&chain, &params.end, None).config;
        let delta = configuration_space_delta(&start_config, &end_config);
        Self {
            params,
            chain,
            solver,
            start_config,
            end_config,
            delta,
            previous: None,
            time: SimTime::new(),
            ticks: 0,
            state: MotionState::Running,
        }
    }

    #[must_use]
    pub const fn params(&self) -> &RunParams {
        &self.params
    }

    #[must_use]
    pub const fn state(&self) -> MotionState {
        self.state
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub const fn elapsed(&self) -> SimTime {
        self.time
    }

    /// Ticks executed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Configuration solved for the start pose.
    #[must_use]
    pub const fn start_config(&self) -> &ConfigurationSpace {
        &self.start_config
    }

    /// Configuration solved for the end pose.
    #[must_use]
    pub const fn end_config(&self) -> &ConfigurationSpace {
        &self.end_config
    }

    /// State before the first tick: both paths at the start pose.
    #[must_use]
    pub fn initial_snapshot(&self) -> Snapshot {
        let (snapshot, _) = self.evaluate(0.0, None);
        snapshot
    }

    /// Advance one tick and return the snapshot to publish.
    ///
    /// The tick that reaches the end of the path still produces the final
    /// pose and then terminates the plan. Returns `None` once terminated.
    pub fn tick(&mut self) -> Option<Snapshot> {
        if self.state.is_terminated() {
            return None;
        }
        self.time.advance_duration(self.params.tick_period);
        self.ticks += 1;

        let raw = self.time.secs_f32() * self.params.speed / 100.0;
        let t = if raw >= 1.0 {
            self.state = MotionState::Terminated;
            1.0
        } else {
            raw
        };

        let (snapshot, solution) = self.evaluate(t, self.previous.as_ref());
        self.previous = Some(solution);
        trace!(tick = self.ticks, progress = t, "motion tick");
        Some(snapshot.at(self.time, t, self.ticks))
    }

    /// Evaluate `frames` evenly spaced points of the path without advancing
    /// the plan, carrying the continuity hint from one sample to the next.
    ///
    /// Fewer than two frames yields just the start pose.
    #[must_use]
    pub fn sample(&self, frames: usize) -> Vec<Snapshot> {
        if frames < 2 {
            return vec![self.initial_snapshot()];
        }
        let last = frames - 1;
        let mut previous: Option<IkSet> = None;
        (0..frames)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / last as f32;
                let (snapshot, solution) = self.evaluate(t, previous.as_ref());
                previous = Some(solution);
                snapshot.at(self.time_for(t), t, i as u64)
            })
            .collect()
    }

    /// Simulated time at which the path parameter reaches `t`.
    fn time_for(&self, t: f32) -> SimTime {
        let secs = t * 100.0 / self.params.speed;
        Duration::try_from_secs_f32(secs).map_or_else(|_| SimTime::new(), SimTime::from_duration)
    }

    /// Commanded configuration at `t`; the end of the path is the end
    /// solution itself, not `start + delta`.
    fn commanded_config(&self, t: f32) -> ConfigurationSpace {
        if t >= 1.0 {
            self.end_config
        } else {
            interpolate_configuration(&self.start_config, &self.delta, t)
        }
    }

    fn evaluate(&self, t: f32, previous: Option<&IkSet>) -> (Snapshot, IkSet) {
        let commanded_config = self.commanded_config(t);
        let commanded = self.chain.forward_kinematics(&commanded_config);

        let target = interpolate_frames(&self.params.start, &self.params.end, t);
        let achieved = self.solver.solve(&self.chain, &target, previous);

        let snapshot = Snapshot::from_frames(
            &commanded,
            &achieved.frames,
            [commanded_config.q2, achieved.config.q2],
            self.params.lengths,
        );
        (snapshot, achieved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
