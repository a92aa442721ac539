//! Worker thread driving a [`MotionPlan`] in real time.
//!
//! [`Simulation`] is the handle the consumer holds. It owns the shared
//! memory of the run (latest snapshot plus the terminate and completed
//! flags) and the join handle of the single worker thread. The worker:
//!
//! 1. checks the terminate flag and exits if it is set;
//! 2. ticks the plan and publishes the snapshot;
//! 3. stops after publishing the final pose;
//! 4. otherwise waits out the rest of the tick through its [`Pacer`].
//!
//! Solving happens outside the lock; only the publish takes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use puma_core::{PumaError, RunConfig, SimError, SimTime};
use tracing::{debug, error, info, trace};

use crate::motion::{MotionPlan, RunParams};
use crate::pacing::{policy_for, Pacer, WaitPolicy};
use crate::snapshot::{Snapshot, SnapshotCell};
use crate::stats::TickStats;

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "puma-sim";

// ---------------------------------------------------------------------------
// SymMemory
// ---------------------------------------------------------------------------

/// State shared between the worker and the consumer of one run.
#[derive(Debug)]
struct SymMemory {
    snapshot: SnapshotCell,
    terminate: AtomicBool,
    completed: AtomicBool,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Handle to a running simulation.
///
/// Dropping the handle cancels the run and joins the worker.
#[derive(Debug)]
pub struct Simulation {
    params: RunParams,
    memory: Arc<SymMemory>,
    worker: Option<JoinHandle<TickStats>>,
}

impl Simulation {
    /// Validate `config` and start a run with its configured pacing mode.
    pub fn start(config: &RunConfig) -> Result<Self, PumaError> {
        let params = RunParams::from_config(config)?;
        Ok(Self::start_with(params, policy_for(config.pacing))?)
    }

    /// Start a run from prepared parameters and an explicit wait policy.
    pub fn start_with<W>(params: RunParams, policy: W) -> Result<Self, SimError>
    where
        W: WaitPolicy + 'static,
    {
        let plan = MotionPlan::new(params);
        let memory = Arc::new(SymMemory {
            snapshot: SnapshotCell::new(plan.initial_snapshot()),
            terminate: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        });
        let pacer = Pacer::new(params.tick_period, policy);

        let worker_memory = Arc::clone(&memory);
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(plan, &worker_memory, pacer))
            .map_err(SimError::Spawn)?;

        info!(
            speed = params.speed,
            tick_ms = params.tick_period.as_millis(),
            "simulation started"
        );
        Ok(Self {
            params,
            memory,
            worker: Some(worker),
        })
    }

    #[must_use]
    pub const fn params(&self) -> &RunParams {
        &self.params
    }

    /// Copy of the latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.memory.snapshot.latest()
    }

    /// `true` once the final pose has been published.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.memory.completed.load(Ordering::Acquire)
    }

    /// `true` while the worker thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Simulated time of the latest snapshot.
    #[must_use]
    pub fn elapsed(&self) -> SimTime {
        self.snapshot().elapsed
    }

    /// Request termination and join the worker.
    ///
    /// The worker notices the request at the start of its next tick.
    /// Returns `None` if the worker was already joined.
    pub fn stop(&mut self) -> Result<Option<TickStats>, SimError> {
        self.memory.terminate.store(true, Ordering::Release);
        self.join()
    }

    /// Wait for the run to finish on its own and return its statistics.
    pub fn wait(mut self) -> Result<TickStats, SimError> {
        Ok(self.join()?.unwrap_or_default())
    }

    /// Replace this run with a new one. The old worker is joined before the
    /// new one is spawned.
    pub fn restart(&mut self, config: &RunConfig) -> Result<(), PumaError> {
        let params = RunParams::from_config(config)?;
        self.stop()?;
        *self = Self::start_with(params, policy_for(config.pacing))?;
        Ok(())
    }

    fn join(&mut self) -> Result<Option<TickStats>, SimError> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };
        let stats = worker.join().map_err(|_| SimError::WorkerPanicked)?;
        info!(ticks = stats.ticks, completed = stats.completed, "worker joined");
        Ok(Some(stats))
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                error!(%e, "worker did not shut down cleanly");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn run_worker<W: WaitPolicy>(
    mut plan: MotionPlan,
    memory: &SymMemory,
    mut pacer: Pacer<W>,
) -> TickStats {
    let mut stats = TickStats::new();
    let mut last_start: Option<Instant> = None;

    loop {
        if memory.terminate.load(Ordering::Acquire) {
            debug!(tick = plan.ticks(), "simulation cancelled");
            break;
        }

        let tick_start = Instant::now();
        if let Some(last) = last_start {
            stats.record_interval(tick_start - last);
        }
        last_start = Some(tick_start);

        let Some(snapshot) = plan.tick() else {
            break;
        };
        memory.snapshot.publish(snapshot);
        stats.record_tick();

        if plan.state().is_terminated() {
            memory.completed.store(true, Ordering::Release);
            stats.completed = true;
            info!(
                ticks = stats.ticks,
                elapsed = %plan.elapsed(),
                "simulation completed"
            );
            break;
        }

        pacer.pace(tick_start.elapsed());
        stats.observe_debt(pacer.debt_nanos());
        trace!(
            tick = snapshot.tick,
            progress = snapshot.progress,
            debt_ns = pacer.debt_nanos(),
            "tick paced"
        );
    }

    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{SleepWait, SpinWait};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::time::Duration;

    fn fast_params() -> RunParams {
        // 100 %/s at 10 ms ticks: 100 ticks, about one second.
        RunParams::from_config(&RunConfig::default().with_speed(100.0)).unwrap()
    }

    #[test]
    fn initial_snapshot_published_before_first_tick() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(0.1)).unwrap();
        let mut sim = Simulation::start_with(params, SleepWait).unwrap();
        let first = sim.snapshot();
        assert!(first.tick <= 1);
        assert_relative_eq!(first.achieved_effector(), Point3::origin(), epsilon = 0.05);
        sim.stop().unwrap();
    }

    #[test]
    fn run_completes_and_reaches_end() {
        let sim = Simulation::start_with(fast_params(), SpinWait).unwrap();
        let memory = Arc::clone(&sim.memory);
        let stats = sim.wait().unwrap();

        assert!(stats.completed);
        assert_eq!(stats.ticks, 100);
        assert!(memory.completed.load(Ordering::Acquire));
        let last = memory.snapshot.latest();
        assert_eq!(last.tick, 100);
        assert_relative_eq!(last.progress, 1.0);
        let end = Point3::new(3.0, 6.0, 9.0);
        assert_relative_eq!(last.commanded_effector(), end, epsilon = 1e-3);
        assert_relative_eq!(last.achieved_effector(), end, epsilon = 1e-3);
    }

    #[test]
    fn paced_ticks_average_the_period() {
        let sim = Simulation::start_with(fast_params(), SpinWait).unwrap();
        let stats = sim.wait().unwrap();
        let mean = stats.mean_interval().unwrap();
        assert!(
            mean.abs_diff(Duration::from_millis(10)) < Duration::from_millis(2),
            "mean tick interval {mean:?}"
        );
    }

    #[test]
    fn stop_cancels_without_completing() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(1.0)).unwrap();
        let mut sim = Simulation::start_with(params, SleepWait).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        let stats = sim.stop().unwrap().unwrap();
        assert!(!stats.completed);
        assert!(!sim.is_completed());
        assert!(!sim.is_running());
        // Snapshot stays readable after the worker is gone.
        assert!(sim.snapshot().progress < 0.1);
        // Second stop has nothing left to join.
        assert!(sim.stop().unwrap().is_none());
    }

    #[test]
    fn drop_joins_worker() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(1.0)).unwrap();
        let sim = Simulation::start_with(params, SleepWait).unwrap();
        let memory = Arc::clone(&sim.memory);
        drop(sim);
        assert!(memory.terminate.load(Ordering::Acquire));
        // Only this test's handle is left once the worker has exited.
        assert_eq!(Arc::strong_count(&memory), 1);
    }

    /// Panics on its first wait, taking the worker down after one tick.
    struct PanickingWait;

    impl WaitPolicy for PanickingWait {
        fn wait(&mut self, _budget: Duration) -> Duration {
            panic!("wait policy failed");
        }
    }

    fn wait_for_exit(sim: &Simulation) {
        let started = std::time::Instant::now();
        while sim.is_running() {
            assert!(started.elapsed() < Duration::from_secs(5), "worker did not exit");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn stop_reports_panicked_worker() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(1.0)).unwrap();
        let mut sim = Simulation::start_with(params, PanickingWait).unwrap();
        wait_for_exit(&sim);
        assert!(matches!(sim.stop(), Err(SimError::WorkerPanicked)));
        assert!(!sim.is_completed());
        // The first tick was still published.
        assert_eq!(sim.snapshot().tick, 1);
    }

    #[test]
    fn drop_survives_panicked_worker() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(1.0)).unwrap();
        let sim = Simulation::start_with(params, PanickingWait).unwrap();
        let memory = Arc::clone(&sim.memory);
        wait_for_exit(&sim);
        drop(sim);
        assert!(memory.terminate.load(Ordering::Acquire));
        assert_eq!(Arc::strong_count(&memory), 1);
    }

    #[test]
    fn worker_thread_is_named() {
        let params = RunParams::from_config(&RunConfig::default().with_speed(1.0)).unwrap();
        let mut sim = Simulation::start_with(params, SleepWait).unwrap();
        let name = sim
            .worker
            .as_ref()
            .and_then(|w| w.thread().name().map(str::to_owned));
        assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
        sim.stop().unwrap();
    }
}
