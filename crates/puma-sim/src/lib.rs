//! Fixed-period simulation loop for the PUMA arm.
//!
//! A run interpolates the arm from a start pose to an end pose in two ways
//! at once (configuration space and Cartesian space) and publishes both as
//! joint transforms on every tick. [`Simulation`] owns the worker thread;
//! the consumer polls [`Simulation::snapshot`] at its own cadence.
//!
//! # Example
//!
//! ```no_run
//! use puma_core::RunConfig;
//! use puma_sim::Simulation;
//!
//! let sim = Simulation::start(&RunConfig::default()).unwrap();
//! while !sim.is_completed() {
//!     let snapshot = sim.snapshot();
//!     println!("{:.3} {}", snapshot.progress, snapshot.achieved_effector());
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! ```

pub mod motion;
pub mod pacing;
pub mod runner;
pub mod snapshot;
pub mod stats;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use motion::{MotionPlan, MotionState, RunParams};
pub use pacing::{policy_for, Pacer, SleepWait, SpinWait, WaitPolicy};
pub use runner::{Simulation, WORKER_THREAD_NAME};
pub use snapshot::{Snapshot, SnapshotCell};
pub use stats::TickStats;
