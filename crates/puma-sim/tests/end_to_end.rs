//! Integration test: full runs through the public `Simulation` handle.
//!
//! Checks that:
//! 1. The reference run (origin to (3, 6, 9), 10 %/s, lengths (3, 2, 1))
//!    ends with both effector paths at the end pose and reports completion
//! 2. A consumer polling at its own cadence only ever sees progress move
//!    forward
//! 3. Restarting replaces the worker and the new run starts from scratch

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use nalgebra::Point3;
use puma_core::{PacingMode, PoseConfig, RunConfig};
use puma_sim::Simulation;

fn reference_config() -> RunConfig {
    RunConfig::default()
        .with_start(PoseConfig::at([0.0, 0.0, 0.0]))
        .with_end(PoseConfig::at([3.0, 6.0, 9.0]))
        .with_speed(10.0)
        .with_lengths([3.0, 2.0, 1.0])
        .with_pacing(PacingMode::Sleep)
}

#[test]
fn reference_run_reaches_end_pose() {
    let sim = Simulation::start(&reference_config()).unwrap();
    let started = Instant::now();
    while !sim.is_completed() {
        assert!(started.elapsed() < Duration::from_secs(30), "run did not complete");
        std::thread::sleep(Duration::from_millis(50));
    }

    let end = Point3::new(3.0, 6.0, 9.0);
    let last = sim.snapshot();
    assert_relative_eq!(last.progress, 1.0);
    assert_eq!(last.elapsed.millis(), 10_000);
    assert_relative_eq!(last.commanded_effector(), end, epsilon = 1e-3);
    assert_relative_eq!(last.achieved_effector(), end, epsilon = 1e-3);
    assert_relative_eq!(last.lengths.x, 3.0);

    let stats = sim.wait().unwrap();
    assert!(stats.completed);
    assert_eq!(stats.ticks, 1000);
}

#[test]
fn consumer_sees_monotonic_progress() {
    let config = reference_config().with_speed(100.0).with_pacing(PacingMode::Spin);
    let sim = Simulation::start(&config).unwrap();
    let mut last_tick = 0;
    let mut last_progress = 0.0_f32;
    while !sim.is_completed() {
        let snapshot = sim.snapshot();
        assert!(snapshot.tick >= last_tick);
        assert!(snapshot.progress >= last_progress);
        last_tick = snapshot.tick;
        last_progress = snapshot.progress;
        std::thread::sleep(Duration::from_millis(16));
    }
    assert_eq!(sim.snapshot().tick, 100);
}

#[test]
fn restart_replaces_run() {
    let slow = reference_config().with_speed(1.0);
    let mut sim = Simulation::start(&slow).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(sim.is_running());

    let fast = reference_config()
        .with_speed(100.0)
        .with_end(PoseConfig::at([1.0, 2.0, 3.0]));
    sim.restart(&fast).unwrap();
    assert!(!sim.is_completed());
    assert_relative_eq!(sim.params().speed, 100.0);

    let stats = sim.wait().unwrap();
    assert!(stats.completed);
    assert_eq!(stats.ticks, 100);
}

#[test]
fn restart_with_invalid_config_keeps_current_run() {
    let mut sim = Simulation::start(&reference_config().with_speed(1.0)).unwrap();
    let bad = reference_config().with_lengths([3.0, 0.0, 1.0]);
    assert!(sim.restart(&bad).is_err());
    assert!(sim.is_running());
    let stats = sim.stop().unwrap().unwrap();
    assert!(!stats.completed);
}
