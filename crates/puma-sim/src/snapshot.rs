//! Published simulation state.
//!
//! The worker overwrites a [`SnapshotCell`] once per tick with a fully built
//! [`Snapshot`]; readers get a copy. Nothing ever hands out a reference into
//! the cell, so a reader cannot observe a half-written tick.

use std::sync::{Mutex, PoisonError};

use nalgebra::{Matrix4, Point3};
use puma_core::SimTime;
use puma_ik::{Frame, Lengths, JOINT_COUNT};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One tick of published state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Joint transforms F1..F5 along the configuration-space path.
    pub commanded: [Matrix4<f32>; JOINT_COUNT],
    /// Joint transforms F1..F5 along the Cartesian path, re-solved each tick.
    pub achieved: [Matrix4<f32>; JOINT_COUNT],
    /// Prismatic extension for `[commanded, achieved]`.
    pub q2: [f32; 2],
    pub lengths: Lengths,
    /// Simulated time at which this snapshot was taken.
    pub elapsed: SimTime,
    /// Path parameter in `[0, 1]`.
    pub progress: f32,
    /// Tick that produced this snapshot; `0` before the first tick.
    pub tick: u64,
}

impl Snapshot {
    /// Snapshot of two frame chains.
    #[must_use]
    pub fn from_frames(
        commanded: &[Frame; JOINT_COUNT],
        achieved: &[Frame; JOINT_COUNT],
        q2: [f32; 2],
        lengths: Lengths,
    ) -> Self {
        Self {
            commanded: commanded.map(|f| f.homogeneous_matrix()),
            achieved: achieved.map(|f| f.homogeneous_matrix()),
            q2,
            lengths,
            elapsed: SimTime::new(),
            progress: 0.0,
            tick: 0,
        }
    }

    /// Builder: stamp the snapshot with time, progress and tick.
    #[must_use]
    pub const fn at(mut self, elapsed: SimTime, progress: f32, tick: u64) -> Self {
        self.elapsed = elapsed;
        self.progress = progress;
        self.tick = tick;
        self
    }

    /// Effector position (F5 origin) along the commanded path.
    #[must_use]
    pub fn commanded_effector(&self) -> Point3<f32> {
        translation_of(&self.commanded[JOINT_COUNT - 1])
    }

    /// Effector position (F5 origin) along the achieved path.
    #[must_use]
    pub fn achieved_effector(&self) -> Point3<f32> {
        translation_of(&self.achieved[JOINT_COUNT - 1])
    }
}

fn translation_of(matrix: &Matrix4<f32>) -> Point3<f32> {
    Point3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

// ---------------------------------------------------------------------------
// SnapshotCell
// ---------------------------------------------------------------------------

/// Lock-guarded slot holding the latest snapshot.
#[derive(Debug)]
pub struct SnapshotCell {
    latest: Mutex<Snapshot>,
}

impl SnapshotCell {
    #[must_use]
    pub const fn new(initial: Snapshot) -> Self {
        Self {
            latest: Mutex::new(initial),
        }
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        // Only whole snapshots are ever stored, so a poisoned lock still
        // holds a consistent value.
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Copy of the latest published snapshot.
    #[must_use]
    pub fn latest(&self) -> Snapshot {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
