//! Kinematics for a 5-DOF PUMA-style arm.
//!
//! Provides coordinate frames, forward kinematics of the fixed PUMA chain,
//! a closed-form geometric inverse-kinematics solver with an elbow
//! continuity hint, and interpolation between poses and configurations.
//!
//! # Architecture
//!
//! ```text
//! target Frame ──► IkSolver ──► IkSet (joints, configuration, frames)
//!                     ▲                 │
//!                     └── hint ─────────┘
//! ConfigurationSpace ──► PumaChain ──► frames F1..F5
//! ```
//!
//! Everything here is pure computation on `Copy` values; the simulation loop
//! that drives it lives in `puma-sim`.

pub mod chain;
pub mod frame;
pub mod interpolate;
pub mod solver;
pub mod types;

pub use chain::PumaChain;
pub use frame::{Axis, Frame};
pub use interpolate::{configuration_space_delta, interpolate_configuration, interpolate_frames};
pub use solver::{Elbow, ElbowCase, IkSolver, SolverConfig, DEGENERACY_EPSILON};
pub use types::{
    normalize_angle, shortest_angle, ConfigurationSpace, IkSet, Joints, Lengths, JOINT_COUNT,
};
