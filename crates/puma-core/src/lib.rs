// puma-core: run configuration, errors and simulation time for the PUMA arm simulator.

pub mod config;
pub mod error;
pub mod time;

pub use config::{PacingMode, PoseConfig, RotationConfig, RunConfig};
pub use error::{ConfigError, PumaError, SimError};
pub use time::SimTime;
