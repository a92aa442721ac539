use thiserror::Error;

/// Top-level error type for the PUMA simulator.
#[derive(Debug, Error)]
pub enum PumaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid speed: {0} (must be within [0.1, 100] %/s)")]
    InvalidSpeed(f32),

    #[error("Invalid length l{index}: {value} (must be >= 0.01)")]
    InvalidLength { index: usize, value: f32 },

    #[error("Invalid tick period: must be > 0 ms")]
    InvalidTickPeriod,

    #[error("Quaternion must not be zero")]
    ZeroQuaternion,

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Simulation worker lifecycle errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to spawn simulation worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Simulation worker panicked")]
    WorkerPanicked,
}
