use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Slowest accepted traversal speed, in percent of path per second.
pub const MIN_SPEED: f32 = 0.1;
/// Fastest accepted traversal speed, in percent of path per second.
pub const MAX_SPEED: f32 = 100.0;
/// Shortest accepted link length.
pub const MIN_LENGTH: f32 = 0.01;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_speed() -> f32 {
    10.0
}
const fn default_lengths() -> [f32; 3] {
    [3.0, 2.0, 1.0]
}
const fn default_tick_ms() -> u64 {
    10
}
fn default_end() -> PoseConfig {
    PoseConfig::at([3.0, 6.0, 9.0])
}

// ---------------------------------------------------------------------------
// RotationConfig
// ---------------------------------------------------------------------------

/// Orientation of a pose as entered by the user.
///
/// In TOML this is a single-key table, e.g.
/// `rotation = { euler_degrees = [0.0, 90.0, 0.0] }` or
/// `rotation = { quaternion = [0.0, 0.0, 0.0, 1.0] }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationConfig {
    /// Rotations about X, Y and Z in degrees, composed as `Rz * Ry * Rx`.
    EulerDegrees([f32; 3]),
    /// Quaternion as `[x, y, z, w]`. Normalised before use.
    Quaternion([f32; 4]),
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self::EulerDegrees([0.0; 3])
    }
}

impl RotationConfig {
    /// Convert to a unit quaternion.
    pub fn to_unit_quaternion(&self) -> Result<UnitQuaternion<f32>, ConfigError> {
        match *self {
            Self::EulerDegrees([x, y, z]) => Ok(UnitQuaternion::from_euler_angles(
                x.to_radians(),
                y.to_radians(),
                z.to_radians(),
            )),
            Self::Quaternion([x, y, z, w]) => {
                UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f32::EPSILON)
                    .ok_or(ConfigError::ZeroQuaternion)
            }
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Self::EulerDegrees(v) => v.iter().all(|c| c.is_finite()),
            Self::Quaternion(v) => v.iter().all(|c| c.is_finite()),
        }
    }
}

// ---------------------------------------------------------------------------
// PoseConfig
// ---------------------------------------------------------------------------

/// A Cartesian end-effector pose: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: RotationConfig,
}

impl PoseConfig {
    /// Pose at `position` with identity rotation.
    #[must_use]
    pub const fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            rotation: RotationConfig::EulerDegrees([0.0; 3]),
        }
    }

    /// Set the rotation from Euler angles in degrees.
    #[must_use]
    pub const fn with_euler_degrees(mut self, degrees: [f32; 3]) -> Self {
        self.rotation = RotationConfig::EulerDegrees(degrees);
        self
    }

    /// Set the rotation from an `[x, y, z, w]` quaternion.
    #[must_use]
    pub const fn with_quaternion(mut self, xyzw: [f32; 4]) -> Self {
        self.rotation = RotationConfig::Quaternion(xyzw);
        self
    }

    /// Position as a vector.
    #[must_use]
    pub fn translation(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    /// Rigid transform of this pose.
    pub fn to_isometry(&self) -> Result<Isometry3<f32>, ConfigError> {
        let rotation = self.rotation.to_unit_quaternion()?;
        Ok(Isometry3::from_parts(
            Translation3::from(self.translation()),
            rotation,
        ))
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if !self.position.iter().all(|c| c.is_finite()) || !self.rotation.is_finite() {
            return Err(ConfigError::NonFinite(name));
        }
        self.rotation.to_unit_quaternion().map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// PacingMode
// ---------------------------------------------------------------------------

/// How the worker waits out the remainder of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Busy-wait on a monotonic clock. Sub-millisecond precision, burns a core.
    #[default]
    Spin,
    /// Sleep on the OS timer. Cheap, but only as precise as the scheduler.
    Sleep,
}

impl fmt::Display for PacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spin => f.write_str("spin"),
            Self::Sleep => f.write_str("sleep"),
        }
    }
}

impl FromStr for PacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spin" => Ok(Self::Spin),
            "sleep" => Ok(Self::Sleep),
            other => Err(format!("unknown pacing mode '{other}' (expected spin or sleep)")),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Configuration of one simulation run.
///
/// Fixed when the run starts; changing any of it means starting a new run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Pose the end effector starts at (default: origin, identity rotation).
    #[serde(default)]
    pub start: PoseConfig,

    /// Pose the end effector ends at (default: (3, 6, 9), identity rotation).
    #[serde(default = "default_end")]
    pub end: PoseConfig,

    /// Traversal speed in percent of the path per simulated second (default: 10).
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Link lengths `[l1, l3, l4]`: base to shoulder, elbow link, wrist to
    /// effector (default: `[3, 2, 1]`).
    #[serde(default = "default_lengths")]
    pub lengths: [f32; 3],

    /// Fixed tick period in milliseconds (default: 10).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Wait strategy between ticks (default: spin).
    #[serde(default)]
    pub pacing: PacingMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start: PoseConfig::default(),
            end: default_end(),
            speed: default_speed(),
            lengths: default_lengths(),
            tick_ms: default_tick_ms(),
            pacing: PacingMode::default(),
        }
    }
}

impl RunConfig {
    /// Set the start pose.
    #[must_use]
    pub const fn with_start(mut self, start: PoseConfig) -> Self {
        self.start = start;
        self
    }

    /// Set the end pose.
    #[must_use]
    pub const fn with_end(mut self, end: PoseConfig) -> Self {
        self.end = end;
        self
    }

    /// Set the traversal speed.
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the link lengths.
    #[must_use]
    pub const fn with_lengths(mut self, lengths: [f32; 3]) -> Self {
        self.lengths = lengths;
        self
    }

    /// Set the tick period in milliseconds.
    #[must_use]
    pub const fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the pacing mode.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: PacingMode) -> Self {
        self.pacing = pacing;
        self
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        for (i, &value) in self.lengths.iter().enumerate() {
            if !value.is_finite() || value < MIN_LENGTH {
                // Links are named l1, l3, l4; q2 is the prismatic joint.
                let index = if i == 0 { 1 } else { i + 2 };
                return Err(ConfigError::InvalidLength { index, value });
            }
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidTickPeriod);
        }
        self.start.validate("start")?;
        self.end.validate("end")
    }

    /// Link lengths as a vector (`x = l1`, `y = l3`, `z = l4`).
    #[must_use]
    pub fn lengths_vector(&self) -> Vector3<f32> {
        Vector3::from(self.lengths)
    }

    /// Tick period as a [`Duration`].
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_config_matches_reference_scene() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.start.position, [0.0; 3]);
        assert_eq!(cfg.end.position, [3.0, 6.0, 9.0]);
        assert_relative_eq!(cfg.speed, 10.0);
        assert_eq!(cfg.lengths, [3.0, 2.0, 1.0]);
        assert_eq!(cfg.tick_period(), Duration::from_millis(10));
        assert_eq!(cfg.pacing, PacingMode::Spin);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg = RunConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn full_toml_round_trips_fields() {
        let toml_str = r#"
            speed = 25.0
            lengths = [4.0, 2.5, 0.5]
            tick_ms = 5
            pacing = "sleep"

            [start]
            position = [1.0, 0.0, 2.0]
            rotation = { euler_degrees = [0.0, 90.0, 0.0] }

            [end]
            position = [2.0, 3.0, 4.0]
            rotation = { quaternion = [0.0, 0.0, 0.0, 2.0] }
        "#;
        let cfg = RunConfig::from_toml_str(toml_str).unwrap();
        assert_relative_eq!(cfg.speed, 25.0);
        assert_eq!(cfg.lengths, [4.0, 2.5, 0.5]);
        assert_eq!(cfg.tick_ms, 5);
        assert_eq!(cfg.pacing, PacingMode::Sleep);
        assert_eq!(
            cfg.start.rotation,
            RotationConfig::EulerDegrees([0.0, 90.0, 0.0])
        );

        // Non-unit quaternion is normalised.
        let end = cfg.end.to_isometry().unwrap();
        assert_relative_eq!(end.rotation.w, 1.0, epsilon = 1e-6);
        assert_relative_eq!(end.translation.vector.z, 4.0);
    }

    #[test]
    fn euler_degrees_compose_z_y_x() {
        let pose = PoseConfig::at([0.0; 3]).with_euler_degrees([0.0, 0.0, 90.0]);
        let iso = pose.to_isometry().unwrap();
        let x = iso.rotation * Vector3::x();
        assert_relative_eq!(x, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn zero_quaternion_rejected() {
        let cfg = RunConfig::default().with_end(PoseConfig::at([1.0; 3]).with_quaternion([0.0; 4]));
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroQuaternion)));
    }

    #[test]
    fn speed_out_of_range_rejected() {
        for speed in [0.0, 0.05, 100.5, f32::NAN] {
            let cfg = RunConfig::default().with_speed(speed);
            assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSpeed(_))));
        }
        assert!(RunConfig::default().with_speed(MIN_SPEED).validate().is_ok());
        assert!(RunConfig::default().with_speed(MAX_SPEED).validate().is_ok());
    }

    #[test]
    fn short_link_reports_link_name() {
        let cfg = RunConfig::default().with_lengths([3.0, 0.0, 1.0]);
        match cfg.validate() {
            Err(ConfigError::InvalidLength { index, .. }) => assert_eq!(index, 3),
            other => panic!("expected InvalidLength, got {other:?}"),
        }
        let cfg = RunConfig::default().with_lengths([3.0, 2.0, 0.001]);
        match cfg.validate() {
            Err(ConfigError::InvalidLength { index, .. }) => assert_eq!(index, 4),
            other => panic!("expected InvalidLength, got {other:?}"),
        }
    }

    #[test]
    fn zero_tick_rejected() {
        let cfg = RunConfig::default().with_tick_ms(0);
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTickPeriod)));
    }

    #[test]
    fn non_finite_position_rejected() {
        let cfg = RunConfig::default().with_start(PoseConfig::at([f32::INFINITY, 0.0, 0.0]));
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFinite("start"))));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = RunConfig::from_toml_str("speed = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn pacing_mode_from_str() {
        assert_eq!("spin".parse::<PacingMode>(), Ok(PacingMode::Spin));
        assert_eq!("Sleep".parse::<PacingMode>(), Ok(PacingMode::Sleep));
        assert!("yield".parse::<PacingMode>().is_err());
        assert_eq!(PacingMode::Sleep.to_string(), "sleep");
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = RunConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
