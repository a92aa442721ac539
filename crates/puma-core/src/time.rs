use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond simulation clock.
///
/// Simulated time advances by a whole tick period each step. Keeping it as a
/// `u64` nanosecond count means ten thousand 10 ms ticks land on exactly
/// 100 s instead of drifting the way an `f32` accumulator would.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    /// Create a new `SimTime` at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { nanos: 0 }
    }

    /// Create a `SimTime` from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a `SimTime` from a [`Duration`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_duration(duration: Duration) -> Self {
        Self {
            nanos: duration.as_nanos() as u64,
        }
    }

    /// Elapsed milliseconds (truncated).
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Elapsed seconds as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    fn secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Elapsed seconds as `f32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn secs_f32(&self) -> f32 {
        self.secs_f64() as f32
    }

    /// Advance the clock by `delta_nanos` nanoseconds.
    const fn advance(&mut self, delta_nanos: u64) {
        self.nanos = self.nanos.saturating_add(delta_nanos);
    }

    /// Advance the clock by a [`Duration`].
    #[allow(clippy::cast_possible_truncation)]
    pub const fn advance_duration(&mut self, duration: Duration) {
        self.advance(duration.as_nanos() as u64);
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.nanos / 1_000_000_000;
        let millis = (self.nanos % 1_000_000_000) / 1_000_000;
        write!(f, "{total_secs}.{millis:03}s")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
