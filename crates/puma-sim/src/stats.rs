//! Tick statistics.
//!
//! [`TickStats`] records what the worker actually did: how many ticks ran,
//! the wall-clock spacing between them and the worst pacing debt seen.

use std::time::Duration;

// ---------------------------------------------------------------------------
// TickStats
// ---------------------------------------------------------------------------

/// Wall-clock statistics of one run, returned when the worker exits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks executed (each one published a snapshot).
    pub ticks: u64,
    /// Number of measured tick-to-tick intervals.
    pub intervals: u64,
    /// Sum of the measured intervals.
    pub total_interval: Duration,
    /// Largest pacing debt observed, in nanoseconds.
    pub max_debt_nanos: i64,
    /// Whether the run reached the end of its path (as opposed to being
    /// cancelled).
    pub completed: bool,
}

impl TickStats {
    /// Create empty stats.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            intervals: 0,
            total_interval: Duration::ZERO,
            max_debt_nanos: 0,
            completed: false,
        }
    }

    /// Count one executed tick.
    pub const fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Add the wall-clock time between two consecutive tick starts.
    pub fn record_interval(&mut self, interval: Duration) {
        self.intervals += 1;
        self.total_interval += interval;
    }

    /// Track the worst pacing debt.
    pub fn observe_debt(&mut self, debt_nanos: i64) {
        self.max_debt_nanos = self.max_debt_nanos.max(debt_nanos);
    }

    /// Mean tick interval, if at least one interval was measured.
    #[must_use]
    pub fn mean_interval(&self) -> Option<Duration> {
        if self.intervals == 0 {
            return None;
        }
        let nanos = self.total_interval.as_nanos() / u128::from(self.intervals);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Largest pacing debt as a duration (zero if the loop was never behind).
    #[must_use]
    pub fn max_debt(&self) -> Duration {
        Duration::from_nanos(u64::try_from(self.max_debt_nanos).unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
