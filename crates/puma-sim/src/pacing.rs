//! Tick pacing.
//!
//! A [`Pacer`] turns a variable compute time per tick into a fixed average
//! tick period. Whatever is left of the period after computing is waited
//! out by a [`WaitPolicy`]; any overshoot (a long tick, or a wait that ran
//! late) is carried forward as pacing debt and taken off the next budget:
//!
//! ```text
//! budget = period - compute - debt
//! debt   = waited - budget
//! ```
//!
//! The arithmetic is the same for every policy.

use std::time::{Duration, Instant};

use puma_core::PacingMode;

// ---------------------------------------------------------------------------
// WaitPolicy
// ---------------------------------------------------------------------------

/// Strategy used to wait out the remainder of a tick.
pub trait WaitPolicy: Send {
    /// Wait for roughly `budget` and return the time actually spent.
    fn wait(&mut self, budget: Duration) -> Duration;
}

/// Active wait on the monotonic clock. Sub-millisecond precision at the
/// cost of keeping one core busy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinWait;

impl WaitPolicy for SpinWait {
    fn wait(&mut self, budget: Duration) -> Duration {
        let start = Instant::now();
        while start.elapsed() < budget {
            std::hint::spin_loop();
        }
        start.elapsed()
    }
}

/// Timer-based wait using the OS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepWait;

impl WaitPolicy for SleepWait {
    fn wait(&mut self, budget: Duration) -> Duration {
        let start = Instant::now();
        std::thread::sleep(budget);
        start.elapsed()
    }
}

impl WaitPolicy for Box<dyn WaitPolicy> {
    fn wait(&mut self, budget: Duration) -> Duration {
        (**self).wait(budget)
    }
}

/// Boxed policy for a configured pacing mode.
#[must_use]
pub fn policy_for(mode: PacingMode) -> Box<dyn WaitPolicy> {
    match mode {
        PacingMode::Spin => Box::new(SpinWait),
        PacingMode::Sleep => Box::new(SleepWait),
    }
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Fixed-period pacer with signed pacing debt in nanoseconds.
#[derive(Debug)]
pub struct Pacer<W> {
    period_nanos: i64,
    debt_nanos: i64,
    policy: W,
}

impl<W: WaitPolicy> Pacer<W> {
    /// Create a pacer for `period` with no debt.
    #[must_use]
    pub fn new(period: Duration, policy: W) -> Self {
        Self {
            period_nanos: signed_nanos(period),
            debt_nanos: 0,
            policy,
        }
    }

    /// Current pacing debt in nanoseconds. Positive means the loop is behind.
    #[must_use]
    pub const fn debt_nanos(&self) -> i64 {
        self.debt_nanos
    }

    /// Time left in this tick after `compute`, net of debt. May be negative.
    #[must_use]
    pub fn budget_nanos(&self, compute: Duration) -> i64 {
        self.period_nanos
            .saturating_sub(signed_nanos(compute))
            .saturating_sub(self.debt_nanos)
    }

    /// Finish a tick that took `compute` so far: wait out the budget if
    /// there is one and update the debt. Returns the time spent waiting.
    pub fn pace(&mut self, compute: Duration) -> Duration {
        let budget = self.budget_nanos(compute);
        let waited = if budget > 0 {
            self.policy
                .wait(Duration::from_nanos(budget.unsigned_abs()))
        } else {
            Duration::ZERO
        };
        self.debt_nanos = signed_nanos(waited).saturating_sub(budget);
        waited
    }
}

fn signed_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
