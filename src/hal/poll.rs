//! Bounded polling
//!
//! Every wait in the drivers is a [`Poller`] stepping a closure against a
//! fixed [`PollBudget`]. The budget counts condition checks, and the backoff
//! policy decides when a step sleeps: always (msgdma waits sleep 1 µs per
//! poll) or only once the remaining budget is below a threshold (I2C waits
//! spin freely and sleep near expiry).

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};

// =============================================================================
// Budget
// =============================================================================

/// Iteration budget and backoff policy for a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    iterations: u32,
    sleep_below: u32,
    sleep_us: u32,
}

impl PollBudget {
    /// Budget of `iterations` checks, sleeping 1 µs after every failed check
    #[must_use]
    pub const fn new(iterations: u32) -> Self {
        Self {
            iterations,
            sleep_below: u32::MAX,
            sleep_us: 1,
        }
    }

    /// Sleep duration in microseconds
    #[must_use]
    pub const fn with_sleep_us(mut self, sleep_us: u32) -> Self {
        self.sleep_us = sleep_us;
        self
    }

    /// Only sleep once fewer than `remaining` checks are left
    #[must_use]
    pub const fn with_sleep_threshold(mut self, remaining: u32) -> Self {
        self.sleep_below = remaining;
        self
    }

    /// Total checks allowed
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sleep duration in microseconds
    pub const fn sleep_us(&self) -> u32 {
        self.sleep_us
    }

    /// Check whether a step with `remaining` checks left should sleep
    pub const fn sleeps_at(&self, remaining: u32) -> bool {
        remaining < self.sleep_below
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Outcome of one polling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    /// Condition not met, budget left
    Waiting,
    /// Condition met
    Done(T),
    /// Budget exhausted
    TimedOut,
}

/// Decrementing-budget wait state machine.
#[derive(Debug)]
pub struct Poller {
    budget: PollBudget,
    remaining: u32,
}

impl Poller {
    /// Start a wait with the full budget
    pub const fn new(budget: PollBudget) -> Self {
        Self {
            remaining: budget.iterations,
            budget,
        }
    }

    /// Checks left before the wait times out
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Run one check.
    ///
    /// The closure returns `Some` once the awaited condition holds.
    pub fn step<D, T, F>(&mut self, delay: &mut D, check: F) -> Poll<T>
    where
        D: DelayNs,
        F: FnOnce() -> Option<T>,
    {
        if self.remaining == 0 {
            return Poll::TimedOut;
        }

        if let Some(value) = check() {
            return Poll::Done(value);
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            return Poll::TimedOut;
        }

        if self.budget.sleeps_at(self.remaining) {
            delay.delay_us(self.budget.sleep_us);
        }
        Poll::Waiting
    }

    /// Step until the condition holds or the budget runs out
    pub fn wait<D, T, F>(&mut self, delay: &mut D, mut check: F) -> Result<T>
    where
        D: DelayNs,
        F: FnMut() -> Option<T>,
    {
        loop {
            match self.step(delay, &mut check) {
                Poll::Waiting => {}
                Poll::Done(value) => return Ok(value),
                Poll::TimedOut => return Err(Error::Timeout),
            }
        }
    }
}

/// Wait for `check` to return `Some`, within `budget`
pub fn poll_until<D, T, F>(budget: PollBudget, delay: &mut D, check: F) -> Result<T>
where
    D: DelayNs,
    F: FnMut() -> Option<T>,
{
    Poller::new(budget).wait(delay, check)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::testing::MockDelay;

    #[test]
    fn done_on_first_check_does_not_sleep() {
        let mut delay = MockDelay::new();
        let result = poll_until(PollBudget::new(10), &mut delay, || Some(5u8));
        assert_eq!(result, Ok(5));
        assert_eq!(delay.calls(), 0);
    }

    #[test]
    fn checks_never_exceed_budget() {
        let mut delay = MockDelay::new();
        let checks = Cell::new(0u32);
        let result = poll_until(PollBudget::new(25), &mut delay, || {
            checks.set(checks.get() + 1);
            None::<()>
        });

        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(checks.get(), 25);
        assert_eq!(delay.calls(), 24);
        assert_eq!(delay.total_us(), 24);
    }

    #[test]
    fn zero_budget_times_out_without_checking() {
        let mut delay = MockDelay::new();
        let mut poller = Poller::new(PollBudget::new(0));
        let step = poller.step(&mut delay, || -> Option<()> { panic!("checked") });
        assert_eq!(step, Poll::TimedOut);
    }

    #[test]
    fn threshold_defers_sleeping_until_near_expiry() {
        let mut delay = MockDelay::new();
        let budget = PollBudget::new(100).with_sleep_threshold(10).with_sleep_us(500);
        let result = poll_until(budget, &mut delay, || None::<()>);

        assert_eq!(result, Err(Error::Timeout));
        // Sleeps happen with 9..=1 checks left
        assert_eq!(delay.calls(), 9);
        assert_eq!(delay.total_us(), 9 * 500);
    }

    #[test]
    fn step_reports_waiting_then_done() {
        let mut delay = MockDelay::new();
        let mut poller = Poller::new(PollBudget::new(5));
        assert_eq!(poller.step(&mut delay, || None::<u32>), Poll::Waiting);
        assert_eq!(poller.remaining(), 4);
        assert_eq!(poller.step(&mut delay, || Some(9)), Poll::Done(9));
        assert_eq!(poller.remaining(), 4);
    }
}
