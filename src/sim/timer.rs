//! Countdown state machines advanced by the simulation tick
//!
//! These replace delayed calls and repeating timers: nothing fires unless
//! the tick advances it, and cancelling is just disarming.

/// One-shot timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining_ms: u64,
    armed: bool,
}

impl Countdown {
    pub fn start(&mut self, duration_ms: u64) {
        self.remaining_ms = duration_ms;
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.remaining_ms = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Returns true exactly once, on the step the countdown reaches zero
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
        if self.remaining_ms == 0 {
            self.armed = false;
            return true;
        }
        false
    }
}

/// Repeating timer; first fire one full period after `start`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    until_next_ms: u64,
    armed: bool,
}

impl Interval {
    pub fn start(&mut self, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.period_ms = period_ms;
        self.until_next_ms = period_ms;
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of periods completed during this step
    pub fn advance(&mut self, dt_ms: u64) -> u32 {
        if !self.armed {
            return 0;
        }
        let mut fires = 0;
        let mut left = dt_ms;
        while left >= self.until_next_ms {
            left -= self.until_next_ms;
            self.until_next_ms = self.period_ms;
            fires += 1;
        }
        self.until_next_ms -= left;
        fires
    }
}
