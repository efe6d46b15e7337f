//! Countdown engine.
//!
//! A countdown is a wall-clock deadline, not an interval callback. It has
//! no thread: the caller passes the current time to `tick()` and renders
//! whatever it returns.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> Completed
//! ```
//!
//! Stopping a countdown simply drops it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Running,
    Completed,
}

/// What a tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running; whole seconds left, rounded up.
    Remaining(u64),
    /// Reached zero on this tick.
    Finished,
    /// Already completed earlier.
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    minutes: u64,
    started_ms: u64,
    deadline_ms: u64,
    state: CountdownState,
}

impl Countdown {
    pub fn start(minutes: u64, now_ms: u64) -> Self {
        Self {
            minutes,
            started_ms: now_ms,
            deadline_ms: now_ms.saturating_add(minutes.saturating_mul(60_000)),
            state: CountdownState::Running,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.deadline_ms.saturating_sub(now_ms)
    }

    /// 0.0 .. 1.0 elapsed fraction.
    pub fn progress(&self, now_ms: u64) -> f64 {
        let total = self.deadline_ms - self.started_ms;
        if total == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_ms(now_ms) as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn tick(&mut self, now_ms: u64) -> Tick {
        if self.state == CountdownState::Completed {
            return Tick::Idle;
        }
        let remaining = self.remaining_ms(now_ms);
        if remaining == 0 {
            self.state = CountdownState::Completed;
            return Tick::Finished;
        }
        Tick::Remaining(remaining.div_ceil(1000))
    }
}

/// `MM:SS`, minutes zero-padded to two digits and allowed to exceed 59.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
