//! Per-turn countdown
//!
//! A `TurnTimer` counts a fixed duration down against a monotonic clock.
//! It never schedules anything itself: the owner calls `tick(now)` from its
//! own loop and reacts to the returned `TimerEvent`.
//!
//! # Lifecycle
//!
//! 1. `start` → Running (remaining = duration)
//! 2. `pause` / `resume` move between Running and Paused
//! 3. `tick` past the deadline → Expired, reported exactly once
//! 4. `reset` → Idle from any state

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Expired,
}

#[derive(Debug, Clone)]
pub struct TurnTimer {
    duration: Duration,
    state: TimerState,

    /// Time spent running before the current running stretch
    elapsed_before: Duration,

    /// Start of the current running stretch (Running only)
    running_since: Option<Instant>,
}

impl TurnTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: TimerState::Idle,
            elapsed_before: Duration::ZERO,
            running_since: None,
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(secs)))
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Change the per-turn duration. Takes effect on the next `start`.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Restart from the full duration, discarding any previous countdown.
    pub fn start(&mut self, now: Instant) {
        self.elapsed_before = Duration::ZERO;
        self.running_since = Some(now);
        self.state = TimerState::Running;
    }

    /// Returns false if the timer was not running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.elapsed_before = self.elapsed(now);
        self.running_since = None;
        self.state = TimerState::Paused;
        true
    }

    /// Returns false if the timer was not paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != TimerState::Paused {
            return false;
        }
        self.running_since = Some(now);
        self.state = TimerState::Running;
        true
    }

    pub fn reset(&mut self) {
        self.elapsed_before = Duration::ZERO;
        self.running_since = None;
        self.state = TimerState::Idle;
    }

    /// Advance the countdown to `now`.
    ///
    /// Returns `Some(TimerEvent::Expired)` on the tick that crosses the
    /// deadline and `None` on every other call.
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        if self.state != TimerState::Running || self.elapsed(now) < self.duration {
            return None;
        }
        self.elapsed_before = self.duration;
        self.running_since = None;
        self.state = TimerState::Expired;
        Some(TimerEvent::Expired)
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.elapsed_before + running
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Idle => self.duration,
            TimerState::Expired => Duration::ZERO,
            TimerState::Running | TimerState::Paused => {
                self.duration.saturating_sub(self.elapsed(now))
            }
        }
    }

    pub fn remaining_secs(&self, now: Instant) -> f32 {
        self.remaining(now).as_secs_f32()
    }

    /// Fill percentage for countdown display (1.0 = full, 0.0 = expired)
    pub fn fill_percent(&self, now: Instant) -> f32 {
        let total = self.duration.as_secs_f32();
        if total > 0.0 {
            (self.remaining_secs(now) / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
