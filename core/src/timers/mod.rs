//! Timer system
//!
//! Turn timers count a fixed per-turn duration down. They are driven by
//! explicit `tick(now)` calls from whoever owns the combat tracker, so the
//! countdown is computed from elapsed monotonic time rather than from a
//! count of callbacks.

mod turn_timer;

#[cfg(test)]
mod turn_timer_tests;

pub use turn_timer::{TimerEvent, TimerState, TurnTimer};
