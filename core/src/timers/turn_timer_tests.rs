//! Tests for the turn timer state machine

use std::time::{Duration, Instant};

use super::{TimerEvent, TimerState, TurnTimer};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn starts_idle_with_full_duration() {
    let timer = TurnTimer::from_secs(30);
    let now = Instant::now();
    assert_eq!(timer.state(), TimerState::Idle);
    assert_eq!(timer.remaining(now), secs(30));
}

#[test]
fn expires_exactly_once() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);

    let mut fired = 0;
    for s in 1..=15 {
        if timer.tick(t0 + secs(s)) == Some(TimerEvent::Expired) {
            fired += 1;
        }
    }

    assert_eq!(fired, 1);
    assert_eq!(timer.state(), TimerState::Expired);
    assert_eq!(timer.remaining(t0 + secs(20)), Duration::ZERO);
}

#[test]
fn late_tick_still_expires_without_drift() {
    // One tick long after the deadline (suspended loop) expires immediately
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);
    assert_eq!(timer.tick(t0 + secs(3)), None);
    assert_eq!(timer.tick(t0 + secs(600)), Some(TimerEvent::Expired));
}

#[test]
fn pause_freezes_remaining_time() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);

    assert!(timer.pause(t0 + secs(4)));
    assert_eq!(timer.state(), TimerState::Paused);
    assert_eq!(timer.remaining(t0 + secs(100)), secs(6));
    assert_eq!(timer.tick(t0 + secs(100)), None);

    assert!(timer.resume(t0 + secs(100)));
    assert_eq!(timer.remaining(t0 + secs(103)), secs(3));
    assert_eq!(timer.tick(t0 + secs(105)), None);
    assert_eq!(timer.tick(t0 + secs(106)), Some(TimerEvent::Expired));
}

#[test]
fn pause_and_resume_reject_wrong_states() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    assert!(!timer.pause(t0));
    assert!(!timer.resume(t0));

    timer.start(t0);
    assert!(!timer.resume(t0));
    assert!(timer.pause(t0));
    assert!(!timer.pause(t0));
}

#[test]
fn start_restarts_from_full_duration() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);
    timer.tick(t0 + secs(12));
    assert_eq!(timer.state(), TimerState::Expired);

    timer.start(t0 + secs(12));
    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(timer.remaining(t0 + secs(12)), secs(10));
}

#[test]
fn reset_returns_to_idle() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);
    timer.reset();
    assert_eq!(timer.state(), TimerState::Idle);
    assert_eq!(timer.tick(t0 + secs(60)), None);
}

#[test]
fn fill_percent_tracks_countdown() {
    let t0 = Instant::now();
    let mut timer = TurnTimer::from_secs(10);
    timer.start(t0);
    assert!((timer.fill_percent(t0 + secs(5)) - 0.5).abs() < f32::EPSILON);
    assert_eq!(TurnTimer::from_secs(0).fill_percent(t0), 0.0);
}
