// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use orca_core::FakeClock;

use super::*;

#[test]
fn a_disabled_watch_never_fires() {
    let watch = DrainWatch::new(FakeClock::new(), 0, Duration::from_secs(60));
    assert!(!watch.poll(100));
    assert!(!watch.poll(0));
}

#[test]
fn fires_once_on_a_downward_crossing() {
    let watch = DrainWatch::new(FakeClock::new(), 5, Duration::from_secs(60));
    assert!(!watch.poll(10)); // above threshold, no prior poll to cross from
    assert!(watch.poll(3)); // crossed 10 -> 3
    assert!(!watch.poll(2)); // still below, no new crossing
}

#[test]
fn does_not_fire_while_staying_above_threshold() {
    let watch = DrainWatch::new(FakeClock::new(), 5, Duration::from_secs(60));
    assert!(!watch.poll(10));
    assert!(!watch.poll(8));
    assert!(!watch.poll(6));
}

#[test]
fn a_second_crossing_inside_the_debounce_window_is_suppressed() {
    let clock = FakeClock::new();
    let watch = DrainWatch::new(clock.clone(), 5, Duration::from_secs(60));

    assert!(!watch.poll(10));
    assert!(watch.poll(3));

    // Climb back above, then cross again before the debounce window elapses.
    assert!(!watch.poll(10));
    clock.advance(Duration::from_secs(30));
    assert!(!watch.poll(2));
}

#[test]
fn a_crossing_after_the_debounce_window_elapses_fires_again() {
    let clock = FakeClock::new();
    let watch = DrainWatch::new(clock.clone(), 5, Duration::from_secs(60));

    assert!(!watch.poll(10));
    assert!(watch.poll(3));

    assert!(!watch.poll(10));
    clock.advance(Duration::from_secs(61));
    assert!(watch.poll(2));
}
