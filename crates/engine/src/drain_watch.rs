// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WatchPendingCount` (spec.md §6): watches the scheduler's weighted-pending
//! figure and raises a debounced [`Notifier::notify_drain`] alert on a
//! downward crossing of a configured threshold — e.g. "the queue just
//! drained below 5, it's safe to feed it more work."

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orca_core::Clock;
use parking_lot::Mutex;

use crate::notifier::Notifier;

/// Debounced, edge-triggered pending-count watch. `threshold == 0` disables
/// the watch entirely (the default, per spec.md §6's supplemented config).
pub struct DrainWatch<C: Clock> {
    clock: C,
    threshold: u32,
    debounce: Duration,
    prior: Mutex<Option<u32>>,
    last_fired: Mutex<Option<std::time::Instant>>,
}

impl<C: Clock> DrainWatch<C> {
    pub fn new(clock: C, threshold: u32, debounce: Duration) -> Self {
        Self { clock, threshold, debounce, prior: Mutex::new(None), last_fired: Mutex::new(None) }
    }

    /// Record one poll of the pending count. Returns `true` exactly when
    /// this poll should raise an alert: the threshold is enabled, the
    /// previous poll was above it, this one is at or below it, and the
    /// debounce window since the last alert has elapsed.
    pub fn poll(&self, pending: u32) -> bool {
        if self.threshold == 0 {
            return false;
        }

        let crossed = {
            let mut prior = self.prior.lock();
            let was_above = matches!(*prior, Some(p) if p > self.threshold);
            *prior = Some(pending);
            was_above && pending <= self.threshold
        };
        if !crossed {
            return false;
        }

        let now = self.clock.now();
        let mut last_fired = self.last_fired.lock();
        if let Some(previous) = *last_fired {
            if now.duration_since(previous) < self.debounce {
                return false;
            }
        }
        *last_fired = Some(now);
        true
    }
}

/// Poll `count_fn` on a fixed interval until `shutdown` is set, alerting
/// through `notifier` on each debounced downward crossing. Intended to run
/// on its own thread for the life of the daemon.
pub fn run<C: Clock>(
    watch: DrainWatch<C>,
    count_fn: impl Fn() -> u32,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let pending = count_fn();
        if watch.poll(pending) {
            notifier.notify_drain(pending, watch.threshold);
        }
        std::thread::sleep(poll_interval);
    }
}

#[cfg(test)]
#[path = "drain_watch_tests.rs"]
mod tests;
