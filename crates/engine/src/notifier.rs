// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's side of the notification seam: it only knows it needs to
//! raise an alert, not how. Desktop toasts, sound, and email fan-out live on
//! the daemon side of this trait.

use orca_core::Job;

pub trait Notifier: Send + Sync {
    fn notify_success(&self, job: &Job);
    fn notify_recoverable(&self, job: &Job, message: &str);
    fn notify_fatal(&self, job: &Job, message: &str);

    /// A downward crossing of the drain threshold: `pending` just dropped to
    /// or below `threshold` after having been above it. Not job-scoped, so it
    /// gets its own method rather than overloading the three above.
    fn notify_drain(&self, pending: u32, threshold: u32) {
        tracing::info!(pending, threshold, "pending load dropped to drain threshold");
    }
}

/// Default notifier: logs at the appropriate level and does nothing else.
/// Used in tests and as the fallback when no richer notifier is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify_success(&self, job: &Job) {
        tracing::info!(job_id = %job.id, "job succeeded");
    }

    fn notify_recoverable(&self, job: &Job, message: &str) {
        tracing::warn!(job_id = %job.id, message, "job failed recoverably");
    }

    fn notify_fatal(&self, job: &Job, message: &str) {
        tracing::error!(job_id = %job.id, message, "job failed fatally");
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
