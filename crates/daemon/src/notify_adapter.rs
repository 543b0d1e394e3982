// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop toast notifications layered on top of the engine's logging.
//!
//! Sound alerts and email fan-out are explicitly out of scope; only the
//! desktop channel from the original pipeline is implemented here.

use orca_core::Job;
use orca_engine::{LoggingNotifier, Notifier};

/// Notifier that logs (via [`LoggingNotifier`]) and also raises a desktop
/// toast when enabled.
pub struct DesktopNotifier {
    logging: LoggingNotifier,
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { logging: LoggingNotifier, enabled }
    }

    fn toast(&self, summary: &str, body: &str) {
        if !self.enabled {
            return;
        }
        match notify_rust::Notification::new().summary(summary).body(body).show() {
            Ok(_) => tracing::debug!(summary, "desktop notification sent"),
            Err(err) => tracing::warn!(summary, %err, "desktop notification failed"),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify_success(&self, job: &Job) {
        self.logging.notify_success(job);
        self.toast("ORCA job complete", &format!("{} finished successfully", job.id));
    }

    fn notify_recoverable(&self, job: &Job, message: &str) {
        self.logging.notify_recoverable(job, message);
        self.toast("ORCA job needs attention", &format!("{}: {message}", job.id));
    }

    fn notify_fatal(&self, job: &Job, message: &str) {
        self.logging.notify_fatal(job, message);
        self.toast("ORCA pipeline halted", &format!("{}: {message}", job.id));
    }

    fn notify_drain(&self, pending: u32, threshold: u32) {
        self.logging.notify_drain(pending, threshold);
        self.toast("ORCA queue draining", &format!("pending load {pending} reached threshold {threshold}"));
    }
}

#[cfg(test)]
#[path = "notify_adapter_tests.rs"]
mod tests;
