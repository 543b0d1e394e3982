// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads a text file with retry/backoff, for output files that ORCA (or the
//! watcher moving a geometry into place) may still hold open.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF_START: Duration = Duration::from_millis(100);

/// Read `path` as UTF-8 text (lossily, replacing invalid bytes), retrying
/// with doubling backoff if the read fails with a transient "still being
/// written" family of error (permission denied, would-block/busy, or not
/// found — a rename-based writer can briefly make the path disappear).
/// Any other I/O error aborts immediately rather than burning through the
/// full retry budget. Returns `None` once retries are exhausted or a
/// non-transient error occurs, logging a warning either way — a read
/// failure here degrades to "output not ready yet", not a crashed worker.
pub fn safe_read_text(path: &Path) -> Option<String> {
    safe_read_text_with(path, DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF_START)
}

pub fn safe_read_text_with(path: &Path, max_attempts: u32, backoff_start: Duration) -> Option<String> {
    let mut backoff = backoff_start;
    for attempt in 1..=max_attempts {
        match std::fs::read(path) {
            Ok(bytes) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if !is_transient(&err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "giving up reading file after a non-transient error"
                );
                return None;
            }
            Err(err) if attempt == max_attempts => {
                tracing::warn!(
                    path = %path.display(),
                    attempts = max_attempts,
                    error = %err,
                    "giving up reading file after exhausting retries"
                );
                return None;
            }
            Err(_) => {
                std::thread::sleep(backoff);
                backoff *= 2;
            }
        }
    }
    None
}

/// The "still being written" family of errors spec.md §4.4.1 calls out as
/// retryable: permission denied, would-block/busy, or a transient
/// not-found (a rename-based writer can momentarily make the path vanish).
fn is_transient(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::PermissionDenied | ErrorKind::WouldBlock | ErrorKind::NotFound)
}

#[cfg(test)]
#[path = "safe_read_tests.rs"]
mod tests;
