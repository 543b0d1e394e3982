// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job model: what gets queued, run, and archived.

use std::path::PathBuf;

crate::define_id! {
    /// Identifies a single ORCA job across the queue, running, and completed stores.
    pub struct JobId("job-");
}

/// Which ORCA calculation a job performs.
///
/// Optimize jobs are weighted twice as heavily as Frequency jobs when computing
/// the scheduler's pending-load figure, since geometry optimizations dominate wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Optimize,
    Frequency,
}

crate::simple_display! {
    JobKind {
        Optimize => "optimize",
        Frequency => "frequency",
    }
}

impl JobKind {
    /// Scheduling weight used by `WeightedPending`.
    pub fn weight(self) -> u32 {
        match self {
            JobKind::Optimize => 2,
            JobKind::Frequency => 1,
        }
    }

    /// Infer a kind from a deck stem: a trailing `_freq` means Frequency,
    /// anything else is treated as Optimize (spec.md §4.5.2 item 3).
    pub fn infer_from_stem(stem: &str) -> Self {
        if stem.ends_with("_freq") {
            JobKind::Frequency
        } else {
            JobKind::Optimize
        }
    }
}

/// The authoritative three-way disposition of a finished job.
///
/// This is not the same thing as the four-way [`crate::TerminalOutcome`]-shaped
/// value `OutcomeClassifier` produces per *attempt* (which also has
/// `Incomplete`, for an attempt that never reached a termination marker).
/// `Incomplete` either drives a retry or, once the retry budget is spent,
/// degrades to `Recoverable` here — it never appears in a persisted job
/// record. See `DESIGN.md` for why the two are kept as distinct types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    Success,
    Fatal,
    Recoverable,
}

crate::simple_display! {
    TerminalOutcome {
        Success => "success",
        Fatal => "fatal",
        Recoverable => "recoverable",
    }
}

impl TerminalOutcome {
    /// The archive-folder tag this outcome maps to (spec.md §4.6): only three
    /// tags exist, so `Recoverable` and a retries-exhausted `Incomplete` both
    /// land on `"failed"`.
    pub fn archive_tag(self) -> &'static str {
        match self {
            TerminalOutcome::Success => "success",
            TerminalOutcome::Fatal => "fatal",
            TerminalOutcome::Recoverable => "failed",
        }
    }
}

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Sitting in the pending queue, not yet dispatched to a worker.
    Queued,
    /// Dispatched to a worker; the ORCA subprocess is running or has just exited
    /// and is awaiting classification.
    Running,
    /// Finished and classified. See [`Job::error_message`] for the
    /// classifier's diagnostic, if any (absent for `Success`).
    Completed { outcome: TerminalOutcome },
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed(..) => "completed",
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. })
    }
}

/// A single ORCA calculation: an input deck paired with the source geometry
/// it was generated from, tracked through queueing, execution, and archival.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Path to the `.inp` deck this job runs.
    pub inp_path: PathBuf,
    /// Path to the source `.xyz` geometry the deck was generated from. Empty
    /// for a chained Frequency job, whose geometry is embedded directly in
    /// the synthesized deck rather than carried as a standalone file.
    pub xyz_path: PathBuf,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Absolute path to the per-attempt scratch directory. `None` until a
    /// worker picks the job up.
    pub work_dir: Option<PathBuf>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    /// Number of prior attempts that ended `Incomplete`.
    pub retries: u32,
    /// Diagnostic from the most recent attempt, if any.
    pub error_message: Option<String>,
    /// Epoch milliseconds at job creation, per the injected [`crate::Clock`].
    pub created_at_ms: i64,
}

impl Job {
    pub fn weight(&self) -> u32 {
        self.kind.weight()
    }

    /// Base name shared by the deck and its outputs, e.g. `"water"` for `water.inp`.
    pub fn stem(&self) -> Option<&str> {
        self.inp_path.file_stem().and_then(|s| s.to_str())
    }

    /// The stem with a trailing `_opt`/`_freq` suffix stripped — the key
    /// under which all of a compound's attempts land in `products/`.
    pub fn molecule(&self) -> Option<&str> {
        self.stem().map(strip_kind_suffix)
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.status, JobStatus::Queued)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, JobStatus::Running)
    }
}

/// Strip a trailing `_opt` or `_freq` suffix from a deck stem, e.g.
/// `"water_opt"` -> `"water"`. Used both for archive-folder naming and for
/// inferring a molecule from an orphaned deck during crash recovery.
pub fn strip_kind_suffix(stem: &str) -> &str {
    stem.strip_suffix("_opt").or_else(|| stem.strip_suffix("_freq")).unwrap_or(stem)
}

crate::builder! {
    pub struct JobBuilder => Job {
        set { id: JobId = JobId::new() }
        into { inp_path: PathBuf = PathBuf::from("job.inp") }
        into { xyz_path: PathBuf = PathBuf::from("job.xyz") }
        set { kind: JobKind = JobKind::Optimize }
        set { status: JobStatus = JobStatus::Queued }
        option { work_dir: PathBuf = None }
        option { start_time_ms: i64 = None }
        option { end_time_ms: i64 = None }
        set { retries: u32 = 0 }
        option { error_message: String = None }
        set { created_at_ms: i64 = 0 }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
