// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proptest strategies shared by this crate's own property tests and, via
//! the `test-support` feature, by `orca-storage` and `orca-engine`'s dev
//! dependencies — so a round-trip or invariant test over [`Job`] doesn't
//! need to hand-roll its own arbitrary generator in three crates.

#![cfg(any(test, feature = "test-support"))]

pub mod strategies {
    use std::path::PathBuf;

    use proptest::prelude::*;

    use crate::job::{Job, JobKind, JobStatus, TerminalOutcome};
    use crate::JobId;

    pub fn job_kind() -> impl Strategy<Value = JobKind> {
        prop_oneof![Just(JobKind::Optimize), Just(JobKind::Frequency)]
    }

    pub fn terminal_outcome() -> impl Strategy<Value = TerminalOutcome> {
        prop_oneof![
            Just(TerminalOutcome::Success),
            Just(TerminalOutcome::Fatal),
            Just(TerminalOutcome::Recoverable),
        ]
    }

    pub fn job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Queued),
            Just(JobStatus::Running),
            terminal_outcome().prop_map(|outcome| JobStatus::Completed { outcome }),
        ]
    }

    fn stem() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,12}"
    }

    prop_compose! {
        /// An arbitrary but well-formed job record, suitable for
        /// [`crate::StateStore`] round-trip tests and scheduler invariant
        /// checks. `id` is freshly generated per call, not part of the
        /// strategy's shrinking space — tests that need id stability should
        /// overwrite it.
        pub fn arb_job()(
            stem in stem(),
            kind in job_kind(),
            status in job_status(),
            retries in 0u32..5,
            created_at_ms in 0i64..10_000_000_000i64,
            has_work_dir in any::<bool>(),
            error_message in proptest::option::of("[a-zA-Z0-9 ]{0,40}"),
        ) -> Job {
            Job {
                id: JobId::new(),
                inp_path: PathBuf::from(format!("{stem}.inp")),
                xyz_path: PathBuf::from(format!("{stem}.xyz")),
                kind,
                status,
                work_dir: if has_work_dir { Some(PathBuf::from(format!("working/{stem}"))) } else { None },
                start_time_ms: None,
                end_time_ms: None,
                retries,
                error_message,
                created_at_ms,
            }
        }
    }
}
