// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};

use orca_core::{JobBuilder, JobKind};

use super::*;

#[test]
fn archive_moves_the_working_directory_into_products() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = root.path().join("working").join("job-abc");
    std::fs::create_dir_all(&work_dir).unwrap();
    std::fs::write(work_dir.join("water.out"), "done").unwrap();

    let archiver = Archiver::new(root.path().join("products"));
    let job = JobBuilder::default().kind(JobKind::Optimize).build();
    let dest = archiver.archive(&work_dir, &job, "water", TerminalOutcome::Success, 1_700_000_000).unwrap();

    assert!(!work_dir.exists());
    assert!(dest.join("water.out").exists());
    assert_eq!(dest, root.path().join("products/water/optimize_success_1700000000"));
}

#[test]
fn archive_disambiguates_a_collision_with_a_previous_attempt() {
    let root = tempfile::tempdir().unwrap();
    let products = root.path().join("products");
    let job = JobBuilder::default().kind(JobKind::Optimize).build();

    let first_work_dir = root.path().join("working/attempt-1");
    std::fs::create_dir_all(&first_work_dir).unwrap();
    std::fs::write(first_work_dir.join("first.out"), "one").unwrap();

    let second_work_dir = root.path().join("working/attempt-2");
    std::fs::create_dir_all(&second_work_dir).unwrap();
    std::fs::write(second_work_dir.join("second.out"), "two").unwrap();

    let archiver = Archiver::new(&products);
    let first_dest = archiver.archive(&first_work_dir, &job, "water", TerminalOutcome::Recoverable, 42).unwrap();
    let second_dest = archiver.archive(&second_work_dir, &job, "water", TerminalOutcome::Recoverable, 42).unwrap();

    assert_eq!(first_dest, products.join("water/optimize_failed_42"));
    assert_eq!(second_dest, products.join("water/optimize_failed_42_1"));
    assert!(first_dest.join("first.out").exists());
    assert!(second_dest.join("second.out").exists());
}

#[test]
fn hooks_fire_for_success_and_recoverable_but_not_fatal() {
    #[derive(Default)]
    struct CountingHooks(AtomicUsize);
    impl PostArchiveHooks for CountingHooks {
        fn after_archive(&self, _archive_dir: &Path, _job: &Job) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let root = tempfile::tempdir().unwrap();
    let hooks = Arc::new(CountingHooks::default());
    let archiver = Archiver::with_hooks(root.path().join("products"), hooks.clone());
    let job = JobBuilder::default().kind(JobKind::Frequency).build();

    for (tag, outcome) in [
        ("a", TerminalOutcome::Success),
        ("b", TerminalOutcome::Recoverable),
        ("c", TerminalOutcome::Fatal),
    ] {
        let work_dir = root.path().join("working").join(tag);
        std::fs::create_dir_all(&work_dir).unwrap();
        archiver.archive(&work_dir, &job, "water", outcome, 1).unwrap();
    }

    assert_eq!(hooks.0.load(Ordering::SeqCst), 2);
}
