// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Moves a finished job's working directory into permanent storage under
//! `products/{molecule}/{kind}_{outcome_tag}_{epoch}[_N]/` (spec.md §4.6).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use orca_core::{Job, TerminalOutcome};

use crate::error::EngineError;

/// Best-effort work that happens after a successful or recoverable job's
/// artifacts land in their final archive directory: Molden conversion of any
/// `.gbw` wavefunction file, and handing the primary output off to the
/// energy-trajectory plotter. Both collaborators are external to the core
/// (spec.md §1); this trait is the only contract the engine holds with them.
/// A failure here is logged by the implementation and never propagated.
pub trait PostArchiveHooks: Send + Sync {
    fn after_archive(&self, archive_dir: &Path, job: &Job);
}

/// No-op implementation used when no post-archive hooks are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPostArchiveHooks;

impl PostArchiveHooks for NoopPostArchiveHooks {
    fn after_archive(&self, _archive_dir: &Path, _job: &Job) {}
}

/// Archives a job's working directory under `products_root`, keyed by
/// molecule, kind, and outcome, and fires [`PostArchiveHooks`] for outcomes
/// that warrant it.
pub struct Archiver {
    products_root: PathBuf,
    hooks: Arc<dyn PostArchiveHooks>,
}

impl Archiver {
    pub fn new(products_root: impl Into<PathBuf>) -> Self {
        Self::with_hooks(products_root, Arc::new(NoopPostArchiveHooks))
    }

    pub fn with_hooks(products_root: impl Into<PathBuf>, hooks: Arc<dyn PostArchiveHooks>) -> Self {
        Self { products_root: products_root.into(), hooks }
    }

    /// Root of the products tree this archiver writes under — used by
    /// [`crate::scheduler::Scheduler::recover`] to probe for an
    /// already-archived output when a running job's `work_dir` is gone.
    pub fn products_root(&self) -> &Path {
        &self.products_root
    }

    /// Move `work_dir` to `{products_root}/{molecule}/{kind}_{outcome_tag}_{epoch_secs}`,
    /// disambiguated with a `_N` suffix on collision. Fires post-archive
    /// hooks for `Success` and `Recoverable` outcomes only (spec.md §4.6).
    pub fn archive(
        &self,
        work_dir: &Path,
        job: &Job,
        molecule: &str,
        outcome: TerminalOutcome,
        epoch_secs: u64,
    ) -> Result<PathBuf, EngineError> {
        let dest_root = self.products_root.join(molecule);
        std::fs::create_dir_all(&dest_root)?;

        let base_name = format!("{}_{}_{epoch_secs}", job.kind, outcome.archive_tag());
        let dest = unique_archive_path(&dest_root, &base_name);

        move_dir(work_dir, &dest)?;

        if matches!(outcome, TerminalOutcome::Success | TerminalOutcome::Recoverable) {
            self.hooks.after_archive(&dest, job);
        }

        Ok(dest)
    }
}

fn unique_archive_path(dest_root: &Path, base_name: &str) -> PathBuf {
    let candidate = dest_root.join(base_name);
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 1;
    loop {
        let candidate = dest_root.join(format!("{base_name}_{n}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename `src` to `dest`; fall back to recursive copy-then-delete when the
/// two paths straddle a filesystem boundary (`rename(2)` returns `EXDEV`).
fn move_dir(src: &Path, dest: &Path) -> Result<(), EngineError> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(err) if err.raw_os_error() == Some(libc_exdev()) => {
            copy_dir_recursive(src, dest)?;
            std::fs::remove_dir_all(src)?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// `EXDEV` ("cross-device link"), the errno `rename(2)` returns when source
/// and destination are on different filesystems. Hardcoded rather than
/// pulled from `libc` since it's the one POSIX errno this crate needs and its
/// value is stable across every platform Rust targets for this workload.
fn libc_exdev() -> i32 {
    18
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "archiver_tests.rs"]
mod tests;
