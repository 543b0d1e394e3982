// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one attempt of one job: writes the `.lock` sentinel, spawns the ORCA
//! subprocess against an already-staged deck, and resolves its primary
//! output file (spec.md §4.4 steps 1, 3, 4, 6).
//!
//! Staging the deck (and geometry, if any) into `work_dir`, reading the
//! resolved output, and classifying it are the caller's job — see
//! [`crate::scheduler::Scheduler`] — so this type can be driven by a
//! scripted stand-in in tests without needing a real ORCA binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::EngineError;
use crate::output_resolver::resolve_primary_output;

const LOCK_FILE: &str = ".lock";

/// Max characters of stderr carried into a fatal/missing-output reason
/// (spec.md §4.4 step 4: "reason includes a truncated stderr prefix").
const STDERR_PREFIX_LEN: usize = 500;

/// Lossily decode and truncate `stderr` for use in an error reason. Truncates
/// by `char`, not byte offset, so it never splits a multi-byte character.
fn stderr_prefix(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    let mut prefix: String = trimmed.chars().take(STDERR_PREFIX_LEN).collect();
    if trimmed.chars().count() > STDERR_PREFIX_LEN {
        prefix.push('\u{2026}');
    }
    prefix
}

/// Spawns the ORCA binary against a deck already staged in `work_dir` and
/// locates the output file it produced.
pub struct Executor {
    orca_path: PathBuf,
}

impl Executor {
    pub fn new(orca_path: impl Into<PathBuf>) -> Self {
        Self { orca_path: orca_path.into() }
    }

    /// Run the deck at `inp_path` (already staged inside `work_dir`) and
    /// return the path to its resolved primary output.
    ///
    /// `Err` covers only the cases spec.md §4.4 assigns to the Executor
    /// itself rather than to `OutcomeClassifier`: a deck path with no file
    /// name/stem, a subprocess that fails to spawn, or a run that produced
    /// no output file the `OutputResolver` can find. The scheduler maps all
    /// three onto `ClassifierOutcome::Fatal`.
    pub fn run(&self, inp_path: &Path, work_dir: &Path) -> Result<PathBuf, EngineError> {
        std::fs::create_dir_all(work_dir)?;
        let lock_path = work_dir.join(LOCK_FILE);
        std::fs::write(&lock_path, "running")?;

        let result = self.run_staged(inp_path, work_dir);

        if let Err(err) = std::fs::remove_file(&lock_path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %lock_path.display(), %err, "failed to remove lock sentinel");
            }
        }

        result
    }

    fn run_staged(&self, inp_path: &Path, work_dir: &Path) -> Result<PathBuf, EngineError> {
        let inp_name = inp_path
            .file_name()
            .ok_or_else(|| EngineError::Deck(format!("deck path has no file name: {}", inp_path.display())))?;
        let stem = inp_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| EngineError::Deck(format!("deck path has no file stem: {}", inp_path.display())))?;

        tracing::info!(deck = %inp_path.display(), "starting orca");
        let start = std::time::Instant::now();

        let output = Command::new(&self.orca_path).arg(inp_name).current_dir(work_dir).output().map_err(|err| {
            EngineError::Subprocess(format!("failed to spawn {}: {err}", self.orca_path.display()))
        })?;

        tracing::info!(
            deck = %inp_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = output.status.code(),
            "orca exited"
        );

        // The solver reports outcomes via its own output file, not stdout
        // (spec.md §4.4 step 4) — resolve that first and leave it alone.
        if let Some(found) = resolve_primary_output(work_dir, stem) {
            return Ok(found);
        }

        // No recognized output file yet: some invocation styles (`orca
        // job.inp > job.out`) rely on shell redirection we don't get from
        // `Command::output`, so fall back to whatever it printed on stdout
        // before giving up.
        if !output.stdout.is_empty() {
            let out_path = work_dir.join(format!("{stem}.out"));
            std::fs::write(&out_path, &output.stdout)?;
            if let Some(found) = resolve_primary_output(work_dir, stem) {
                return Ok(found);
            }
        }

        Err(EngineError::MissingOutput { stem: stem.to_string(), stderr_prefix: stderr_prefix(&output.stderr) })
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
