// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches the input directory for dropped `.xyz` geometry files, turns each
//! into an Optimize job deck, and moves both files into the waiting
//! directory under collision-safe names.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use orca_core::{CalcStep, Clock, Job, JobKind, JobStatus, OrcaConfig};
use orca_engine::{deck, Scheduler};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to start filesystem watcher: {0}")]
    Notify(#[from] notify::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Appends `_1`, `_2`, ... to `base` until it names a path that doesn't exist.
fn unique_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("job");
    let ext = base.extension().and_then(|s| s.to_str());
    let mut i = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{i}.{ext}"),
            None => format!("{stem}_{i}"),
        };
        let candidate = base.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Reads an `.xyz` file, renders an Optimize deck for it, and moves both the
/// geometry and the new deck into `waiting_dir` under unique names.
///
/// Returns the job queued for the moved deck, or `None` if the geometry
/// could not be parsed (the offending files are left in place for
/// inspection).
fn ingest_xyz<C: Clock>(
    xyz_path: &Path,
    waiting_dir: &Path,
    config: &OrcaConfig,
    clock: &C,
) -> Result<Option<Job>, WatchError> {
    let text = match std::fs::read_to_string(xyz_path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %xyz_path.display(), %err, "could not read dropped xyz file");
            return Ok(None);
        }
    };

    let geometry = match deck::parse_xyz(&text) {
        Ok(geometry) => geometry,
        Err(err) => {
            tracing::warn!(path = %xyz_path.display(), %err, "rejecting malformed xyz file");
            return Ok(None);
        }
    };

    let rendered = deck::render_deck(config, CalcStep::Opt, &geometry);

    std::fs::create_dir_all(waiting_dir)?;
    let xyz_name = xyz_path.file_name().unwrap_or_default();
    let inp_name = xyz_path.with_extension("inp");
    let inp_name = inp_name.file_name().unwrap_or_default();

    let dest_xyz = unique_path(&waiting_dir.join(xyz_name));
    let dest_inp = unique_path(&waiting_dir.join(inp_name));

    std::fs::write(&dest_inp, rendered)?;
    std::fs::rename(xyz_path, &dest_xyz)?;

    tracing::info!(
        xyz = %dest_xyz.display(),
        inp = %dest_inp.display(),
        "moved dropped geometry into waiting"
    );

    Ok(Some(Job {
        id: orca_core::JobId::new(),
        inp_path: dest_inp,
        xyz_path: dest_xyz,
        kind: JobKind::Optimize,
        status: JobStatus::Queued,
        work_dir: None,
        start_time_ms: None,
        end_time_ms: None,
        retries: 0,
        error_message: None,
        created_at_ms: clock.epoch_ms() as i64,
    }))
}

/// Owns the filesystem watcher for as long as the daemon runs; dropping it
/// stops the watch.
pub struct InputWatcher {
    _watcher: RecommendedWatcher,
}

impl InputWatcher {
    /// Start watching `input_dir` non-recursively. Every `.xyz` file created
    /// there is ingested and submitted to `scheduler` on a dedicated thread.
    pub fn start<C: Clock + 'static>(
        input_dir: &Path,
        waiting_dir: PathBuf,
        config: OrcaConfig,
        scheduler: Arc<Scheduler<C>>,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })?;
        watcher.watch(input_dir, RecursiveMode::NonRecursive)?;

        std::thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                if !matches!(event.kind, notify::EventKind::Create(_)) {
                    continue;
                }
                for path in event.paths {
                    if path.extension().and_then(|e| e.to_str()) != Some("xyz") {
                        continue;
                    }
                    tracing::info!(path = %path.display(), "detected new xyz geometry");
                    let clock = scheduler.clock().clone();
                    match ingest_xyz(&path, &waiting_dir, &config, &clock) {
                        Ok(Some(job)) => {
                            if let Err(err) = scheduler.submit(job) {
                                tracing::error!(%err, "failed to submit ingested job");
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            tracing::error!(path = %path.display(), %err, "failed to ingest dropped xyz file");
                        }
                    }
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
