// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe JSON persistence for the pending queue, the running set, and
//! the completed-job log.

use std::fs;
use std::path::{Path, PathBuf};

use orca_core::{Job, JobId};
use parking_lot::Mutex;

use crate::error::StorageError;

const QUEUE_FILE: &str = "queue.json";
const RUNNING_FILE: &str = "running.json";
const COMPLETED_FILE: &str = "completed.json";

/// Persists job state as three flat JSON arrays, each rewritten atomically
/// (write to a `.tmp` sibling, then rename over the original).
///
/// A read of a missing, empty, or corrupt file returns an empty list rather
/// than an error — a file that was never created (fresh state dir) and a
/// file half-overwritten by a process that died mid-`rename` should not be
/// distinguishable from "no jobs recorded yet" to the caller. Writes do
/// surface errors, since a failed write means the in-memory and on-disk
/// states have diverged and the caller needs to know.
pub struct StateStore {
    queue_path: PathBuf,
    running_path: PathBuf,
    completed_path: PathBuf,
    queue_lock: Mutex<()>,
    running_lock: Mutex<()>,
    completed_lock: Mutex<()>,
}

impl StateStore {
    /// Open (creating if needed) a state store rooted at `state_dir`.
    ///
    /// Pre-creates all three files as empty arrays if absent, and removes any
    /// stray `.tmp` files left behind by a process that crashed between the
    /// write and the rename.
    pub fn open(state_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let state_dir = state_dir.into();
        fs::create_dir_all(&state_dir).map_err(|source| StorageError::Io {
            path: state_dir.clone(),
            source,
        })?;

        let store = Self {
            queue_path: state_dir.join(QUEUE_FILE),
            running_path: state_dir.join(RUNNING_FILE),
            completed_path: state_dir.join(COMPLETED_FILE),
            queue_lock: Mutex::new(()),
            running_lock: Mutex::new(()),
            completed_lock: Mutex::new(()),
        };

        for path in [&store.queue_path, &store.running_path, &store.completed_path] {
            if !path.exists() {
                atomic_write_json(path, &Vec::<Job>::new())?;
            }
            gc_stray_tmp(path);
        }

        Ok(store)
    }

    pub fn load_queue(&self) -> Vec<Job> {
        let _guard = self.queue_lock.lock();
        read_json_or_default(&self.queue_path)
    }

    pub fn load_running(&self) -> Vec<Job> {
        let _guard = self.running_lock.lock();
        read_json_or_default(&self.running_path)
    }

    pub fn load_completed(&self) -> Vec<Job> {
        let _guard = self.completed_lock.lock();
        read_json_or_default(&self.completed_path)
    }

    /// Add `job` to the persisted pending queue. A no-op if a job with the
    /// same id is already queued.
    pub fn enqueue(&self, job: &Job) -> Result<(), StorageError> {
        let _guard = self.queue_lock.lock();
        let mut jobs = read_json_or_default::<Job>(&self.queue_path);
        if jobs.iter().any(|j| j.id == job.id) {
            return Ok(());
        }
        jobs.push(job.clone());
        atomic_write_json(&self.queue_path, &jobs)
    }

    /// Remove and return the job with the given id from the persisted queue.
    pub fn dequeue(&self, id: &JobId) -> Result<Option<Job>, StorageError> {
        let _guard = self.queue_lock.lock();
        let mut jobs = read_json_or_default::<Job>(&self.queue_path);
        let position = jobs.iter().position(|j| j.id == *id);
        let removed = position.map(|i| jobs.remove(i));
        if removed.is_some() {
            atomic_write_json(&self.queue_path, &jobs)?;
        }
        Ok(removed)
    }

    pub fn add_running(&self, job: &Job) -> Result<(), StorageError> {
        let _guard = self.running_lock.lock();
        let mut jobs = read_json_or_default::<Job>(&self.running_path);
        if jobs.iter().any(|j| j.id == job.id) {
            return Ok(());
        }
        jobs.push(job.clone());
        atomic_write_json(&self.running_path, &jobs)
    }

    pub fn remove_running(&self, id: &JobId) -> Result<Option<Job>, StorageError> {
        let _guard = self.running_lock.lock();
        let mut jobs = read_json_or_default::<Job>(&self.running_path);
        let position = jobs.iter().position(|j| j.id == *id);
        let removed = position.map(|i| jobs.remove(i));
        if removed.is_some() {
            atomic_write_json(&self.running_path, &jobs)?;
        }
        Ok(removed)
    }

    /// Append `job` to the completed-job log. Unconditional: unlike
    /// [`enqueue`](Self::enqueue), a job id already present is appended again
    /// rather than deduplicated, since completed entries are a log, not a set.
    pub fn append_completed(&self, job: &Job) -> Result<(), StorageError> {
        let _guard = self.completed_lock.lock();
        let mut jobs = read_json_or_default::<Job>(&self.completed_path);
        jobs.push(job.clone());
        atomic_write_json(&self.completed_path, &jobs)
    }
}

fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let tmp_path = tmp_sibling(path);
    let body = serde_json::to_string_pretty(value)?;
    fs::write(&tmp_path, body).map_err(|source| StorageError::Io { path: tmp_path.clone(), source })?;
    fs::rename(&tmp_path, path).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })
}

fn read_json_or_default<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "state file unreadable, treating as empty");
            return Vec::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(jobs) => jobs,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "state file unparseable, treating as empty");
            Vec::new()
        }
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn gc_stray_tmp(path: &Path) {
    let tmp = tmp_sibling(path);
    if tmp.exists() {
        if let Err(err) = fs::remove_file(&tmp) {
            tracing::warn!(path = %tmp.display(), error = %err, "failed to remove stray tmp file");
        }
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
