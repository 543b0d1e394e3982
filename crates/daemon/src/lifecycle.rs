// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: singleton lock, directory layout, and crash recovery.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use orca_core::SystemClock;
use orca_engine::{
    Archiver, ChainBuilder, Executor, JobRunner, LoggingNotifier, Notifier, Scheduler, SchedulerConfig,
};
use orca_storage::StateStore;
use thiserror::Error;

use crate::config::Config;
use crate::notify_adapter::DesktopNotifier;
use crate::post_archive::DaemonPostArchiveHooks;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine a state directory (no ORCA_STATE_DIR, XDG_STATE_HOME, or home directory)")]
    NoStateDir,
    #[error("another orcad is already running against this state directory: {0}")]
    LockFailed(std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] orca_storage::StorageError),
}

/// Holds the daemon's singleton lock for the process lifetime. Dropping it
/// releases the lock, which is also released implicitly on process exit.
pub struct SingletonLock {
    _file: File,
}

/// Acquire the exclusive lock at `config.lock_path`, writing this process's
/// pid into it. Fails immediately (no blocking) if another daemon already
/// holds it.
pub fn acquire_lock(config: &Config) -> Result<SingletonLock, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut file = file;
    file.set_len(0)?;
    file.write_all(std::process::id().to_string().as_bytes())?;

    Ok(SingletonLock { _file: file })
}

/// Create every working directory the daemon needs.
pub fn ensure_directories(config: &Config) -> Result<(), LifecycleError> {
    for dir in config.directories() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Build the scheduler for this daemon run and replay any queued/orphaned
/// jobs left on disk from a previous, uncleanly-terminated run.
pub fn build_scheduler(
    config: &Config,
    store: Arc<StateStore>,
) -> Result<Arc<Scheduler<SystemClock>>, LifecycleError> {
    let notifier: Arc<dyn Notifier> = if config.desktop_notifications {
        Arc::new(DesktopNotifier::new(true))
    } else {
        Arc::new(LoggingNotifier)
    };
    let runner: Arc<dyn JobRunner> = Arc::new(Executor::new(config.orca_path.clone()));
    let chain = ChainBuilder::new(config.orca.clone());
    let hooks = Arc::new(DaemonPostArchiveHooks::new(
        config.generate_molden.then(|| config.orca_2mkl_path.clone()).flatten(),
    ));
    let archiver = Archiver::with_hooks(config.products_dir.clone(), hooks);

    let scheduler = Arc::new(Scheduler::new(
        store,
        runner,
        notifier,
        chain,
        archiver,
        config.working_dir.clone(),
        config.waiting_dir.clone(),
        SystemClock,
        SchedulerConfig { max_parallel: config.max_parallel, max_retries: config.max_retries },
    ));

    scheduler.recover()?;
    Ok(scheduler)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
