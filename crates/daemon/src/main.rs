// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orcad`: watches an input directory for dropped geometries, drives them
//! through ORCA optimize/frequency jobs, and archives the results. See
//! `orca-daemon`'s module docs for the pieces this wires together.

use std::sync::Arc;
use std::time::Duration;

use orca_daemon::{acquire_lock, build_scheduler, ensure_directories, logging, watcher, Config, InputWatcher};
use orca_storage::StateStore;
use thiserror::Error;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Lifecycle(#[from] orca_daemon::LifecycleError),
    #[error(transparent)]
    Config(#[from] orca_daemon::ConfigError),
    #[error(transparent)]
    Storage(#[from] orca_storage::StorageError),
    #[error(transparent)]
    Watch(#[from] watcher::WatchError),
}

fn main() -> Result<(), StartupError> {
    let state_dir = orca_daemon::env::state_dir()?;
    let config_path = orca_daemon::env::config_path()?;

    let config = Config::load(&config_path, state_dir)?;
    ensure_directories(&config)?;

    let _log_guard = logging::init(&config.logs_dir);
    tracing::info!(state_dir = %config.state_dir.display(), "starting orcad");

    let _lock = acquire_lock(&config)?;

    let store = Arc::new(StateStore::open(config.state_dir.join("state"))?);
    let scheduler = build_scheduler(&config, Arc::clone(&store))?;

    let _workers = scheduler.spawn_workers();
    let _watcher = InputWatcher::start(
        &config.input_dir,
        config.waiting_dir.clone(),
        config.orca.clone(),
        Arc::clone(&scheduler),
    )?;

    let drain_shutdown = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let drain_thread = if config.pending_threshold > 0 {
        let watch = orca_engine::DrainWatch::new(
            orca_core::SystemClock,
            config.pending_threshold,
            Duration::from_secs(config.pending_debounce_secs),
        );
        let notifier: Arc<dyn orca_engine::Notifier> = Arc::new(orca_daemon::DesktopNotifier::new(config.desktop_notifications));
        let scheduler = Arc::clone(&scheduler);
        let shutdown = Arc::clone(&drain_shutdown);
        Some(std::thread::spawn(move || {
            orca_engine::drain_watch::run(
                watch,
                move || scheduler.weighted_pending(),
                notifier,
                Duration::from_secs(5),
                shutdown,
            )
        }))
    } else {
        None
    };

    tracing::info!("orcad is up, watching {}", config.input_dir.display());

    // No OS signal handling: the daemon has no way to register one without
    // unsafe code, so it relies on in-process halt conditions (a fatal
    // classification) and external process termination instead.
    loop {
        if scheduler.has_fatal_error() {
            tracing::error!("a job was classified fatal; no longer accepting new work");
            break;
        }
        std::thread::sleep(Duration::from_secs(2));
    }

    drain_shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    if let Some(handle) = drain_thread {
        let _ = handle.join();
    }

    Ok(())
}
