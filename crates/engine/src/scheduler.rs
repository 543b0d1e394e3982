// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker pool: a bounded number of blocking threads pulling jobs off a
//! shared pending queue, running them, classifying their output, and
//! deciding what happens next (chain, retry, archive, or halt the pipeline).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orca_core::{Clock, Job, JobKind, JobStatus, TerminalOutcome};
use parking_lot::{Condvar, Mutex};

use crate::archiver::Archiver;
use crate::chain_builder::ChainBuilder;
use crate::classifier::{classify, Classification, ClassifierOutcome};
use crate::error::EngineError;
use crate::executor::Executor;
use crate::notifier::Notifier;
use crate::safe_read::safe_read_text;

const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Seam the scheduler runs a job through. [`Executor`] is the production
/// implementation; tests substitute a fake to avoid spawning a real ORCA
/// binary. Returns the path to the resolved primary output.
pub trait JobRunner: Send + Sync {
    fn run(&self, inp_path: &Path, work_dir: &Path) -> Result<PathBuf, EngineError>;
}

impl JobRunner for Executor {
    fn run(&self, inp_path: &Path, work_dir: &Path) -> Result<PathBuf, EngineError> {
        Executor::run(self, inp_path, work_dir)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Number of worker threads dispatching jobs concurrently.
    pub max_parallel: usize,
    /// How many times an incomplete job is resubmitted before it degrades to
    /// a final `Recoverable` disposition.
    pub max_retries: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_parallel: 2, max_retries: 2 }
    }
}

/// One attempt's result: the classification plus the raw output text, kept
/// around so a successful Optimize attempt can hand it straight to
/// [`ChainBuilder`] without re-reading the (about to be archived) file.
struct Attempt {
    classification: Classification,
    output_text: String,
}

impl Attempt {
    fn fatal(message: impl Into<String>) -> Self {
        Self { classification: Classification::fatal(message), output_text: String::new() }
    }
}

/// The bounded worker pool. Persists every queue transition to the
/// [`orca_storage::StateStore`] before acting on it, so a crash mid-job
/// leaves on-disk state a caller can recover from (see [`Scheduler::recover`]).
pub struct Scheduler<C: Clock> {
    store: Arc<orca_storage::StateStore>,
    runner: Arc<dyn JobRunner>,
    notifier: Arc<dyn Notifier>,
    chain: ChainBuilder,
    archiver: Archiver,
    clock: C,
    config: SchedulerConfig,
    working_root: PathBuf,
    waiting_root: PathBuf,
    pending: Mutex<VecDeque<Job>>,
    cond: Condvar,
    running: Mutex<Vec<Job>>,
    fatal: AtomicBool,
    shutdown: AtomicBool,
}

impl<C: Clock> Scheduler<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<orca_storage::StateStore>,
        runner: Arc<dyn JobRunner>,
        notifier: Arc<dyn Notifier>,
        chain: ChainBuilder,
        archiver: Archiver,
        working_root: impl Into<PathBuf>,
        waiting_root: impl Into<PathBuf>,
        clock: C,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            runner,
            notifier,
            chain,
            archiver,
            clock,
            config,
            working_root: working_root.into(),
            waiting_root: waiting_root.into(),
            pending: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            running: Mutex::new(Vec::new()),
            fatal: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Reload queued and running jobs recorded on disk into memory, then
    /// pick up any deck in `waiting/` that never made it into a job record.
    ///
    /// A job found in the running set did not survive the process that was
    /// running it. Per spec.md §4.5.2: if its work_dir (or, failing that,
    /// the products tree) holds a resolvable output, the attempt is
    /// classified and settled (archived, completed) just as a live worker
    /// would; otherwise it's requeued as an orphan. Requeuing is idempotent:
    /// an orphan whose deck path already matches a job already sitting in
    /// the pending queue is dropped rather than duplicated, so calling
    /// `recover` more than once never produces two jobs for the same deck.
    pub fn recover(&self) -> Result<(), EngineError> {
        for orphan in self.store.load_running() {
            self.recover_running(orphan)?;
        }

        let mut pending = self.pending.lock();
        for queued in self.store.load_queue() {
            if pending.iter().any(|existing| existing.id == queued.id) {
                continue;
            }
            pending.push_back(queued);
        }
        drop(pending);
        self.cond.notify_all();

        self.recover_orphan_decks()?;
        Ok(())
    }

    /// spec.md §4.5.2 item 3: a deck written into `waiting/` (by the watcher
    /// or a prior daemon run) whose job record never made it to disk — e.g.
    /// the process died between staging the deck and calling `submit`.
    /// Every `*.inp` already tracked by a known job (queued, running, or
    /// completed) is skipped, so recovery stays idempotent across restarts
    /// even though a job's deck is never deleted from `waiting/` once it's
    /// only *copied* into a `work_dir` (see `stage_inputs`).
    fn recover_orphan_decks(&self) -> Result<(), EngineError> {
        let entries = match std::fs::read_dir(&self.waiting_root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let mut known: std::collections::HashSet<PathBuf> =
            self.pending.lock().iter().map(|job| job.inp_path.clone()).collect();
        known.extend(self.running.lock().iter().map(|job| job.inp_path.clone()));
        known.extend(self.store.load_completed().into_iter().map(|job| job.inp_path));

        let mut deck_paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("inp"))
            .collect();
        deck_paths.sort();

        for deck_path in deck_paths {
            if known.contains(&deck_path) {
                continue;
            }
            let Some(stem) = deck_path.file_stem().and_then(|s| s.to_str()) else { continue };

            let xyz_path = deck_path.with_extension("xyz");
            let xyz_path = if xyz_path.is_file() { xyz_path } else { PathBuf::new() };

            let job = Job {
                id: orca_core::JobId::new(),
                inp_path: deck_path.clone(),
                xyz_path,
                kind: JobKind::infer_from_stem(stem),
                status: JobStatus::Queued,
                work_dir: None,
                start_time_ms: None,
                end_time_ms: None,
                retries: 0,
                error_message: None,
                created_at_ms: self.clock.epoch_ms() as i64,
            };
            tracing::info!(deck = %deck_path.display(), "recovered orphan deck from waiting directory");
            self.submit(job)?;
        }
        Ok(())
    }

    fn recover_running(&self, mut job: Job) -> Result<(), EngineError> {
        let mut candidate_dirs: Vec<PathBuf> = job.work_dir.clone().into_iter().filter(|dir| dir.is_dir()).collect();
        if let Some(molecule) = job.molecule() {
            let molecule_root = self.archiver.products_root().join(molecule);
            if let Ok(entries) = std::fs::read_dir(&molecule_root) {
                candidate_dirs.extend(entries.flatten().map(|entry| entry.path()).filter(|path| path.is_dir()));
            }
        }

        let found = job
            .stem()
            .and_then(|stem| candidate_dirs.iter().find_map(|dir| crate::output_resolver::resolve_primary_output(dir, stem)));

        let classification = found.as_ref().map(|path| safe_read_text(path).unwrap_or_default()).map(|text| classify(&text));

        match classification {
            Some(classification) if matches!(classification.outcome, ClassifierOutcome::Success | ClassifierOutcome::Fatal) => {
                let outcome = classification.outcome.as_terminal();
                job.error_message = classification.message;
                job.status = JobStatus::Completed { outcome };
                if let Some(dir) = job.work_dir.clone().filter(|dir| dir.is_dir()) {
                    let molecule = job.molecule().unwrap_or_else(|| job.stem().unwrap_or("job")).to_string();
                    let epoch_secs = self.clock.epoch_ms() / 1_000;
                    if let Err(err) = self.archiver.archive(&dir, &job, &molecule, outcome, epoch_secs) {
                        tracing::warn!(job_id = %job.id, error = %err, "failed to archive recovered work_dir");
                    }
                }
                // spec.md §4.5.2: do not set fatal_seen during recovery.
                self.store.remove_running(&job.id)?;
                self.store.append_completed(&job)?;
            }
            _ => {
                job.status = JobStatus::Queued;
                job.work_dir = None;
                self.store.remove_running(&job.id)?;
                let mut pending = self.pending.lock();
                if !pending.iter().any(|queued| queued.inp_path == job.inp_path) {
                    self.store.enqueue(&job)?;
                    pending.push_back(job);
                }
            }
        }
        Ok(())
    }

    /// Enqueue a new job, persisting it before making it visible to workers.
    pub fn submit(&self, job: Job) -> Result<(), EngineError> {
        self.store.enqueue(&job)?;
        self.pending.lock().push_back(job);
        self.cond.notify_one();
        Ok(())
    }

    /// Sum of [`Job::weight`] over every job queued or running right now.
    pub fn weighted_pending(&self) -> u32 {
        let queued: u32 = self.pending.lock().iter().map(Job::weight).sum();
        let running: u32 = self.running.lock().iter().map(Job::weight).sum();
        queued + running
    }

    /// True once any job has been classified `Fatal`. The daemon's main loop
    /// polls this to decide whether to keep accepting new geometries.
    pub fn has_fatal_error(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.cond.notify_all();
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn pop_pending(&self) -> Option<Job> {
        let mut guard = self.pending.lock();
        if guard.is_empty() {
            self.cond.wait_for(&mut guard, DEQUEUE_TIMEOUT);
        }
        guard.pop_front()
    }

    /// Mint a unique scratch directory name per spec.md §4.5 step 1:
    /// `{stem}_{kind}_{epoch_secs}`, disambiguated with `_1, _2, …` on
    /// collision (two attempts at the same job inside the same second).
    fn mint_work_dir(&self, job: &Job) -> PathBuf {
        let stem = job.stem().unwrap_or("job");
        let epoch_secs = self.clock.epoch_ms() / 1_000;
        let base = format!("{stem}_{}_{epoch_secs}", job.kind);
        let mut candidate = self.working_root.join(&base);
        let mut n = 1;
        while candidate.exists() {
            candidate = self.working_root.join(format!("{base}_{n}"));
            n += 1;
        }
        candidate
    }

    /// Spawn `config.max_parallel` worker threads, each running
    /// [`Scheduler::worker_loop`] until [`Scheduler::request_shutdown`] is
    /// called and the pending queue has drained.
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<std::thread::JoinHandle<()>>
    where
        C: 'static,
    {
        (0..self.config.max_parallel)
            .map(|_| {
                let scheduler = Arc::clone(self);
                std::thread::spawn(move || scheduler.worker_loop())
            })
            .collect()
    }

    /// Run the worker loop on the calling thread until shutdown is requested
    /// and the pending queue has drained. Intended to be the body of a
    /// spawned worker thread; see [`Scheduler::spawn_workers`].
    pub fn worker_loop(&self) {
        loop {
            match self.pop_pending() {
                Some(job) => self.process_job(job),
                None => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        return;
                    }
                }
            }
        }
    }

    fn process_job(&self, mut job: Job) {
        if let Err(err) = self.store.dequeue(&job.id) {
            tracing::error!(job_id = %job.id, error = %err, "failed to persist dequeue");
        }

        let work_dir = self.mint_work_dir(&job);
        job.status = JobStatus::Running;
        job.work_dir = Some(work_dir.clone());
        job.start_time_ms = Some(self.clock.epoch_ms() as i64);
        if let Err(err) = self.store.add_running(&job) {
            tracing::error!(job_id = %job.id, error = %err, "failed to persist running state");
        }
        self.running.lock().push(job.clone());

        let attempt = self.run_attempt(&job, &work_dir);

        self.running.lock().retain(|running| running.id != job.id);
        job.end_time_ms = Some(self.clock.epoch_ms() as i64);

        self.settle(job, work_dir, attempt);
    }

    fn run_attempt(&self, job: &Job, work_dir: &Path) -> Attempt {
        if let Err(err) = std::fs::create_dir_all(work_dir) {
            return Attempt::fatal(format!("could not create work_dir: {err}"));
        }
        let local_inp = match self.stage_inputs(job, work_dir) {
            Ok(path) => path,
            Err(err) => return Attempt::fatal(format!("failed to stage job inputs: {err}")),
        };

        match self.runner.run(&local_inp, work_dir) {
            Ok(out_path) => {
                let text = safe_read_text(&out_path).unwrap_or_default();
                let classification = classify(&text);
                Attempt { classification, output_text: text }
            }
            Err(err) => Attempt::fatal(err.to_string()),
        }
    }

    fn stage_inputs(&self, job: &Job, work_dir: &Path) -> Result<PathBuf, EngineError> {
        let inp_name = job
            .inp_path
            .file_name()
            .ok_or_else(|| EngineError::Deck(format!("deck path has no file name: {}", job.inp_path.display())))?;
        let local_inp = work_dir.join(inp_name);
        std::fs::copy(&job.inp_path, &local_inp)?;

        if !job.xyz_path.as_os_str().is_empty() && job.xyz_path.is_file() {
            if let Some(xyz_name) = job.xyz_path.file_name() {
                std::fs::copy(&job.xyz_path, work_dir.join(xyz_name))?;
            }
        }

        Ok(local_inp)
    }

    /// Applies the outcome-handling table of spec.md §4.5: retries an
    /// `Incomplete` attempt (archiving the attempt that failed) up to
    /// `max_retries`, then settles every other outcome as a terminal
    /// disposition, chaining, flagging fatal, archiving, and notifying as
    /// appropriate.
    fn settle(&self, mut job: Job, work_dir: PathBuf, attempt: Attempt) {
        let classifier_outcome = attempt.classification.outcome;
        job.error_message = attempt.classification.message.clone();

        if classifier_outcome == ClassifierOutcome::Incomplete && job.retries < self.config.max_retries {
            self.archive_attempt(&job, &work_dir, TerminalOutcome::Recoverable);

            job.retries += 1;
            job.status = JobStatus::Queued;
            job.work_dir = None;
            if let Err(err) = self.store.remove_running(&job.id) {
                tracing::warn!(job_id = %job.id, error = %err, "failed to clear running state for retry");
            }
            if let Err(err) = self.store.enqueue(&job) {
                tracing::error!(job_id = %job.id, error = %err, "failed to persist retry");
            }
            self.pending.lock().push_back(job);
            self.cond.notify_one();
            return;
        }

        // Incomplete with retries exhausted degrades to Recoverable here.
        let terminal = classifier_outcome.as_terminal();

        if terminal == TerminalOutcome::Success && job.kind == JobKind::Optimize {
            self.chain_frequency_job(&job, &attempt.output_text);
        }
        if terminal == TerminalOutcome::Fatal {
            self.fatal.store(true, Ordering::SeqCst);
        }

        self.archive_attempt(&job, &work_dir, terminal);

        job.status = JobStatus::Completed { outcome: terminal };
        if let Err(err) = self.store.remove_running(&job.id) {
            tracing::warn!(job_id = %job.id, error = %err, "failed to clear running state on settle");
        }
        if let Err(err) = self.store.append_completed(&job) {
            tracing::error!(job_id = %job.id, error = %err, "failed to persist completion");
        }

        let message = job.error_message.clone();
        match terminal {
            TerminalOutcome::Success => self.notifier.notify_success(&job),
            TerminalOutcome::Fatal => {
                self.notifier.notify_fatal(&job, message.as_deref().unwrap_or("fatal error"))
            }
            TerminalOutcome::Recoverable => {
                self.notifier.notify_recoverable(&job, message.as_deref().unwrap_or("recoverable error"))
            }
        }
    }

    fn archive_attempt(&self, job: &Job, work_dir: &Path, outcome: TerminalOutcome) {
        if !work_dir.exists() {
            return;
        }
        let molecule = job.molecule().unwrap_or_else(|| job.stem().unwrap_or("job")).to_string();
        let epoch_secs = self.clock.epoch_ms() / 1_000;
        if let Err(err) = self.archiver.archive(work_dir, job, &molecule, outcome, epoch_secs) {
            tracing::warn!(job_id = %job.id, error = %err, "failed to archive working directory");
        }
    }

    fn chain_frequency_job(&self, opt_job: &Job, output_text: &str) {
        let stem = opt_job.molecule().unwrap_or_else(|| opt_job.stem().unwrap_or("job"));
        let dest_inp = self.waiting_root.join(format!("{stem}_freq.inp"));
        let dest_inp = unique_path(&dest_inp);
        let now_ms = self.clock.epoch_ms() as i64;

        match self.chain.build_frequency_job(output_text, dest_inp.clone(), now_ms) {
            Ok((freq_job, deck_text)) => {
                if let Err(err) = std::fs::create_dir_all(&self.waiting_root) {
                    tracing::error!(error = %err, "failed to create waiting directory for chained job");
                    return;
                }
                if let Err(err) = std::fs::write(&dest_inp, deck_text) {
                    tracing::error!(error = %err, "failed to write chained frequency deck");
                    return;
                }
                if let Err(err) = self.submit(freq_job) {
                    tracing::error!(error = %err, "failed to submit chained frequency job");
                }
            }
            Err(err) => {
                tracing::warn!(job_id = %opt_job.id, error = %err, "optimize job succeeded but no geometry could be chained");
            }
        }
    }
}

/// Appends `_1`, `_2`, ... to `base` until it names a path that doesn't
/// exist, matching the collision-safe naming spec.md calls for whenever a
/// deck might already occupy the destination (spec.md §4.5.2, §4.7).
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

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
