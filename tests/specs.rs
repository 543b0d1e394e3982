//! Black-box end-to-end coverage of spec.md §8's scenarios: drive the real
//! `orcad` binary against a scripted stand-in for the ORCA executable and
//! assert on what lands on disk, the same way an operator would observe the
//! pipeline. No crate internals are touched here — only `ORCA_STATE_DIR`,
//! `config.toml`, and the directory layout `orcad` itself documents.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin;

/// Polls `predicate` until it returns `Some`, or panics once `timeout` elapses.
fn wait_for<T>(timeout: Duration, mut predicate: impl FnMut() -> Option<T>) -> T {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = predicate() {
            return value;
        }
        if Instant::now() >= deadline {
            panic!("condition did not become true within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// First entry directly under `dir` whose file name starts with `prefix`.
fn find_child_starting_with(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with(prefix)))
}

/// A fake `orca` executable: a shell script that inspects the deck file name
/// passed as its sole argument and writes a canned `.out` file next to it,
/// keyed by a marker baked into the stem by the test (`*fatal*`,
/// `*recoverable*`, `*incomplete*`, anything else succeeds with a coordinate
/// block so chaining can be exercised).
fn write_fake_solver(dir: &Path) -> PathBuf {
    let path = dir.join("fake_orca.sh");
    let script = r#"#!/bin/sh
set -e
deck="$1"
stem="${deck%.*}"
case "$stem" in
  *fatal*)
    echo "Unknown basis set requested" > "${stem}.out"
    ;;
  *recoverable*)
    echo "SCF NOT CONVERGED" > "${stem}.out"
    ;;
  *incomplete*)
    echo "still crunching, nothing conclusive" > "${stem}.out"
    ;;
  *)
    cat > "${stem}.out" <<'EOF'
Some ORCA preamble banner
CARTESIAN COORDINATES (ANGSTROEM)
  C      0.000000    0.000000    0.000000
  H      1.089000    0.000000    0.000000

ORCA TERMINATED NORMALLY
EOF
    ;;
esac
exit 0
"#;
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn write_config(state_dir: &Path, orca_path: &Path, max_parallel: usize, max_retries: u32) -> PathBuf {
    let config_path = state_dir.join("config.toml");
    let contents = format!(
        r#"
[orca]
orca_path = "{orca}"
method = "B3LYP"
basis = "def2-SVP"
solvent_model = "none"
nprocs = 1
maxcore = 2000
charge = 0
multiplicity = 1

[scheduler]
max_parallel = {max_parallel}
max_retries = {max_retries}

[notification]
desktop_enabled = false
pending_threshold = 0
"#,
        orca = orca_path.display(),
    );
    fs::write(&config_path, contents).unwrap();
    config_path
}

struct Daemon {
    child: Child,
    state_dir: PathBuf,
}

impl Daemon {
    fn spawn(state_dir: PathBuf, config_path: &Path) -> Self {
        let child = Command::new(cargo_bin("orcad"))
            .env("ORCA_STATE_DIR", &state_dir)
            .env("ORCA_CONFIG_PATH", config_path)
            .env("ORCA_LOG", "info")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn orcad");
        Self { child, state_dir }
    }

    fn drop_geometry(&self, file_name: &str, xyz_text: &str) {
        let input_dir = self.state_dir.join("folders/input");
        wait_for(Duration::from_secs(5), || input_dir.is_dir().then_some(()));
        fs::write(input_dir.join(file_name), xyz_text).unwrap();
    }

    fn products_dir(&self) -> PathBuf {
        self.state_dir.join("folders/products")
    }

    fn waiting_dir(&self) -> PathBuf {
        self.state_dir.join("folders/waiting")
    }

    fn completed_records(&self) -> Vec<serde_json::Value> {
        let path = self.state_dir.join("state/completed.json");
        let text = fs::read_to_string(path).unwrap_or_else(|_| "[]".to_string());
        serde_json::from_str(&text).unwrap_or_default()
    }

    /// Wait until the process exits on its own (the fatal path), or up to
    /// `timeout`, whichever comes first. Returns `true` if it had already
    /// exited.
    fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.child.try_wait().ok().flatten().is_some() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

const WATER_XYZ: &str = "2\nwater fragment\nC 0.0 0.0 0.0\nH 1.089 0.0 0.0\n";

/// Scenario 1 (spec.md §8): a successful Optimize job archives under
/// `opt..._success_*` and chains a Frequency deck into `waiting/`.
#[test]
fn successful_optimize_job_archives_and_chains_a_frequency_job() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let solver = write_fake_solver(root.path());
    let config_path = write_config(&state_dir, &solver, 1, 2);

    let mut daemon = Daemon::spawn(state_dir, &config_path);
    daemon.drop_geometry("water.xyz", WATER_XYZ);

    let molecule_dir = daemon.products_dir().join("water");
    let archive = wait_for(Duration::from_secs(20), || find_child_starting_with(&molecule_dir, "optimize_success_"));
    assert!(archive.join("water.out").is_file() || fs::read_dir(&archive).unwrap().next().is_some());

    let freq_deck = daemon.waiting_dir().join("water_freq.inp");
    wait_for(Duration::from_secs(10), || freq_deck.is_file().then_some(()));
    let freq_text = fs::read_to_string(&freq_deck).unwrap();
    assert!(freq_text.contains("Freq"));
    assert!(freq_text.contains("C "));

    assert!(!daemon.wait_for_exit(Duration::from_millis(200)), "a success must not halt the pipeline");
}

/// Scenario 2: a fatal classification archives under `..._fatal_*`, sets the
/// halt condition, and the daemon stops accepting work (observed here as the
/// process exiting its main loop).
#[test]
fn fatal_output_halts_the_pipeline() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let solver = write_fake_solver(root.path());
    let config_path = write_config(&state_dir, &solver, 1, 2);

    let mut daemon = Daemon::spawn(state_dir, &config_path);
    daemon.drop_geometry("fatal.xyz", WATER_XYZ);

    let molecule_dir = daemon.products_dir().join("fatal");
    wait_for(Duration::from_secs(20), || find_child_starting_with(&molecule_dir, "optimize_fatal_"));

    assert!(daemon.wait_for_exit(Duration::from_secs(10)), "daemon must exit its main loop after a fatal outcome");

    let freq_deck = daemon.waiting_dir().join("fatal_freq.inp");
    assert!(!freq_deck.exists(), "a fatal optimize job must not chain a frequency job");
}

/// Scenario 3: a recoverable classification archives under `..._failed_*`
/// with no retry and does not set the halt condition.
#[test]
fn recoverable_output_archives_without_retry_or_halt() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let solver = write_fake_solver(root.path());
    let config_path = write_config(&state_dir, &solver, 1, 2);

    let mut daemon = Daemon::spawn(state_dir, &config_path);
    daemon.drop_geometry("recoverable.xyz", WATER_XYZ);

    let molecule_dir = daemon.products_dir().join("recoverable");
    wait_for(Duration::from_secs(20), || find_child_starting_with(&molecule_dir, "optimize_failed_"));

    // Give the scheduler a moment to (incorrectly) retry, then confirm it didn't.
    std::thread::sleep(Duration::from_millis(500));
    let archived = fs::read_dir(&molecule_dir).unwrap().count();
    assert_eq!(archived, 1, "a recoverable outcome must not retry");

    assert!(!daemon.wait_for_exit(Duration::from_millis(200)), "a recoverable outcome must not halt the pipeline");

    let freq_deck = daemon.waiting_dir().join("recoverable_freq.inp");
    assert!(!freq_deck.exists());
}

/// Scenario 4: an incomplete job with `max_retries = 2` is attempted three
/// times total and then settles as a completed `recoverable` record, leaving
/// an archive directory for every attempt.
#[test]
fn incomplete_job_retries_to_exhaustion_then_degrades_to_recoverable() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let solver = write_fake_solver(root.path());
    let config_path = write_config(&state_dir, &solver, 1, 2);

    let mut daemon = Daemon::spawn(state_dir, &config_path);
    daemon.drop_geometry("incomplete.xyz", WATER_XYZ);

    let molecule_dir = daemon.products_dir().join("incomplete");
    wait_for(Duration::from_secs(30), || {
        let count = fs::read_dir(&molecule_dir).map(|entries| entries.count()).unwrap_or(0);
        (count >= 3).then_some(())
    });

    let completed = wait_for(Duration::from_secs(10), || {
        let records = daemon.completed_records();
        (!records.is_empty()).then_some(records)
    });
    assert_eq!(completed.len(), 1, "only the final attempt is recorded as a completion");
    assert_eq!(completed[0]["retries"], 2);
    assert_eq!(completed[0]["status"]["state"], "completed");
    assert_eq!(completed[0]["status"]["outcome"], "recoverable");

    assert!(!daemon.wait_for_exit(Duration::from_millis(200)));
}

/// Scenario 5 (crash recovery): a `running` record whose `work_dir` no
/// longer exists, and no archived output either, is requeued as waiting on
/// the next start and then runs to completion normally.
#[test]
fn crash_recovery_requeues_an_orphaned_running_job_and_it_completes() {
    let root = tempfile::tempdir().unwrap();
    let state_dir = root.path().join("state");
    let solver = write_fake_solver(root.path());
    let config_path = write_config(&state_dir, &solver, 1, 2);

    // Pre-seed the on-disk layout as if a prior daemon crashed mid-attempt:
    // a deck staged in waiting/, and a running record pointing at a
    // work_dir that was never created (or was cleaned up already).
    let waiting_dir = state_dir.join("folders/waiting");
    fs::create_dir_all(&waiting_dir).unwrap();
    let inp_path = waiting_dir.join("orphan.inp");
    fs::write(&inp_path, "! B3LYP def2-SVP Opt\n* xyz 0 1\nC 0.0 0.0 0.0\nH 1.089 0.0 0.0\n*\n").unwrap();

    let state_store_dir = state_dir.join("state");
    fs::create_dir_all(&state_store_dir).unwrap();
    let fake_job_id = format!("job-{}", "0".repeat(19));
    let running_record = serde_json::json!([{
        "id": fake_job_id,
        "inp_path": inp_path,
        "xyz_path": "",
        "kind": "optimize",
        "status": { "state": "running" },
        "work_dir": state_dir.join("folders/working/long-gone"),
        "start_time_ms": 0,
        "end_time_ms": null,
        "retries": 0,
        "error_message": null,
        "created_at_ms": 0,
    }]);
    let mut file = fs::File::create(state_store_dir.join("running.json")).unwrap();
    file.write_all(serde_json::to_string_pretty(&running_record).unwrap().as_bytes()).unwrap();
    drop(file);

    let daemon = Daemon::spawn(state_dir.clone(), &config_path);

    let molecule_dir = daemon.products_dir().join("orphan");
    wait_for(Duration::from_secs(20), || find_child_starting_with(&molecule_dir, "optimize_success_"));

    let running_text = fs::read_to_string(state_store_dir.join("running.json")).unwrap_or_default();
    let running: Vec<serde_json::Value> = serde_json::from_str(&running_text).unwrap_or_default();
    assert!(running.is_empty(), "the recovered job must not remain in the running list");
}
