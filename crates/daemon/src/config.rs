// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk TOML configuration for the daemon, and the fully-resolved
//! [`Config`] derived from it (all paths anchored under one state directory).

use std::path::{Path, PathBuf};

use orca_core::{OrcaConfig, SolventModel};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid solvent model {0:?}: {1}")]
    Solvent(String, String),
}

/// The `[orca]` section: method/basis/resource settings plus the executable
/// paths the daemon shells out to.
#[derive(Debug, Clone, Deserialize)]
pub struct OrcaSection {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_basis")]
    pub basis: String,
    #[serde(default)]
    pub solvent_model: String,
    #[serde(default)]
    pub solvent_name: Option<String>,
    #[serde(default = "default_nprocs")]
    pub nprocs: u32,
    #[serde(default = "default_maxcore")]
    pub maxcore: u32,
    #[serde(default)]
    pub charge: i32,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
    #[serde(default)]
    pub extra_keywords: Vec<String>,
    pub orca_path: PathBuf,
    #[serde(default)]
    pub orca_2mkl_path: Option<PathBuf>,
    #[serde(default)]
    pub generate_molden: bool,
}

fn default_method() -> String {
    "B3LYP".to_string()
}
fn default_basis() -> String {
    "def2-SVP".to_string()
}
fn default_nprocs() -> u32 {
    1
}
fn default_maxcore() -> u32 {
    2000
}
fn default_multiplicity() -> u32 {
    1
}

/// The `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_parallel() -> usize {
    2
}
fn default_max_retries() -> u32 {
    2
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self { max_parallel: default_max_parallel(), max_retries: default_max_retries() }
    }
}

/// The `[notification]` section. Only the desktop toast channel is wired up;
/// sound and email fan-out are not implemented (see `DESIGN.md`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSection {
    #[serde(default)]
    pub desktop_enabled: bool,
    /// Weighted-pending level a downward crossing of which raises a drain
    /// alert. `0` (the default) disables the watch entirely.
    #[serde(default)]
    pub pending_threshold: u32,
    /// Minimum seconds between two drain alerts.
    #[serde(default = "default_pending_debounce_secs")]
    pub pending_debounce_secs: u64,
}

fn default_pending_debounce_secs() -> u64 {
    300
}

/// Raw shape of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub orca: OrcaSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub notification: NotificationSection,
}

/// Fully-resolved daemon configuration: every path anchored under
/// `state_dir`, derived once at startup rather than recomputed per use.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub input_dir: PathBuf,
    pub waiting_dir: PathBuf,
    pub working_dir: PathBuf,
    pub products_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub lock_path: PathBuf,
    pub orca: OrcaConfig,
    pub orca_path: PathBuf,
    pub orca_2mkl_path: Option<PathBuf>,
    pub generate_molden: bool,
    pub max_parallel: usize,
    pub max_retries: u32,
    pub desktop_notifications: bool,
    pub pending_threshold: u32,
    pub pending_debounce_secs: u64,
}

impl Config {
    pub fn load(config_path: &Path, state_dir: PathBuf) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(config_path)
            .map_err(|source| ConfigError::Read { path: config_path.to_path_buf(), source })?;
        let raw: RawConfig = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: config_path.to_path_buf(), source })?;
        Self::from_raw(raw, state_dir)
    }

    fn from_raw(raw: RawConfig, state_dir: PathBuf) -> Result<Self, ConfigError> {
        let solvent_model: SolventModel = raw
            .orca
            .solvent_model
            .parse()
            .map_err(|err| ConfigError::Solvent(raw.orca.solvent_model.clone(), err))?;

        let orca = OrcaConfig {
            method: raw.orca.method,
            basis: raw.orca.basis,
            solvent_model,
            solvent_name: raw.orca.solvent_name,
            nprocs: raw.orca.nprocs,
            maxcore: raw.orca.maxcore,
            charge: raw.orca.charge,
            multiplicity: raw.orca.multiplicity,
            extra_keywords: raw.orca.extra_keywords,
        };

        Ok(Self {
            input_dir: state_dir.join("folders/input"),
            waiting_dir: state_dir.join("folders/waiting"),
            working_dir: state_dir.join("folders/working"),
            products_dir: state_dir.join("folders/products"),
            logs_dir: state_dir.join("logs"),
            lock_path: state_dir.join("orcad.lock"),
            orca_path: raw.orca.orca_path,
            orca_2mkl_path: raw.orca.orca_2mkl_path,
            generate_molden: raw.orca.generate_molden,
            max_parallel: raw.scheduler.max_parallel,
            max_retries: raw.scheduler.max_retries,
            desktop_notifications: raw.notification.desktop_enabled,
            pending_threshold: raw.notification.pending_threshold,
            pending_debounce_secs: raw.notification.pending_debounce_secs,
            state_dir,
            orca,
        })
    }

    /// All directories the daemon needs to exist before it can run.
    pub fn directories(&self) -> [&Path; 6] {
        [
            &self.state_dir,
            &self.input_dir,
            &self.waiting_dir,
            &self.working_dir,
            &self.products_dir,
            &self.logs_dir,
        ]
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
