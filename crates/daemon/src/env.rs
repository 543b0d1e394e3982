// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve the state directory: `ORCA_STATE_DIR` > `XDG_STATE_HOME/orca-pipeline` >
/// `~/.local/state/orca-pipeline`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("ORCA_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("orca-pipeline"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/orca-pipeline"))
}

/// Path to the TOML config file: `ORCA_CONFIG_PATH` > `{state_dir}/config.toml`.
pub fn config_path() -> Result<PathBuf, LifecycleError> {
    if let Ok(path) = std::env::var("ORCA_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(state_dir()?.join("config.toml"))
}
