// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the engine crate's job-running machinery.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] orca_storage::StorageError),
    #[error("malformed xyz geometry: {0}")]
    Deck(String),
    #[error("orca subprocess failed to start: {0}")]
    Subprocess(String),
    #[error("no output file could be located for job {stem} (stderr: {stderr_prefix})")]
    MissingOutput { stem: String, stderr_prefix: String },
}
