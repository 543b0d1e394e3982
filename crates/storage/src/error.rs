// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors that can occur while persisting queue state.
///
/// Reads never fail: an unreadable or corrupt file is treated as empty (see
/// [`crate::StateStore`] docs). Only writes surface errors, since a failed
/// write means the caller's in-memory state and disk have diverged.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}
