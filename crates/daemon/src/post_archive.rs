// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's [`PostArchiveHooks`] implementation: best-effort Molden
//! conversion plus handing the archived output to the energy-trajectory
//! plotter (spec.md §4.6). The plotter itself is an external collaborator
//! (spec.md §1) — out of scope for this repo — so that half of the hook
//! only resolves the output and logs what it would have dispatched.

use std::path::{Path, PathBuf};

use orca_core::Job;
use orca_engine::{resolve_primary_output, PostArchiveHooks};

use crate::molden::MoldenConverter;

/// Runs after every `Success`/`Recoverable` archive: converts any `.gbw`
/// wavefunction to Molden format (if configured) and resolves the archived
/// primary output for the plotter hand-off. Both steps are best-effort.
pub struct DaemonPostArchiveHooks {
    molden: Option<MoldenConverter>,
}

impl DaemonPostArchiveHooks {
    /// `orca_2mkl_path` is `None` when molden generation is disabled in
    /// config, or no `orca_2mkl` path was configured.
    pub fn new(orca_2mkl_path: Option<PathBuf>) -> Self {
        Self { molden: orca_2mkl_path.map(MoldenConverter::new) }
    }
}

impl PostArchiveHooks for DaemonPostArchiveHooks {
    fn after_archive(&self, archive_dir: &Path, job: &Job) {
        if let Some(molden) = &self.molden {
            molden.convert_all(archive_dir);
        }

        let Some(stem) = job.stem() else { return };
        match resolve_primary_output(archive_dir, stem) {
            Some(output_path) => {
                tracing::debug!(
                    output = %output_path.display(),
                    molecule = job.molecule().unwrap_or(stem),
                    kind = %job.kind,
                    "archived output ready for energy-trajectory plotting"
                );
            }
            None => {
                tracing::debug!(dir = %archive_dir.display(), "no primary output found to plot");
            }
        }
    }
}

#[cfg(test)]
#[path = "post_archive_tests.rs"]
mod tests;
