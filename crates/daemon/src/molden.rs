// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort Molden conversion: after a job is archived, any `.gbw`
//! wavefunction file it produced is run through `orca_2mkl` to emit a
//! Molden-format file alongside it. Failures are logged, never fatal.

use std::path::Path;
use std::process::Command;

/// Invokes `orca_2mkl {base} -molden` for every `.gbw` file found directly
/// inside `archive_dir`.
pub struct MoldenConverter {
    orca_2mkl_path: std::path::PathBuf,
}

impl MoldenConverter {
    pub fn new(orca_2mkl_path: impl Into<std::path::PathBuf>) -> Self {
        Self { orca_2mkl_path: orca_2mkl_path.into() }
    }

    /// Convert every `.gbw` file in `archive_dir`. Each conversion is
    /// independent and best-effort: one failure doesn't stop the rest.
    pub fn convert_all(&self, archive_dir: &Path) {
        let entries = match std::fs::read_dir(archive_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %archive_dir.display(), %err, "could not scan archive directory for molden conversion");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("gbw") {
                self.convert_one(&path);
            }
        }
    }

    fn convert_one(&self, gbw_path: &Path) {
        let Some(base) = gbw_path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let dir = gbw_path.parent().unwrap_or_else(|| Path::new("."));

        let result = Command::new(&self.orca_2mkl_path)
            .arg(base)
            .arg("-molden")
            .current_dir(dir)
            .output();

        match result {
            Ok(output) if output.status.success() => {
                tracing::info!(base, "generated molden file");
            }
            Ok(output) => {
                tracing::warn!(
                    base,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "orca_2mkl exited non-zero"
                );
            }
            Err(err) => {
                tracing::warn!(base, %err, "failed to run orca_2mkl");
            }
        }
    }
}

#[cfg(test)]
#[path = "molden_tests.rs"]
mod tests;
