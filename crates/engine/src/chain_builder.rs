// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the follow-on Frequency job that runs after an Optimize job
//! succeeds, extracting the converged geometry directly from the solver's
//! output text (spec.md §4.7) rather than from a separate `.xyz` file.

use std::path::PathBuf;

use orca_core::{CalcStep, Job, JobId, JobKind, JobStatus, OrcaConfig};

use crate::deck::{extract_last_cartesian_block, render_deck};
use crate::error::EngineError;

pub struct ChainBuilder {
    config: OrcaConfig,
}

impl ChainBuilder {
    pub fn new(config: OrcaConfig) -> Self {
        Self { config }
    }

    /// Build the Frequency job that should follow a successful Optimize job.
    ///
    /// Scans `output_text` (the optimize job's solver output) for the last
    /// `CARTESIAN COORDINATES (ANGSTROEM)` block, renders a Freq deck from
    /// it, and returns the new [`Job`] record together with the deck text
    /// the caller is responsible for writing to `dest_inp_path`. The
    /// returned job's `xyz_path` is empty: its geometry lives only in the
    /// deck this call produces.
    pub fn build_frequency_job(
        &self,
        output_text: &str,
        dest_inp_path: PathBuf,
        now_ms: i64,
    ) -> Result<(Job, String), EngineError> {
        let geometry = extract_last_cartesian_block(output_text).ok_or_else(|| {
            EngineError::Deck(
                "no CARTESIAN COORDINATES (ANGSTROEM) block found in optimize output".to_string(),
            )
        })?;
        let deck = render_deck(&self.config, CalcStep::Freq, &geometry);

        let job = Job {
            id: JobId::new(),
            inp_path: dest_inp_path,
            xyz_path: PathBuf::new(),
            kind: JobKind::Frequency,
            status: JobStatus::Queued,
            work_dir: None,
            start_time_ms: None,
            end_time_ms: None,
            retries: 0,
            error_message: None,
            created_at_ms: now_ms,
        };

        Ok((job, deck))
    }
}

#[cfg(test)]
#[path = "chain_builder_tests.rs"]
mod tests;
