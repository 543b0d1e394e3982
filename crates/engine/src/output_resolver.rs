// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locates the output file a finished ORCA run produced, which is not always
//! named predictably: invocation style and ORCA version both affect it.

use std::path::{Path, PathBuf};

const PRIMARY_SUFFIXES: &[&str] = &[".out", "_orca.log", ".log"];

/// Find the most likely primary output file for a job whose deck stem is
/// `stem`, inside `work_dir`.
///
/// Checks the conventional names first (`{stem}.out`, `{stem}_orca.log`,
/// `{stem}.log`); if none exist, falls back to scanning the directory for any
/// file carrying one of those suffixes, preferring `.out` files, then
/// `_orca.log`, then `.log`, and breaking ties alphabetically.
pub fn resolve_primary_output(work_dir: &Path, stem: &str) -> Option<PathBuf> {
    for suffix in PRIMARY_SUFFIXES {
        let candidate = work_dir.join(format!("{stem}{suffix}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    fallback_scan(work_dir)
}

fn fallback_scan(work_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(work_dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    for suffix in PRIMARY_SUFFIXES {
        if let Some(name) = names.iter().find(|name| name.ends_with(suffix)) {
            return Some(work_dir.join(name));
        }
    }
    None
}

#[cfg(test)]
#[path = "output_resolver_tests.rs"]
mod tests;
