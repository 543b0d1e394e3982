// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies a finished ORCA output file as success, fatal, recoverable, or
//! incomplete, by scanning its text for known termination markers.
//!
//! Decision order matters: the first matching rule wins. A normal-termination
//! banner always wins even if an unrelated warning elsewhere in the file also
//! matches a fatal or recoverable pattern (ORCA logs plenty of both in a
//! successful run).

const NORMAL_TERMINATION: &str = "ORCA TERMINATED NORMALLY";

const FATAL_PATTERNS: &[&str] = &[
    "Unknown basis set",
    "Unknown method",
    "Unknown functional",
    "Unknown key",
    "Syntax error",
    "Cannot find executable",
    "License error",
    "Out of memory",
    "Disk full",
    "Permission denied",
    "ABORTING THE RUN",
    "FATAL ERROR",
];

const RECOVERABLE_PATTERNS: &[&str] = &[
    "SCF NOT CONVERGED",
    "CONVERGENCE NOT REACHED",
    "OPTIMIZATION FAILED",
    "GEOMETRY OPTIMIZATION FAILED",
    "SYMMETRY PROBLEMS",
    "ENERGY TOO HIGH",
    "NEGATIVE FREQUENCIES",
    "MAXIMUM NUMBER OF CYCLES REACHED",
    "SCF CONVERGENCE FAILURE",
];

/// Per-attempt classification of a solver run. Distinct from
/// [`orca_core::TerminalOutcome`]: `Incomplete` is a transient signal that
/// drives the scheduler's retry loop rather than a disposition that ever
/// gets persisted on a job record (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierOutcome {
    Success,
    Fatal,
    Recoverable,
    Incomplete,
}

impl ClassifierOutcome {
    /// Maps a (possibly retries-exhausted) attempt outcome onto the
    /// three-way disposition that gets persisted on the job record.
    /// `Incomplete` degrades to `Recoverable`; the other three pass through.
    pub fn as_terminal(self) -> orca_core::TerminalOutcome {
        match self {
            ClassifierOutcome::Success => orca_core::TerminalOutcome::Success,
            ClassifierOutcome::Fatal => orca_core::TerminalOutcome::Fatal,
            ClassifierOutcome::Recoverable | ClassifierOutcome::Incomplete => {
                orca_core::TerminalOutcome::Recoverable
            }
        }
    }
}

/// Outcome of classifying an output file's text, alongside the diagnostic
/// message that explains it (absent only for a clean [`ClassifierOutcome::Success`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: ClassifierOutcome,
    pub message: Option<String>,
}

impl Classification {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self { outcome: ClassifierOutcome::Fatal, message: Some(message.into()) }
    }
}

/// Classify ORCA output text. Total: every input produces a classification,
/// falling back to `Incomplete` when no known marker is found (the job was
/// most likely interrupted before ORCA could finish writing its output).
pub fn classify(text: &str) -> Classification {
    if text.contains(NORMAL_TERMINATION) {
        return Classification { outcome: ClassifierOutcome::Success, message: None };
    }

    if let Some(pattern) = find_pattern(text, FATAL_PATTERNS) {
        return Classification {
            outcome: ClassifierOutcome::Fatal,
            message: Some(format!("Fatal error: {pattern}")),
        };
    }

    if let Some(pattern) = find_pattern(text, RECOVERABLE_PATTERNS) {
        return Classification {
            outcome: ClassifierOutcome::Recoverable,
            message: Some(format!("Recoverable error: {pattern}")),
        };
    }

    if contains_ignore_case(text, "ERROR") {
        return Classification {
            outcome: ClassifierOutcome::Recoverable,
            message: Some("Generic error (assumed recoverable)".to_string()),
        };
    }

    Classification {
        outcome: ClassifierOutcome::Incomplete,
        message: Some("No termination marker found (likely interrupted)".to_string()),
    }
}

fn find_pattern<'a>(text: &str, patterns: &[&'a str]) -> Option<&'a str> {
    patterns.iter().copied().find(|pattern| contains_ignore_case(text, pattern))
}

fn contains_ignore_case(text: &str, pattern: &str) -> bool {
    text.to_ascii_uppercase().contains(&pattern.to_ascii_uppercase())
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
