// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn prefers_the_conventional_out_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("water.out"), "").unwrap();
    std::fs::write(dir.path().join("water.log"), "").unwrap();
    let found = resolve_primary_output(dir.path(), "water").unwrap();
    assert_eq!(found.file_name().unwrap(), "water.out");
}

#[test]
fn falls_back_to_orca_log_suffix() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("water_orca.log"), "").unwrap();
    let found = resolve_primary_output(dir.path(), "water").unwrap();
    assert_eq!(found.file_name().unwrap(), "water_orca.log");
}

#[test]
fn falls_back_to_scanning_the_directory_for_a_differently_named_out_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("renamed.out"), "").unwrap();
    let found = resolve_primary_output(dir.path(), "water").unwrap();
    assert_eq!(found.file_name().unwrap(), "renamed.out");
}

#[test]
fn directory_scan_prefers_out_over_log_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.log"), "").unwrap();
    std::fs::write(dir.path().join("a.out"), "").unwrap();
    let found = resolve_primary_output(dir.path(), "water").unwrap();
    assert_eq!(found.file_name().unwrap(), "a.out");
}

#[test]
fn returns_none_when_nothing_matches() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("unrelated.txt"), "").unwrap();
    assert!(resolve_primary_output(dir.path(), "water").is_none());
}
