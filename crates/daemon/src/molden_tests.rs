// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn converts_every_gbw_file_found_in_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("water.gbw"), "").unwrap();
    std::fs::write(dir.path().join("water.out"), "").unwrap();

    let converter = MoldenConverter::new("true");
    converter.convert_all(dir.path());
}

#[test]
fn a_missing_converter_binary_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("water.gbw"), "").unwrap();

    let converter = MoldenConverter::new(dir.path().join("no-such-orca-2mkl"));
    converter.convert_all(dir.path());
}

#[test]
fn an_unreadable_directory_is_skipped_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let converter = MoldenConverter::new("true");
    converter.convert_all(&dir.path().join("does-not-exist"));
}
