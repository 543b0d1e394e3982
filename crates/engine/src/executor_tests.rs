// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn captures_stdout_into_a_stem_out_file() {
    let dir = tempfile::tempdir().unwrap();
    let inp_path = dir.path().join("water.inp");
    std::fs::write(&inp_path, "! B3LYP def2-SVP Opt\n").unwrap();

    let executor = Executor::new("echo");
    let out_path = executor.run(&inp_path, dir.path()).unwrap();

    assert_eq!(out_path, dir.path().join("water.out"));
    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert!(contents.contains("water.inp"));
}

#[test]
fn rejects_a_deck_path_with_no_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Executor::new("echo");
    let result = executor.run(Path::new("/"), dir.path());
    assert!(result.is_err());
}

#[test]
fn a_missing_orca_binary_surfaces_as_a_subprocess_error() {
    let dir = tempfile::tempdir().unwrap();
    let inp_path = dir.path().join("water.inp");
    std::fs::write(&inp_path, "deck").unwrap();

    let executor = Executor::new(dir.path().join("no-such-orca-binary"));
    let result = executor.run(&inp_path, dir.path());
    assert!(matches!(result, Err(EngineError::Subprocess(_))));
}
