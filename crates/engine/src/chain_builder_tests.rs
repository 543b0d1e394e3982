// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const OPTIMIZE_OUTPUT: &str = "\
some preamble
CARTESIAN COORDINATES (ANGSTROEM)
O      0.000000    0.000000    0.115000
H      0.000000    0.770000   -0.460000
H      0.000000   -0.770000   -0.460000

ORCA TERMINATED NORMALLY
";

#[test]
fn builds_a_frequency_job_from_the_last_coordinate_block() {
    let dir = tempfile::tempdir().unwrap();

    let builder = ChainBuilder::new(OrcaConfig::builder().build());
    let (job, deck) = builder
        .build_frequency_job(OPTIMIZE_OUTPUT, dir.path().join("water_freq.inp"), 1_700_000_000_000)
        .unwrap();

    assert_eq!(job.kind, JobKind::Frequency);
    assert!(job.is_queued());
    assert_eq!(job.xyz_path, PathBuf::new());
    assert!(deck.contains(" Freq"));
    assert!(deck.contains("O "));
    assert!(deck.contains("0.115000"));
}

#[test]
fn errors_when_no_coordinate_block_is_present() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ChainBuilder::new(OrcaConfig::builder().build());
    let result = builder.build_frequency_job("no markers here", dir.path().join("out.inp"), 0);
    assert!(result.is_err());
}

#[test]
fn solvent_keyword_is_rendered_when_a_model_is_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = OrcaConfig::builder()
        .solvent_model(orca_core::SolventModel::Cpcm)
        .solvent_name("water")
        .build();
    let builder = ChainBuilder::new(config);
    let (_, deck) = builder
        .build_frequency_job(OPTIMIZE_OUTPUT, dir.path().join("water_freq.inp"), 0)
        .unwrap();
    assert!(deck.contains("CPCM(Water)"));
}
