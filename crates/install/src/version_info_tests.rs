// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cqc_core::InstallVersion;
use tempfile::tempdir;
use yare::parameterized;

use super::*;

fn stamp(version: InstallVersion) -> VersionStamp {
    VersionStamp {
        version,
        components: Default::default(),
        ports: Default::default(),
        installed_at: "2026-01-01T00:00:00Z".into(),
    }
}

#[test]
fn stamp_round_trips_through_the_target_dir() {
    let dir = tempdir().unwrap();
    let original = stamp(InstallVersion::new(6, 0, 1));
    write_stamp(dir.path(), &original).unwrap();

    let back = read_stamp(dir.path()).unwrap().unwrap();
    assert_eq!(back.version, original.version);
    assert!(dir.path().join(INST_VER_FILE).exists());
}

#[test]
fn missing_stamp_reads_as_none() {
    let dir = tempdir().unwrap();
    assert!(read_stamp(dir.path()).unwrap().is_none());
}

#[test]
fn corrupt_stamp_is_an_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(INST_VER_FILE), b"not json at all").unwrap();
    match read_stamp(dir.path()) {
        Err(InstallError::BadStamp { .. }) => {}
        other => panic!("expected BadStamp, got {other:?}"),
    }
}

#[parameterized(
    clean = { None, TargetType::Clean },
    refresh = { Some(InstallVersion::new(6, 0, 1)), TargetType::Refresh },
    revision = { Some(InstallVersion::new(6, 0, 0)), TargetType::Revision },
    upgrade = { Some(InstallVersion::new(5, 4, 917)), TargetType::Upgrade },
    too_old = { Some(InstallVersion::new(5, 4, 0)), TargetType::BadOldVer },
    retro = { Some(InstallVersion::new(6, 1, 0)), TargetType::RetroVersion },
)]
fn classification(old: Option<InstallVersion>, expected: TargetType) {
    let dir = tempdir().unwrap();
    if let Some(old) = old {
        write_stamp(dir.path(), &stamp(old)).unwrap();
    }
    let (kind, _) = classify_target(dir.path(), InstallVersion::new(6, 0, 1)).unwrap();
    assert_eq!(kind, expected);
}

#[test]
fn too_old_and_retro_are_refused() {
    let old = stamp(InstallVersion::new(5, 3, 0));
    match check_eligibility(TargetType::BadOldVer, Some(&old), InstallVersion::new(6, 0, 1)) {
        Err(InstallError::TooOld { found, min }) => {
            assert_eq!(found, InstallVersion::new(5, 3, 0));
            assert_eq!(min, MIN_UPGRADE_VERSION);
        }
        other => panic!("expected TooOld, got {other:?}"),
    }

    let newer = stamp(InstallVersion::new(7, 0, 0));
    assert!(matches!(
        check_eligibility(TargetType::RetroVersion, Some(&newer), InstallVersion::new(6, 0, 1)),
        Err(InstallError::RetroVersion { .. })
    ));

    for ok in [TargetType::Clean, TargetType::Refresh, TargetType::Revision, TargetType::Upgrade] {
        assert!(check_eligibility(ok, None, InstallVersion::new(6, 0, 1)).is_ok());
    }
}
