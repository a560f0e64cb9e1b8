// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use chrono::{Local, TimeZone};
use cqc_core::InstallVersion;
use tempfile::tempdir;

use super::*;
use crate::progress::ProgressCell;

#[test]
fn recovery_name_carries_stamp_and_version() {
    let when = Local.with_ymd_and_hms(2026, 7, 4, 9, 30, 5).unwrap();
    assert_eq!(
        recovery_dir_name(InstallVersion::new(5, 4, 917), when),
        "CQCBackup-20260704_093005-5_4_917"
    );
}

#[test]
fn upgrade_swap_saves_the_old_tree_and_installs_the_new() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("CQC");
    let staging = dir.path().join("NewInst");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("old.txt"), b"old").unwrap();
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("new.txt"), b"new").unwrap();

    let progress = ProgressCell::new();
    let result = swap(
        &target,
        &staging,
        Some(InstallVersion::new(5, 4, 917)),
        Duration::ZERO,
        &progress,
    )
    .unwrap();

    let recovery = result.recovery_path.unwrap();
    assert!(recovery.file_name().unwrap().to_string_lossy().starts_with("CQCBackup-"));
    assert!(recovery.join("old.txt").exists(), "old tree saved under recovery name");
    assert!(target.join("new.txt").exists(), "staged tree took the canonical path");
    assert!(!staging.exists(), "staging was renamed away");
}

#[test]
fn clean_install_swap_has_no_recovery_tree() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("CQC");
    let staging = dir.path().join("NewInst");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("new.txt"), b"new").unwrap();

    let progress = ProgressCell::new();
    let result = swap(&target, &staging, None, Duration::ZERO, &progress).unwrap();

    assert!(result.recovery_path.is_none());
    assert!(target.join("new.txt").exists());
}

#[test]
fn failed_second_rename_restores_the_old_tree() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("CQC");
    let staging = dir.path().join("NewInst");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("old.txt"), b"old").unwrap();
    // Staging never created: the second rename must fail

    let progress = ProgressCell::new();
    let err = swap(
        &target,
        &staging,
        Some(InstallVersion::new(5, 4, 917)),
        Duration::ZERO,
        &progress,
    )
    .unwrap_err();
    drop(err);

    assert!(target.join("old.txt").exists(), "old tree restored to canonical path");
    assert_eq!(progress.snapshot().0, crate::progress::InstallStep::Recovering);
}
