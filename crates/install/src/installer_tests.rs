// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use cqc_core::{Component, InstallVersion};
use tempfile::tempdir;

use super::*;
use crate::plan::InstallPlan;
use crate::version_info::{read_stamp, write_stamp, TargetType, VersionStamp};

fn write(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn build_image(root: &Path) {
    write(&root.join("ReleaseNotes.htm"), b"notes");
    write(&root.join("Bin/CQCServer.bin"), b"server");
    write(&root.join("CQCData/Local/config.dat"), b"cfg");
}

fn free_port() -> u16 {
    let probe = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);
    port
}

fn plan_at(root: &Path) -> InstallPlan {
    let mut plan = InstallPlan::new(
        root.join("CQC"),
        root.join("Image"),
        InstallVersion::new(6, 0, 1),
    );
    plan.enable(Component::WebServer, Some(free_port()));
    plan
}

#[test]
fn clean_install_end_to_end() {
    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let installer =
        Installer::new(plan_at(dir.path())).with_timing(InstallerTiming::immediate());
    let outcome = installer.run().unwrap();

    assert_eq!(outcome.target_type, TargetType::Clean);
    assert_eq!(outcome.files_copied, 3);
    assert!(outcome.recovery_path.is_none());

    let target = dir.path().join("CQC");
    assert!(target.join("Bin/CQCServer.bin").exists());
    let stamp = read_stamp(&target).unwrap().unwrap();
    assert_eq!(stamp.version, InstallVersion::new(6, 0, 1));
    assert!(stamp.components.contains(&Component::WebServer));

    assert_eq!(installer.progress().snapshot().0, InstallStep::Complete);
}

#[test]
fn upgrade_saves_recovery_and_replaces_the_tree() {
    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let target = dir.path().join("CQC");
    write(&target.join("Bin/OldServer.bin"), b"old");
    let old = VersionStamp {
        version: InstallVersion::new(5, 4, 917),
        components: Default::default(),
        ports: Default::default(),
        installed_at: String::new(),
    };
    write_stamp(&target, &old).unwrap();

    let installer =
        Installer::new(plan_at(dir.path())).with_timing(InstallerTiming::immediate());
    let outcome = installer.run().unwrap();

    assert_eq!(outcome.target_type, TargetType::Upgrade);
    let recovery = outcome.recovery_path.unwrap();
    assert!(recovery.join("Bin/OldServer.bin").exists());
    assert!(recovery
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("5_4_917"));
    assert!(target.join("Bin/CQCServer.bin").exists());
    assert!(!target.join("Bin/OldServer.bin").exists());
}

#[test]
fn plan_rejection_touches_nothing_on_disk() {
    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let mut plan = plan_at(dir.path());
    let port = *plan.ports.get(&Component::WebServer).unwrap();
    plan.enable(Component::DeviceHost, Some(port));

    let installer = Installer::new(plan).with_timing(InstallerTiming::immediate());
    let staging = installer.staging_path();
    let err = installer.run().unwrap_err();

    assert!(matches!(err, InstallError::Plan(_)));
    assert!(!staging.exists(), "no staging directory for a rejected plan");
    assert!(!dir.path().join("CQC").exists(), "target untouched");
}

#[test]
fn retro_version_is_refused_before_any_copying() {
    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let target = dir.path().join("CQC");
    std::fs::create_dir_all(&target).unwrap();
    let newer = VersionStamp {
        version: InstallVersion::new(7, 0, 0),
        components: Default::default(),
        ports: Default::default(),
        installed_at: String::new(),
    };
    write_stamp(&target, &newer).unwrap();

    let installer =
        Installer::new(plan_at(dir.path())).with_timing(InstallerTiming::immediate());
    let err = installer.run().unwrap_err();

    assert!(matches!(err, InstallError::RetroVersion { .. }));
    assert!(!installer.staging_path().exists());
    assert!(!target.join("Bin/CQCServer.bin").exists(), "old tree untouched");
}

#[test]
fn service_stop_failure_aborts_the_plan() {
    struct BrokenService;

    impl crate::presteps::ServiceControl for BrokenService {
        fn services(&self) -> Vec<String> {
            vec!["CQCAppShell".into()]
        }

        fn stop(&self, _s: &str, _t: std::time::Duration) -> Result<(), String> {
            Err("access denied".into())
        }
    }

    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let installer = Installer::new(plan_at(dir.path()))
        .with_timing(InstallerTiming::immediate())
        .with_service_control(Box::new(BrokenService));
    let err = installer.run().unwrap_err();

    assert!(matches!(err, InstallError::ServiceStop { .. }));
    assert!(!installer.staging_path().exists());
}

#[test]
fn failed_staging_leaves_staging_dir_and_canonical_tree() {
    let dir = tempdir().unwrap();
    // Image directory missing entirely: enumeration fails after the
    // staging dir was created
    let installer =
        Installer::new(plan_at(dir.path())).with_timing(InstallerTiming::immediate());
    let err = installer.run().unwrap_err();

    assert!(matches!(err, InstallError::Io { .. }));
    assert!(installer.staging_path().exists(), "staging left for the next attempt");
    assert!(!dir.path().join("CQC").exists(), "canonical path untouched");
}

#[test]
fn stubborn_gui_apps_become_warnings() {
    struct StuckApp;

    impl crate::presteps::AppControl for StuckApp {
        fn is_running(&self, app: &crate::presteps::GuiApp) -> bool {
            app.resource == "CQCTrayMon"
        }

        fn post_close(&self, _app: &crate::presteps::GuiApp) {}
    }

    let dir = tempdir().unwrap();
    build_image(&dir.path().join("Image"));

    let installer = Installer::new(plan_at(dir.path()))
        .with_timing(InstallerTiming::immediate())
        .with_app_control(Box::new(StuckApp));
    let outcome = installer.run().unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("Tray Monitor"));
}
