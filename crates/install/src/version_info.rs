// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The machine-readable version stamp in the canonical install root,
//! and upgrade eligibility checks against it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cqc_core::{Component, InstallVersion};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::installer::InstallError;

/// File name of the version stamp in the install root.
pub const INST_VER_FILE: &str = "CQCInstVersion.Info";

/// Oldest version an in-place upgrade can start from.
pub const MIN_UPGRADE_VERSION: InstallVersion = InstallVersion::new(5, 4, 917);

/// What the installer finds at the candidate target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// Nothing installed there.
    Clean,
    /// Same version already in place.
    Refresh,
    /// Same major.minor, newer revision.
    Revision,
    /// Older version that can be upgraded.
    Upgrade,
    /// Older than the minimum upgradeable version.
    BadOldVer,
    /// The target is newer than what is being installed.
    RetroVersion,
}

/// The stamp written after a successful install. Carries the previous
/// host setup so an upgrade can offer "use previous options".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionStamp {
    pub version: InstallVersion,
    #[serde(default)]
    pub components: BTreeSet<Component>,
    #[serde(default)]
    pub ports: BTreeMap<Component, u16>,
    #[serde(default)]
    pub installed_at: String,
}

/// Read the stamp from a target directory, if one is there.
pub fn read_stamp(target: &Path) -> Result<Option<VersionStamp>, InstallError> {
    let path = target.join(INST_VER_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| InstallError::io(path.clone(), e))?;
    match serde_json::from_str(&raw) {
        Ok(stamp) => Ok(Some(stamp)),
        Err(e) => {
            warn!(path = %path.display(), "version stamp is unreadable: {}", e);
            Err(InstallError::BadStamp { path })
        }
    }
}

/// Write the stamp into a target directory.
pub fn write_stamp(target: &Path, stamp: &VersionStamp) -> Result<(), InstallError> {
    let path = target.join(INST_VER_FILE);
    let raw = serde_json::to_string_pretty(stamp)
        .map_err(|e| InstallError::Internal(e.to_string()))?;
    std::fs::write(&path, raw).map_err(|e| InstallError::io(path, e))
}

/// Classify the target directory against the version being installed.
pub fn classify_target(
    target: &Path,
    installing: InstallVersion,
) -> Result<(TargetType, Option<VersionStamp>), InstallError> {
    let Some(stamp) = read_stamp(target)? else {
        info!(target = %target.display(), "no version stamp found, clean install");
        return Ok((TargetType::Clean, None));
    };

    let old = stamp.version;
    info!(%old, new = %installing, "found previous install");
    let kind = if old == installing {
        TargetType::Refresh
    } else if old > installing {
        TargetType::RetroVersion
    } else if old < MIN_UPGRADE_VERSION {
        TargetType::BadOldVer
    } else if old.maj == installing.maj && old.min == installing.min {
        TargetType::Revision
    } else {
        TargetType::Upgrade
    };
    Ok((kind, Some(stamp)))
}

/// Refuse the upgrades the engine cannot do.
pub fn check_eligibility(
    kind: TargetType,
    old: Option<&VersionStamp>,
    installing: InstallVersion,
) -> Result<(), InstallError> {
    match kind {
        TargetType::BadOldVer => Err(InstallError::TooOld {
            found: old.map(|s| s.version).unwrap_or_default(),
            min: MIN_UPGRADE_VERSION,
        }),
        TargetType::RetroVersion => Err(InstallError::RetroVersion {
            found: old.map(|s| s.version).unwrap_or_default(),
            installing,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "version_info_tests.rs"]
mod tests;
