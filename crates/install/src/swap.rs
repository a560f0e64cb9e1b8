// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two-rename swap that puts the staged tree in place.
//!
//! The previous tree moves aside to a timestamped recovery name, then
//! the staging tree takes the canonical path. The window between the
//! renames is only safe because the pre-steps stopped every server and
//! client app; on a late failure the recovery tree is moved back
//! best-effort and the staging tree is left for the next attempt.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use cqc_core::InstallVersion;
use tracing::{info, warn};

use crate::installer::InstallError;
use crate::progress::{InstallStep, ProgressCell};

/// Pause before the renames so filesystem observers (virus scanners,
/// indexers) can let go of the trees.
pub const SETTLE_PAUSE: Duration = Duration::from_secs(4);

const RENAME_ATTEMPTS: u32 = 3;
const RENAME_RETRY_WAIT: Duration = Duration::from_millis(250);

/// Recovery directory name: `CQCBackup-YYYYMMDD_HHMMSS-Maj_Min_Rev`.
pub fn recovery_dir_name(old: InstallVersion, now: DateTime<Local>) -> String {
    format!("CQCBackup-{}-{}", now.format("%Y%m%d_%H%M%S"), old.underscored())
}

/// Rename with a few retries; transient sharing violations from
/// scanners clear quickly.
fn rename_with_retry(from: &Path, to: &Path) -> Result<(), InstallError> {
    let mut last = None;
    for attempt in 0..RENAME_ATTEMPTS {
        match std::fs::rename(from, to) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    from = %from.display(),
                    to = %to.display(),
                    attempt,
                    "rename failed: {}",
                    e
                );
                last = Some(e);
                std::thread::sleep(RENAME_RETRY_WAIT);
            }
        }
    }
    Err(InstallError::io(from.into(), last.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "rename failed")
    })))
}

/// Result of a successful swap.
#[derive(Debug)]
pub struct SwapResult {
    /// Where the previous tree went, when there was one.
    pub recovery_path: Option<PathBuf>,
}

/// Swap the staged tree into the canonical path.
pub fn swap(
    target: &Path,
    staging: &Path,
    old_version: Option<InstallVersion>,
    settle: Duration,
    progress: &ProgressCell,
) -> Result<SwapResult, InstallError> {
    progress.enter(InstallStep::SwapDirs);
    std::thread::sleep(settle);

    let recovery_path = if target.exists() {
        let old = old_version.unwrap_or_default();
        let name = recovery_dir_name(old, Local::now());
        let recovery = target
            .parent()
            .map(|p| p.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name));
        info!(recovery = %recovery.display(), "saving previous tree");
        rename_with_retry(target, &recovery)?;
        Some(recovery)
    } else {
        None
    };

    if let Err(e) = rename_with_retry(staging, target) {
        progress.enter(InstallStep::Recovering);
        if let Some(recovery) = &recovery_path {
            if let Err(undo) = std::fs::rename(recovery, target) {
                warn!(
                    recovery = %recovery.display(),
                    "could not restore previous tree: {}",
                    undo
                );
            }
        }
        return Err(e);
    }

    Ok(SwapResult { recovery_path })
}

#[cfg(test)]
#[path = "swap_tests.rs"]
mod tests;
