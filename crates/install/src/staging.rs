// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembly of the new install tree in a staging directory.
//!
//! The source image is enumerated into paths relative to its root, each
//! file is copied into the equivalent spot under the staging tree, and
//! every copy is verified against the source by size and modification
//! time. Any mismatch fails the whole operation with the path named.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::installer::InstallError;
use crate::progress::{InstallStep, ProgressCell};

/// Staging directory name, a sibling of the canonical install path.
pub const STAGING_DIR: &str = "NewInst";

/// Subtrees of the image that are copied recursively.
pub const RECURSE_TREES: [&str; 2] = ["CQCData", "Bin"];

/// Subtree that is never carried over; its content is re-fetched on
/// demand after an upgrade.
pub const EXCLUDED_SUBTREE: &str = "Client/Data/MediaCache";

/// How often the copy publishes a progress fraction.
const PROGRESS_EVERY: usize = 20;

/// Create the staging directory, clearing leftovers from a prior failed
/// attempt so every run starts from the same empty state.
pub fn prepare_staging_dir(staging: &Path) -> Result<(), InstallError> {
    if staging.exists() {
        info!(staging = %staging.display(), "clearing staging left from a prior attempt");
        std::fs::remove_dir_all(staging).map_err(|e| InstallError::io(staging.into(), e))?;
    }
    std::fs::create_dir_all(staging).map_err(|e| InstallError::io(staging.into(), e))
}

/// Enumerate the source image: the two designated subtrees recursively,
/// top-level files non-recursively, minus the excluded subtree. Paths
/// come back relative to the image root.
pub fn enumerate_image(src: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let mut files = Vec::new();

    let entries = std::fs::read_dir(src).map_err(|e| InstallError::io(src.into(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(src.into(), e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(PathBuf::from(entry.file_name()));
        }
    }

    for tree in RECURSE_TREES {
        let root = src.join(tree);
        if root.is_dir() {
            walk(src, &root, &mut files)?;
        }
    }

    Ok(files)
}

fn walk(base: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), InstallError> {
    if dir.ends_with(EXCLUDED_SUBTREE) {
        debug!(dir = %dir.display(), "skipping excluded subtree");
        return Ok(());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| InstallError::io(dir.into(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(dir.into(), e))?;
        let path = entry.path();
        if path.is_dir() {
            walk(base, &path, files)?;
        } else if path.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                files.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}

/// Verify a staged file against its source: it must exist with the same
/// size and modification time. Catches sources changing underneath the
/// copy as well as copies that silently lost data.
pub fn verify_copy(src: &Path, dst: &Path) -> Result<(), InstallError> {
    let src_meta = std::fs::metadata(src).map_err(|e| InstallError::io(src.into(), e))?;
    let Ok(dst_meta) = std::fs::metadata(dst) else {
        return Err(InstallError::FileDiff { path: dst.into() });
    };

    let same_size = src_meta.len() == dst_meta.len();
    let same_mtime = match (src_meta.modified(), dst_meta.modified()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_size || !same_mtime {
        return Err(InstallError::FileDiff { path: dst.into() });
    }
    Ok(())
}

/// Copy one file, stamp the source's mtime onto it (a plain copy does
/// not carry it), then verify the copy took.
fn copy_verified(src: &Path, dst: &Path) -> Result<(), InstallError> {
    std::fs::copy(src, dst).map_err(|e| InstallError::io(dst.into(), e))?;

    let src_mtime = std::fs::metadata(src)
        .and_then(|m| m.modified())
        .map_err(|e| InstallError::io(src.into(), e))?;
    let target = std::fs::OpenOptions::new()
        .write(true)
        .open(dst)
        .map_err(|e| InstallError::io(dst.into(), e))?;
    target.set_modified(src_mtime).map_err(|e| InstallError::io(dst.into(), e))?;
    drop(target);

    verify_copy(src, dst)
}

/// Populate the staging tree from the image. Returns the file count.
pub fn stage(
    src: &Path,
    staging: &Path,
    progress: &ProgressCell,
) -> Result<usize, InstallError> {
    progress.enter(InstallStep::CreateStaging);
    prepare_staging_dir(staging)?;

    let files = enumerate_image(src)?;
    progress.enter(InstallStep::CopyFiles);
    let total = files.len();
    info!(total, image = %src.display(), "copying image into staging");

    let base = InstallStep::CopyFiles.base_percent() as f32;
    let span = InstallStep::SwapDirs.base_percent() as f32 - base;

    for (index, rel) in files.iter().enumerate() {
        let from = src.join(rel);
        let to = staging.join(rel);
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallError::io(parent.into(), e))?;
        }
        copy_verified(&from, &to)?;

        if index % PROGRESS_EVERY == 0 && total > 0 {
            let frac = index as f32 / total as f32;
            progress.set_percent((base + span * frac) as u8);
        }
    }

    Ok(total)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
