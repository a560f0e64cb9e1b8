// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The install engine: validation, pre-steps, staging, swap, stamp.
//!
//! Fully headless; the embedding surface (GUI wizard or a command line
//! tool) polls the progress cell from another thread and collects the
//! warning queue afterwards.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use cqc_core::InstallVersion;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::plan::{InstallPlan, PlanError};
use crate::presteps::{
    close_gui_apps, stop_services, AppControl, NullAppControl, NullServiceControl,
    ServiceControl, CLOSE_SETTLE, CLOSE_WAIT, SERVICE_STOP_TIMEOUT,
};
use crate::progress::{InstallStep, ProgressCell};
use crate::staging::{stage, STAGING_DIR};
use crate::swap::{swap, SETTLE_PAUSE};
use crate::validate::{probe_ports, validate_plan};
use crate::version_info::{
    check_eligibility, classify_target, write_stamp, TargetType, VersionStamp,
};

/// Cap on queued warnings.
const MAX_WARNINGS: usize = 64;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Plan rejected: {0}")]
    Plan(#[from] PlanError),

    #[error("Installed version {found} is older than the oldest upgradeable version {min}")]
    TooOld { found: InstallVersion, min: InstallVersion },

    #[error("Installed version {found} is newer than {installing}; refusing retro-version install")]
    RetroVersion { found: InstallVersion, installing: InstallVersion },

    #[error("Unreadable version stamp at {}", path.display())]
    BadStamp { path: PathBuf },

    #[error("Copied file differs from its source: {}", path.display())]
    FileDiff { path: PathBuf },

    #[error("Could not stop service {service}: {reason}")]
    ServiceStop { service: String, reason: String },

    #[error("IO error at {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("{0}")]
    Internal(String),
}

impl InstallError {
    pub(crate) fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io { path, source }
    }
}

/// Waits the engine observes; tests shrink them to zero.
#[derive(Debug, Clone, Copy)]
pub struct InstallerTiming {
    pub close_wait: Duration,
    pub close_settle: Duration,
    pub service_timeout: Duration,
    pub swap_settle: Duration,
}

impl Default for InstallerTiming {
    fn default() -> Self {
        Self {
            close_wait: CLOSE_WAIT,
            close_settle: CLOSE_SETTLE,
            service_timeout: SERVICE_STOP_TIMEOUT,
            swap_settle: SETTLE_PAUSE,
        }
    }
}

impl InstallerTiming {
    /// No waiting at all, for tests and scripted installs.
    pub fn immediate() -> Self {
        Self {
            close_wait: Duration::ZERO,
            close_settle: Duration::ZERO,
            service_timeout: Duration::ZERO,
            swap_settle: Duration::ZERO,
        }
    }
}

/// What a finished install reports back.
#[derive(Debug)]
pub struct InstallOutcome {
    pub target_type: TargetType,
    pub files_copied: usize,
    pub recovery_path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// One installation run over one plan.
pub struct Installer {
    plan: InstallPlan,
    progress: Arc<ProgressCell>,
    warnings: Mutex<Vec<String>>,
    timing: InstallerTiming,
    apps: Box<dyn AppControl>,
    services: Box<dyn ServiceControl>,
}

impl Installer {
    pub fn new(plan: InstallPlan) -> Self {
        Self {
            plan,
            progress: Arc::new(ProgressCell::new()),
            warnings: Mutex::new(Vec::new()),
            timing: InstallerTiming::default(),
            apps: Box::new(NullAppControl),
            services: Box::new(NullServiceControl),
        }
    }

    pub fn with_timing(mut self, timing: InstallerTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_app_control(mut self, apps: Box<dyn AppControl>) -> Self {
        self.apps = apps;
        self
    }

    pub fn with_service_control(mut self, services: Box<dyn ServiceControl>) -> Self {
        self.services = services;
        self
    }

    /// The cell a GUI polls while `run` executes on a worker thread.
    pub fn progress(&self) -> Arc<ProgressCell> {
        Arc::clone(&self.progress)
    }

    pub fn queue_warning(&self, warning: impl Into<String>) {
        let mut warnings = self.warnings.lock();
        if warnings.len() < MAX_WARNINGS {
            warnings.push(warning.into());
        }
    }

    /// Run the whole installation. Validation failures leave the
    /// filesystem untouched; staging failures leave the staging tree
    /// for the next attempt; swap failures restore the previous tree.
    pub fn run(&self) -> Result<InstallOutcome, InstallError> {
        self.progress.enter(InstallStep::Start);

        // Rules first: nothing on disk moves for a bad plan.
        self.progress.enter(InstallStep::Validate);
        validate_plan(&self.plan)?;
        probe_ports(&self.plan)?;

        self.progress.enter(InstallStep::CheckTarget);
        let (target_type, old_stamp) =
            classify_target(&self.plan.target_path, self.plan.version)?;
        check_eligibility(target_type, old_stamp.as_ref(), self.plan.version)?;

        self.progress.enter(InstallStep::StopGuiApps);
        for app in close_gui_apps(
            self.apps.as_ref(),
            self.timing.close_wait,
            self.timing.close_settle,
        ) {
            self.queue_warning(format!("{app} did not close; it may hold files open"));
        }

        self.progress.enter(InstallStep::StopServices);
        stop_services(self.services.as_ref(), self.timing.service_timeout)?;

        let staging = self.staging_path();
        let files_copied = stage(&self.plan.src_image, &staging, &self.progress)?;

        let old_version = old_stamp.as_ref().map(|s| s.version);
        let swapped = swap(
            &self.plan.target_path,
            &staging,
            old_version,
            self.timing.swap_settle,
            &self.progress,
        )?;

        self.progress.enter(InstallStep::WriteVersion);
        let stamp = VersionStamp {
            version: self.plan.version,
            components: self.plan.components.clone(),
            ports: self.plan.ports.clone(),
            installed_at: Local::now().to_rfc3339(),
        };
        if let Err(e) = write_stamp(&self.plan.target_path, &stamp) {
            // The tree is in place; a missing stamp only degrades the
            // next upgrade to a manual target check.
            warn!("could not write version stamp: {}", e);
            self.queue_warning(format!("version stamp not written: {e}"));
        }

        self.progress.enter(InstallStep::Complete);
        info!(files = files_copied, "installation complete");

        Ok(InstallOutcome {
            target_type,
            files_copied,
            recovery_path: swapped.recovery_path,
            warnings: self.warnings.lock().clone(),
        })
    }

    /// Staging directory: a sibling of the canonical install path.
    pub fn staging_path(&self) -> PathBuf {
        self.plan
            .target_path
            .parent()
            .map(|p| p.join(STAGING_DIR))
            .unwrap_or_else(|| PathBuf::from(STAGING_DIR))
    }
}

#[cfg(test)]
#[path = "installer_tests.rs"]
mod tests;
