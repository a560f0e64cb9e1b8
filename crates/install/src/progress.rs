// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared progress state between the install engine and its observer.
//!
//! The engine writes; a GUI or test harness polls. Nothing blocks on
//! the observer.

use parking_lot::Mutex;
use tracing::info;

/// The installation steps, in order. Each maps to a base percentage so
/// an observer can drive a meter; the file copy fills the gap between
/// its base and the swap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    Start,
    Validate,
    CheckTarget,
    StopGuiApps,
    StopServices,
    CreateStaging,
    CopyFiles,
    SwapDirs,
    WriteVersion,
    Recovering,
    Complete,
}

impl InstallStep {
    /// Meter position when the step begins.
    pub fn base_percent(self) -> u8 {
        match self {
            InstallStep::Start => 0,
            InstallStep::Validate => 2,
            InstallStep::CheckTarget => 5,
            InstallStep::StopGuiApps => 8,
            InstallStep::StopServices => 12,
            InstallStep::CreateStaging => 15,
            InstallStep::CopyFiles => 20,
            InstallStep::SwapDirs => 80,
            InstallStep::WriteVersion => 90,
            InstallStep::Recovering => 95,
            InstallStep::Complete => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InstallStep::Start => "Starting installation",
            InstallStep::Validate => "Validating installation plan",
            InstallStep::CheckTarget => "Checking install target",
            InstallStep::StopGuiApps => "Closing client applications",
            InstallStep::StopServices => "Stopping services",
            InstallStep::CreateStaging => "Creating staging directory",
            InstallStep::CopyFiles => "Copying files",
            InstallStep::SwapDirs => "Swapping in new directory",
            InstallStep::WriteVersion => "Writing version info",
            InstallStep::Recovering => "Installation failed, recovering",
            InstallStep::Complete => "Installation is complete",
        }
    }
}

/// The cell the observer polls: current step and a 0..100 percent.
pub struct ProgressCell {
    state: Mutex<(InstallStep, u8)>,
}

impl Default for ProgressCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCell {
    pub fn new() -> Self {
        Self { state: Mutex::new((InstallStep::Start, 0)) }
    }

    /// Enter a step; the percent snaps to the step's base.
    pub fn enter(&self, step: InstallStep) {
        info!("{}", step.label());
        *self.state.lock() = (step, step.base_percent());
    }

    /// Publish a within-step percentage (clamped to 100).
    pub fn set_percent(&self, percent: u8) {
        self.state.lock().1 = percent.min(100);
    }

    pub fn snapshot(&self) -> (InstallStep, u8) {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_and_percentages_advance_monotonically() {
        let steps = [
            InstallStep::Start,
            InstallStep::Validate,
            InstallStep::CheckTarget,
            InstallStep::StopGuiApps,
            InstallStep::StopServices,
            InstallStep::CreateStaging,
            InstallStep::CopyFiles,
            InstallStep::SwapDirs,
            InstallStep::WriteVersion,
            InstallStep::Complete,
        ];
        for pair in steps.windows(2) {
            assert!(pair[0].base_percent() < pair[1].base_percent());
        }
    }

    #[test]
    fn cell_tracks_step_and_percent() {
        let cell = ProgressCell::new();
        assert_eq!(cell.snapshot(), (InstallStep::Start, 0));

        cell.enter(InstallStep::CopyFiles);
        assert_eq!(cell.snapshot(), (InstallStep::CopyFiles, 20));

        cell.set_percent(47);
        assert_eq!(cell.snapshot(), (InstallStep::CopyFiles, 47));

        cell.set_percent(200);
        assert_eq!(cell.snapshot().1, 100);
    }
}
