// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server lifecycle stages and per-stage step results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One position in the fixed startup sequence.
///
/// Startup walks the cursor from `Start` up to `Ready`; shutdown walks it
/// back down, running the cleanup action for each stage that was reached.
/// The derive order is the startup order, so `Ord` compares lifecycle
/// progress directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Start,
    LoadEnv,
    CreateEvent,
    SetSigHandler,
    InitClientTransport,
    InstallLogger,
    ParseParams,
    MakeDirs,
    LogIn,
    InitServerTransport,
    LoadConfig,
    WaitPrereqs,
    PreRegInit,
    RegSrvObjects,
    StartWorkers,
    PreBindInit,
    StartRebinder,
    EnableEvents,
    Ready,
}

impl Stage {
    /// All stages in startup order.
    pub const ALL: [Stage; 19] = [
        Stage::Start,
        Stage::LoadEnv,
        Stage::CreateEvent,
        Stage::SetSigHandler,
        Stage::InitClientTransport,
        Stage::InstallLogger,
        Stage::ParseParams,
        Stage::MakeDirs,
        Stage::LogIn,
        Stage::InitServerTransport,
        Stage::LoadConfig,
        Stage::WaitPrereqs,
        Stage::PreRegInit,
        Stage::RegSrvObjects,
        Stage::StartWorkers,
        Stage::PreBindInit,
        Stage::StartRebinder,
        Stage::EnableEvents,
        Stage::Ready,
    ];

    /// The next stage in startup order, or `None` from `Ready`.
    pub fn next(self) -> Option<Stage> {
        let idx = self.index() as usize;
        Stage::ALL.get(idx + 1).copied()
    }

    /// The previous stage in startup order, or `None` from `Start`.
    pub fn prev(self) -> Option<Stage> {
        let idx = self.index() as usize;
        idx.checked_sub(1).and_then(|i| Stage::ALL.get(i).copied())
    }

    /// Position in the startup order, suitable for an atomic cell.
    pub fn index(self) -> u8 {
        // ALL is derive-order, so a linear scan is exact
        Stage::ALL
            .iter()
            .position(|s| *s == self)
            .map(|i| i as u8)
            .unwrap_or(0)
    }

    /// Inverse of [`Stage::index`].
    pub fn from_index(idx: u8) -> Option<Stage> {
        Stage::ALL.get(idx as usize).copied()
    }

    /// Human label used in status output and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Start => "Starting",
            Stage::LoadEnv => "Load environmental info",
            Stage::CreateEvent => "Create termination event",
            Stage::SetSigHandler => "Register signal handler",
            Stage::InitClientTransport => "Init client side transport",
            Stage::InstallLogger => "Install logger",
            Stage::ParseParams => "Parse parameters",
            Stage::MakeDirs => "Make directories",
            Stage::LogIn => "Log in",
            Stage::InitServerTransport => "Init server side transport",
            Stage::LoadConfig => "Load configuration",
            Stage::WaitPrereqs => "Wait for prerequisites",
            Stage::PreRegInit => "Pre-object registration init",
            Stage::RegSrvObjects => "Register server objects",
            Stage::StartWorkers => "Start worker tasks",
            Stage::PreBindInit => "Pre-object binding init",
            Stage::StartRebinder => "Start rebinder",
            Stage::EnableEvents => "Enable event processing",
            Stage::Ready => "Ready",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Result of one stage step.
///
/// `Retry` keeps the cursor on the same stage; the wait is clamped by the
/// engine to its allowed range before sleeping. `Failed` aborts startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Retry { wait: Duration },
    Failed,
}

impl StageOutcome {
    /// Retry after the given wait.
    pub fn retry_in(wait: Duration) -> StageOutcome {
        StageOutcome::Retry { wait }
    }

    /// Retry with the engine's default wait.
    pub fn retry() -> StageOutcome {
        StageOutcome::Retry { wait: Duration::ZERO }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
