// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event processing control seam for the EnableEvents stage.
//!
//! The platform event system is a separate subsystem; the engine only
//! starts and stops a server's participation in it.

use async_trait::async_trait;
use tracing::debug;

use crate::hooks::StageError;
use crate::login::SecToken;

/// Which event directions a server participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDirs {
    pub receive: bool,
    pub send: bool,
}

/// Start/stop control over a server's event processing.
#[async_trait]
pub trait EventControl: Send + Sync {
    async fn start(&self, dirs: EventDirs, token: Option<&SecToken>) -> Result<(), StageError>;

    async fn stop(&self);
}

/// Event control for servers outside the event subsystem.
pub struct NullEventControl;

#[async_trait]
impl EventControl for NullEventControl {
    async fn start(&self, dirs: EventDirs, _token: Option<&SecToken>) -> Result<(), StageError> {
        debug!(receive = dirs.receive, send = dirs.send, "event processing not wired on this host");
        Ok(())
    }

    async fn stop(&self) {}
}
