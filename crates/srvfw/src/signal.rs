// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal handling for the SetSigHandler stage.
//!
//! Interrupt and terminate request an admin stop; every other signal is
//! left at its default so session or shell signals do not take the
//! process down while it runs under a service host.

use cqc_core::ExitCode;
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::ShutdownHandle;

/// Handle to the installed signal watcher; abort on removal.
pub struct SignalGuard {
    join: JoinHandle<()>,
}

impl SignalGuard {
    /// Remove the handler.
    pub fn remove(self) {
        self.join.abort();
    }
}

/// Install the framework signal handler.
#[cfg(unix)]
pub fn install(handle: ShutdownHandle) -> std::io::Result<SignalGuard> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let join = tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("interrupt received, requesting shutdown"),
            _ = terminate.recv() => info!("terminate received, requesting shutdown"),
        }
        handle.shutdown(ExitCode::AdminStop);
    });

    Ok(SignalGuard { join })
}

#[cfg(not(unix))]
pub fn install(handle: ShutdownHandle) -> std::io::Result<SignalGuard> {
    let join = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, requesting shutdown");
            handle.shutdown(ExitCode::AdminStop);
        }
    });

    Ok(SignalGuard { join })
}
