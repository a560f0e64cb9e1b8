// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background task that keeps name-service bindings asserted.
//!
//! The name service may restart at any time; the rebinder re-registers
//! every binding on a fixed period so peers can always resolve a live
//! server. Failures are expected while the name service is down and are
//! only logged at debug.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::nameservice::NameService;

/// How often bindings are re-asserted.
pub const REBIND_INTERVAL: Duration = Duration::from_secs(15);

/// Deadline for a single bind call.
pub const BIND_DEADLINE: Duration = Duration::from_secs(5);

/// One binding the rebinder keeps alive.
#[derive(Debug, Clone)]
pub struct Binding {
    pub path: String,
    pub descr: String,
    pub extras: Vec<String>,
}

/// Running rebinder task.
pub struct Rebinder {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl Rebinder {
    /// Bind everything once, then re-assert on the interval.
    pub fn start(ns: Arc<dyn NameService>, bindings: Vec<Binding>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            loop {
                for binding in &bindings {
                    let result = ns
                        .bind(&binding.path, &binding.descr, &binding.extras, BIND_DEADLINE)
                        .await;
                    if let Err(e) = result {
                        debug!(binding = %binding.path, "rebind failed: {}", e);
                    }
                }
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        Self { cancel, join }
    }

    /// Stop re-asserting. Binding removal is the caller's business.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

#[cfg(test)]
#[path = "rebinder_tests.rs"]
mod tests;
