// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extension points a derived server plugs into the lifecycle engine.

use std::fmt;

use async_trait::async_trait;
use cqc_core::StageOutcome;
use tracing::info;

use crate::engine::ShutdownHandle;
use crate::nameservice::NameService;
use crate::registry::ObjectRegistry;
use crate::term_event::TerminationEvent;

/// Error escaping a stage hook. The engine converts it to a failed
/// startup (or logs and continues, for cleanup hooks).
#[derive(Debug)]
pub struct StageError(Box<dyn std::error::Error + Send + Sync>);

impl StageError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<String> for StageError {
    fn from(message: String) -> Self {
        Self(message.into())
    }
}

impl From<&str> for StageError {
    fn from(message: &str) -> Self {
        Self(message.to_string().into())
    }
}

/// Retry bookkeeping handed to retryable hooks: how many times this
/// stage has already been retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryInfo {
    pub count: u32,
}

/// Identity of the admin control endpoint, supplied by the derived
/// server. The binding may contain a `%(h)` token which is replaced by
/// the local host name at registration. At most four extras are kept.
#[derive(Debug, Clone)]
pub struct AdminInfo {
    pub binding: String,
    pub descr: String,
    pub extras: Vec<String>,
}

impl AdminInfo {
    pub fn new(binding: impl Into<String>, descr: impl Into<String>) -> Self {
        Self { binding: binding.into(), descr: descr.into(), extras: Vec::new() }
    }

    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self.extras.truncate(4);
        self
    }
}

/// The derived server. The engine owns the app and calls each hook at
/// its stage, on the control task, never while holding an internal lock.
/// Everything except `query_admin_info` has a default.
#[async_trait]
pub trait ServerApp: Send {
    /// Consume CLI parameters the framework did not recognize, as
    /// ordered key/value pairs.
    async fn parse_params(
        &mut self,
        params: &[(String, String)],
    ) -> Result<StageOutcome, StageError> {
        if !params.is_empty() {
            let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
            info!("ignoring unhandled parameters: {}", keys.join(" "));
        }
        Ok(StageOutcome::Success)
    }

    /// Create any per-server directories.
    async fn make_dirs(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Load persisted configuration. May ask for a retry.
    async fn load_config(&mut self, _retry: RetryInfo) -> Result<StageOutcome, StageError> {
        Ok(StageOutcome::Success)
    }

    /// Block until peer services are reachable. May ask for a retry.
    async fn wait_prereqs(&mut self, _retry: RetryInfo) -> Result<StageOutcome, StageError> {
        Ok(StageOutcome::Success)
    }

    /// One-shot init before server objects are registered.
    async fn pre_reg_init(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Register service-specific remote objects.
    async fn register_objects(&mut self, _registry: &ObjectRegistry) -> Result<(), StageError> {
        Ok(())
    }

    /// Start per-service worker tasks.
    async fn start_workers(&mut self, _shutdown: &ShutdownHandle) -> Result<(), StageError> {
        Ok(())
    }

    /// Final init before the server goes public.
    async fn pre_bind_init(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Identity for the admin control endpoint. Required.
    fn query_admin_info(&self) -> AdminInfo;

    /// Block on the termination event once Ready. Overrides that do
    /// periodic work must still honor the event within 250 ms.
    async fn wait_for_term(&mut self, event: &TerminationEvent) {
        event.wait().await;
    }

    /// Persist configuration (cleanup dual of `load_config`).
    async fn store_config(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Stop worker tasks (cleanup dual of `start_workers`).
    async fn stop_workers(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Remove service-specific name-service bindings.
    async fn unbind_objects(&mut self, _ns: &dyn NameService) -> Result<(), StageError> {
        Ok(())
    }

    /// Deregister service-specific remote objects.
    async fn deregister_objects(&mut self, _registry: &ObjectRegistry) -> Result<(), StageError> {
        Ok(())
    }

    /// Termination work after bindings are removed.
    async fn post_unbind_term(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Termination work after objects are deregistered.
    async fn post_dereg_term(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}
