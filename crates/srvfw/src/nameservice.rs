// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client seam to the platform name service.
//!
//! The name service itself is a separate daemon; servers only ever talk
//! to it through this trait, always with an explicit deadline so cleanup
//! cannot hang on an unreachable peer.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Deadline for binding removal during cleanup.
pub const CLEANUP_DEADLINE: Duration = Duration::from_millis(2500);

#[derive(Debug, Error)]
pub enum NsError {
    #[error("Name service unreachable: {0}")]
    Unreachable(String),

    #[error("Name service call timed out")]
    Timeout,

    #[error("Name service rejected the request: {0}")]
    Rejected(String),
}

/// Name service client operations used by the framework.
#[async_trait]
pub trait NameService: Send + Sync {
    /// Register or re-assert a binding.
    async fn bind(
        &self,
        binding: &str,
        descr: &str,
        extras: &[String],
        deadline: Duration,
    ) -> Result<(), NsError>;

    /// Remove a binding.
    async fn remove(&self, binding: &str, deadline: Duration) -> Result<(), NsError>;
}

/// Name service used by standalone servers with no name server on the
/// host. Accepts everything; peers find the server by host and port.
pub struct NullNameService;

#[async_trait]
impl NameService for NullNameService {
    async fn bind(
        &self,
        binding: &str,
        _descr: &str,
        _extras: &[String],
        _deadline: Duration,
    ) -> Result<(), NsError> {
        debug!(binding, "no name service configured, binding not published");
        Ok(())
    }

    async fn remove(&self, binding: &str, _deadline: Duration) -> Result<(), NsError> {
        debug!(binding, "no name service configured, nothing to remove");
        Ok(())
    }
}
