// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The admin control endpoint registered on behalf of every server.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cqc_core::{Clock, ServerDescriptor, SystemClock};
use cqc_wire::{Request, Response, StatusInfo};
use tracing::info;

use crate::engine::ShutdownHandle;
use crate::hooks::AdminInfo;
use crate::registry::RemoteObject;

/// Registry name of the core admin object.
pub const CORE_ADMIN_OBJECT: &str = "CoreAdmin";

/// Replace any `%(h)` token in a binding template with the host name.
pub fn expand_binding(template: &str, host: &str) -> String {
    template.replace("%(h)", host)
}

/// Canonical name of the local host.
pub fn local_host_name() -> String {
    #[cfg(unix)]
    {
        if let Ok(name) = nix::unistd::gethostname() {
            if let Ok(name) = name.into_string() {
                if !name.is_empty() {
                    return name;
                }
            }
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

/// The core admin object. Supports AdminStop and the standard status
/// queries; everything else is for derived objects.
pub struct CoreAdmin<C: Clock = SystemClock> {
    name: String,
    descr: String,
    info: AdminInfo,
    handle: ShutdownHandle,
    clock: C,
    started: Instant,
}

impl CoreAdmin<SystemClock> {
    pub fn new(descriptor: &ServerDescriptor, info: AdminInfo, handle: ShutdownHandle) -> Self {
        Self::with_clock(descriptor, info, handle, SystemClock)
    }
}

impl<C: Clock> CoreAdmin<C> {
    pub fn with_clock(
        descriptor: &ServerDescriptor,
        info: AdminInfo,
        handle: ShutdownHandle,
        clock: C,
    ) -> Self {
        let started = clock.now();
        Self {
            name: descriptor.name.clone(),
            descr: descriptor.descr.clone(),
            info,
            handle,
            clock,
            started,
        }
    }

    fn status(&self) -> StatusInfo {
        StatusInfo {
            name: self.name.clone(),
            descr: self.descr.clone(),
            stage: self.handle.stage(),
            uptime_secs: self.clock.now().saturating_duration_since(self.started).as_secs(),
            extras: self.info.extras.clone(),
        }
    }
}

#[async_trait]
impl<C: Clock> RemoteObject for CoreAdmin<C> {
    fn name(&self) -> &str {
        CORE_ADMIN_OBJECT
    }

    async fn handle(&self, request: &Request) -> Response {
        match request {
            Request::Ping => Response::Pong,
            Request::Status => Response::Status { info: self.status() },
            Request::AdminStop => {
                info!(server = %self.name, "admin stop requested");
                self.handle.shutdown(cqc_core::ExitCode::AdminStop);
                Response::Ok
            }
            Request::Query { op, .. } => {
                Response::Error { message: format!("CoreAdmin has no operation {op}") }
            }
        }
    }
}

/// Convenience for registration: an adopted, expanded admin endpoint.
pub fn build_admin(
    descriptor: &ServerDescriptor,
    raw: AdminInfo,
    handle: ShutdownHandle,
) -> (Arc<CoreAdmin>, String) {
    let binding = expand_binding(&raw.binding, &local_host_name());
    let admin = Arc::new(CoreAdmin::new(descriptor, raw, handle));
    (admin, binding)
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
