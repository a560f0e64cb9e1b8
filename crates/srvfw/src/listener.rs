// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the admin transport.
//!
//! Bound during the InitServerTransport stage. Accepts connections and
//! handles each on its own task so remote admin calls never touch the
//! control task except through the shutdown primitive. Requests are
//! routed through the object registry: plain admin requests go to the
//! core admin object, queries to the named object.

use std::sync::Arc;

use cqc_wire::{ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::admin::CORE_ADMIN_OBJECT;
use crate::env;
use crate::registry::ObjectRegistry;

/// Transport-defined ceiling on concurrent admin clients. `/Max=` values
/// above this are clipped.
pub const MAX_CLIENTS_CEILING: u32 = 64;

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("Failed to bind admin listener on port {0}: {1}")]
    BindFailed(u16, std::io::Error),
}

/// Running admin listener; shut down at transport cleanup.
pub struct AdminListener {
    port: u16,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AdminListener {
    /// Bind and start accepting. `max_clients` of zero means the ceiling.
    pub async fn bind(
        port: u16,
        max_clients: u32,
        registry: Arc<ObjectRegistry>,
    ) -> Result<AdminListener, ListenError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| ListenError::BindFailed(port, e))?;
        let port = listener.local_addr().map(|a| a.port()).unwrap_or(port);

        let clients = if max_clients == 0 { MAX_CLIENTS_CEILING } else { max_clients };
        let permits = Arc::new(Semaphore::new(clients as usize));
        let cancel = CancellationToken::new();

        let accept_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_cancel.cancelled() => break,
                    result = listener.accept() => match result {
                        Ok((stream, _)) => {
                            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                                break;
                            };
                            let registry = Arc::clone(&registry);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &registry).await {
                                    log_connection_error(e);
                                }
                                drop(permit);
                            });
                        }
                        Err(e) => error!("admin accept error: {}", e),
                    }
                }
            }
        });

        Ok(AdminListener { port, cancel, join })
    }

    /// The bound port; useful when bound on an ephemeral port in tests.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting and drop the listener.
    pub fn shutdown(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("admin client disconnected"),
        ProtocolError::Timeout => warn!("admin connection timeout"),
        _ => error!("admin connection error: {}", e),
    }
}

/// Handle one client connection: a single request and its response.
async fn handle_connection(
    mut stream: TcpStream,
    registry: &ObjectRegistry,
) -> Result<(), ProtocolError> {
    let request = cqc_wire::read_request(&mut stream, env::ipc_timeout()).await?;

    let target = match &request {
        Request::Query { object, .. } => object.as_str(),
        _ => CORE_ADMIN_OBJECT,
    };

    let response = match registry.get(target) {
        Some(object) => object.handle(&request).await,
        None => Response::Error { message: format!("no such object: {target}") },
    };

    cqc_wire::write_response(&mut stream, &response).await
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
