// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client over the admin wire protocol.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use cqc_wire::{Request, Response};
use tokio::net::TcpStream;

/// Per-request deadline, connection included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Send one request to a server's admin endpoint.
pub async fn send(host: &str, port: u16, request: &Request) -> Result<Response> {
    let exchange = async {
        let mut stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("could not connect to {host}:{port}"))?;
        let payload = cqc_wire::encode(request)?;
        cqc_wire::write_message(&mut stream, &payload).await?;
        let raw = cqc_wire::read_message(&mut stream).await?;
        Ok::<Response, anyhow::Error>(cqc_wire::decode(&raw)?)
    };

    tokio::time::timeout(REQUEST_TIMEOUT, exchange)
        .await
        .map_err(|_| anyhow!("request to {host}:{port} timed out"))?
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
