// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use async_trait::async_trait;
use cqc_srvfw::{AdminListener, ObjectRegistry, RemoteObject};
use cqc_wire::{Request, Response};

use super::send;

struct PongObject;

#[async_trait]
impl RemoteObject for PongObject {
    fn name(&self) -> &str {
        "CoreAdmin"
    }

    async fn handle(&self, _request: &Request) -> Response {
        Response::Pong
    }
}

#[tokio::test]
async fn ping_round_trips_against_a_live_listener() {
    let registry = Arc::new(ObjectRegistry::new());
    registry.register(Arc::new(PongObject)).unwrap();
    let listener = AdminListener::bind(0, 0, Arc::clone(&registry)).await.unwrap();

    let response = send("127.0.0.1", listener.port(), &Request::Ping).await.unwrap();
    assert_eq!(response, Response::Pong);
    listener.shutdown();
}

#[tokio::test]
async fn connection_refused_is_a_clear_error() {
    // Find a port nothing listens on
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let err = send("127.0.0.1", port, &Request::Ping).await.unwrap_err();
    assert!(err.to_string().contains("could not connect"));
}
