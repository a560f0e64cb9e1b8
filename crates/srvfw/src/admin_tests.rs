// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use cqc_core::{ExitCode, FakeClock, ServerDescriptor, Stage};
use cqc_wire::{Request, Response};

use super::*;
use crate::engine::ShutdownHandle;
use crate::registry::RemoteObject;

fn descriptor() -> ServerDescriptor {
    ServerDescriptor::new("CQCLogicSrv", "Logic Server", 13507, "LogicSrvTerm")
}

#[test]
fn binding_token_expands_to_the_host() {
    assert_eq!(
        expand_binding("/CQC/CQCLogicSrv/%(h)/CoreAdmin", "den"),
        "/CQC/CQCLogicSrv/den/CoreAdmin"
    );
    // No token, no change
    assert_eq!(expand_binding("/CQC/Fixed/CoreAdmin", "den"), "/CQC/Fixed/CoreAdmin");
    // Token may appear more than once
    assert_eq!(expand_binding("%(h)/%(h)", "den"), "den/den");
}

#[tokio::test]
async fn admin_stop_funnels_into_the_shutdown_primitive() {
    let handle = ShutdownHandle::new();
    handle.set_stage(Stage::Ready);
    let admin = CoreAdmin::new(
        &descriptor(),
        AdminInfo::new("/CQC/CQCLogicSrv/%(h)/CoreAdmin", "Logic Server"),
        handle.clone(),
    );

    assert_eq!(admin.handle(&Request::AdminStop).await, Response::Ok);
    assert_eq!(handle.exit_code(), Some(ExitCode::AdminStop));
}

#[tokio::test]
async fn status_reports_stage_uptime_and_extras() {
    let clock = FakeClock::new();
    let handle = ShutdownHandle::new();
    handle.set_stage(Stage::WaitPrereqs);

    let info = AdminInfo::new("/CQC/CQCLogicSrv/%(h)/CoreAdmin", "Logic Server")
        .with_extras(vec!["Fields=12".into()]);
    let admin = CoreAdmin::with_clock(&descriptor(), info, handle, clock.clone());

    clock.advance(Duration::from_secs(90));
    match admin.handle(&Request::Status).await {
        Response::Status { info } => {
            assert_eq!(info.name, "CQCLogicSrv");
            assert_eq!(info.stage, Stage::WaitPrereqs);
            assert_eq!(info.uptime_secs, 90);
            assert_eq!(info.extras, vec!["Fields=12".to_string()]);
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_pongs_and_queries_are_rejected() {
    let admin = CoreAdmin::new(
        &descriptor(),
        AdminInfo::new("/CQC/X/CoreAdmin", "X"),
        ShutdownHandle::new(),
    );
    assert_eq!(admin.handle(&Request::Ping).await, Response::Pong);

    let query = Request::Query { object: CORE_ADMIN_OBJECT.into(), op: "Nope".into(), arg: None };
    assert!(matches!(admin.handle(&query).await, Response::Error { .. }));
}
