// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CQC logic server process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod server;

use cqc_srvfw::env::{EnvInfo, ENV_LOG};
use cqc_srvfw::{FileLogCtl, ServerCore, ServerDeps};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logger: &FileLogCtl) {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(logger.clone())
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() {
    // The facility log lands under the data directory; until the
    // InstallLogger stage activates it, output goes to stderr.
    let log_path = EnvInfo::load()
        .map(|env| env.log_dir.join("CQCLogicSrv.log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("CQCLogicSrv.log"));
    let logger = FileLogCtl::new(log_path);
    init_tracing(&logger);

    let deps = ServerDeps::standalone().with_logger(Arc::new(logger));
    let core = ServerCore::new(server::descriptor(), server::LogicApp::new(), deps);
    let code = core.run().await;

    std::process::exit(code.process_code());
}
