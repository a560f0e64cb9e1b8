// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The logic server's hooks into the lifecycle engine, its remote query
//! object, and the field evaluation loop.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cqc_core::{ServerDescriptor, StageOutcome};
use cqc_srvfw::env::EnvInfo;
use cqc_srvfw::{
    AdminInfo, ObjectRegistry, RemoteObject, RetryInfo, ServerApp, StageError, TerminationEvent,
};
use cqc_wire::{Request, Response};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{FieldKind, LogicConfig};

/// Evaluation period; the termination event is honored within it.
pub const EVAL_PERIOD: Duration = Duration::from_millis(250);

/// Deadline for one master reachability probe.
const MASTER_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
/// Retry wait while the master server is still booting.
const MASTER_RETRY: Duration = Duration::from_secs(5);

/// Descriptor every logic server process runs under.
pub fn descriptor() -> ServerDescriptor {
    ServerDescriptor::new("CQCLogicSrv", "CQC Logic Server", 13507, "LogicSrvTerm")
}

/// Shared field values, written by the evaluation loop and read by the
/// remote query object.
#[derive(Default)]
pub struct FieldTable {
    values: Mutex<BTreeMap<String, String>>,
}

impl FieldTable {
    pub fn names(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: String) {
        self.values.lock().insert(name.to_string(), value);
    }
}

/// The remote object serving field queries next to the admin endpoint.
pub struct LogicObject {
    fields: Arc<FieldTable>,
}

/// Registry name of the logic query object.
pub const LOGIC_OBJECT: &str = "LogicSrv";

#[async_trait]
impl RemoteObject for LogicObject {
    fn name(&self) -> &str {
        LOGIC_OBJECT
    }

    async fn handle(&self, request: &Request) -> Response {
        let Request::Query { op, arg, .. } = request else {
            return Response::Error { message: "LogicSrv only serves queries".into() };
        };
        match (op.as_str(), arg.as_deref()) {
            ("FieldList", _) => {
                Response::Value { value: serde_json::json!(self.fields.names()) }
            }
            ("FieldValue", Some(name)) => match self.fields.get(name) {
                Some(value) => Response::Value { value: serde_json::json!(value) },
                None => Response::Error { message: format!("unknown field: {name}") },
            },
            ("FieldValue", None) => {
                Response::Error { message: "FieldValue needs a field name".into() }
            }
            (other, _) => Response::Error { message: format!("unknown operation: {other}") },
        }
    }
}

/// The logic server app handed to the lifecycle engine.
pub struct LogicApp {
    config_path: Option<PathBuf>,
    config: LogicConfig,
    fields: Arc<FieldTable>,
    master: Option<String>,
    started: Instant,
    eval_passes: u64,
}

impl Default for LogicApp {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicApp {
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: LogicConfig::default(),
            fields: Arc::new(FieldTable::default()),
            master: None,
            started: Instant::now(),
            eval_passes: 0,
        }
    }

    pub fn fields(&self) -> Arc<FieldTable> {
        Arc::clone(&self.fields)
    }

    /// One evaluation pass over the configured fields.
    fn evaluate(&mut self) {
        self.eval_passes += 1;
        for field in &self.config.fields {
            let value = match field.kind {
                FieldKind::ElapsedSecs => self.started.elapsed().as_secs().to_string(),
                FieldKind::EvalCount => self.eval_passes.to_string(),
            };
            self.fields.set(&field.name, value);
        }
    }

    fn config_file(&self) -> Result<PathBuf, StageError> {
        self.config_path
            .clone()
            .ok_or_else(|| StageError::msg("config path not resolved yet"))
    }
}

#[async_trait]
impl ServerApp for LogicApp {
    async fn parse_params(
        &mut self,
        params: &[(String, String)],
    ) -> Result<StageOutcome, StageError> {
        for (key, value) in params {
            if key.eq_ignore_ascii_case("Master") {
                self.master = Some(value.clone());
            } else {
                info!(param = %key, "ignoring unknown parameter");
            }
        }
        Ok(StageOutcome::Success)
    }

    async fn make_dirs(&mut self) -> Result<(), StageError> {
        let env = EnvInfo::load().map_err(StageError::new)?;
        let server_dir = env.data_dir.join("LogicSrv");
        std::fs::create_dir_all(&server_dir).map_err(StageError::new)?;
        self.config_path = Some(server_dir.join("config.toml"));
        Ok(())
    }

    async fn load_config(&mut self, retry: RetryInfo) -> Result<StageOutcome, StageError> {
        let path = self.config_file()?;
        match LogicConfig::load(&path) {
            Ok(config) => {
                info!(fields = config.fields.len(), "configuration loaded");
                self.config = config;
                Ok(StageOutcome::Success)
            }
            Err(e @ crate::config::ConfigError::Parse { .. }) => {
                tracing::error!("{}", e);
                Ok(StageOutcome::Failed)
            }
            Err(e) => {
                // The data volume may still be mounting on early boot
                debug!(attempt = retry.count, "config not readable yet: {}", e);
                Ok(StageOutcome::retry_in(Duration::from_secs(5)))
            }
        }
    }

    async fn wait_prereqs(&mut self, retry: RetryInfo) -> Result<StageOutcome, StageError> {
        let Some(master) = self.master.clone() else {
            return Ok(StageOutcome::Success);
        };
        let connect = tokio::net::TcpStream::connect(master.as_str());
        match tokio::time::timeout(MASTER_PROBE_TIMEOUT, connect).await {
            Ok(Ok(_)) => {
                info!(%master, "master server reachable");
                Ok(StageOutcome::Success)
            }
            _ => {
                debug!(%master, attempt = retry.count, "master server not reachable yet");
                Ok(StageOutcome::retry_in(MASTER_RETRY))
            }
        }
    }

    async fn register_objects(&mut self, registry: &ObjectRegistry) -> Result<(), StageError> {
        registry
            .register(Arc::new(LogicObject { fields: self.fields() }))
            .map_err(StageError::new)
    }

    fn query_admin_info(&self) -> AdminInfo {
        AdminInfo::new("/CQC/CQCLogicSrv/%(h)/CoreAdmin", "CQC Logic Server")
            .with_extras(vec![format!("Fields={}", self.config.fields.len())])
    }

    async fn wait_for_term(&mut self, event: &TerminationEvent) {
        // Periodic work instead of a plain block: evaluate the derived
        // fields every period while still honoring the event within it.
        self.started = Instant::now();
        loop {
            self.evaluate();
            if event.wait_for(EVAL_PERIOD).await {
                return;
            }
        }
    }

    async fn store_config(&mut self) -> Result<(), StageError> {
        let path = self.config_file()?;
        self.config.store(&path).map_err(StageError::new)
    }

    async fn deregister_objects(&mut self, registry: &ObjectRegistry) -> Result<(), StageError> {
        registry.deregister(LOGIC_OBJECT);
        Ok(())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
