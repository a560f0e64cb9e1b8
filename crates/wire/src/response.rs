// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cqc_core::Stage;
use serde::{Deserialize, Serialize};

/// Lifecycle and identity snapshot returned by a Status query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusInfo {
    /// Short service name
    pub name: String,
    /// Human description
    pub descr: String,
    /// Current lifecycle stage
    pub stage: Stage,
    /// Seconds since the process entered its main thread
    pub uptime_secs: u64,
    /// Opaque extras supplied by the derived server
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

/// Response from a server's admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    /// Ping reply
    Pong,

    /// Generic success
    Ok,

    /// Status query reply
    Status { info: StatusInfo },

    /// Object query reply
    Value { value: serde_json::Value },

    /// Request failed or was not understood
    Error { message: String },
}
