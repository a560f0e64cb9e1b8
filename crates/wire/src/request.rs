// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Request from a management client to a server's admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Query lifecycle state and identity
    Status,

    /// Request an orderly shutdown
    AdminStop,

    /// Invoke a named operation on a registered server object
    Query {
        object: String,
        op: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arg: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::Request;

    #[test]
    fn tagged_encoding() {
        let json = serde_json::to_string(&Request::AdminStop).unwrap();
        assert_eq!(json, r#"{"type":"AdminStop"}"#);
    }

    #[test]
    fn round_trip() {
        let query = Request::Query {
            object: "LogicSrv".into(),
            op: "FieldList".into(),
            arg: None,
        };
        for req in [Request::Ping, Request::Status, Request::AdminStop, query] {
            let json = serde_json::to_string(&req).unwrap();
            let back: Request = serde_json::from_str(&json).unwrap();
            assert_eq!(back, req);
        }
    }
}
