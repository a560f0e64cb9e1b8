// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logic server field configuration, persisted as TOML under the data
//! directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config at {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Could not write config at {path}: {source}")]
    Write { path: String, source: std::io::Error },

    #[error("Config at {path} is malformed: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// How a derived field gets its value on each evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Seconds since the server reached Ready.
    ElapsedSecs,
    /// Number of evaluation passes so far.
    EvalCount,
}

/// One derived field served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicConfig {
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl LogicConfig {
    /// A first-boot config so a fresh server has something to serve.
    pub fn starter() -> Self {
        Self {
            fields: vec![
                FieldDef { name: "Uptime".into(), kind: FieldKind::ElapsedSecs },
                FieldDef { name: "EvalPasses".into(), kind: FieldKind::EvalCount },
            ],
        }
    }

    /// Load from `path`; a missing file means first boot and yields the
    /// starter config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::starter()),
            Err(e) => {
                return Err(ConfigError::Read { path: path.display().to_string(), source: e })
            }
        };
        toml::from_str(&raw)
            .map_err(|e| ConfigError::Parse { path: path.display().to_string(), source: e })
    }

    pub fn store(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).unwrap_or_default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, raw)
            .map_err(|e| ConfigError::Write { path: path.display().to_string(), source: e })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
