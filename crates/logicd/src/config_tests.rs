// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tempfile::tempdir;

use super::*;

#[test]
fn missing_file_yields_the_starter_config() {
    let dir = tempdir().unwrap();
    let config = LogicConfig::load(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config, LogicConfig::starter());
    assert!(!config.fields.is_empty());
}

#[test]
fn store_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("LogicSrv/config.toml");

    let config = LogicConfig {
        fields: vec![FieldDef { name: "Heartbeats".into(), kind: FieldKind::EvalCount }],
    };
    config.store(&path).unwrap();

    let back = LogicConfig::load(&path).unwrap();
    assert_eq!(back, config);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "fields = \"not a list\"").unwrap();

    match LogicConfig::load(&path) {
        Err(ConfigError::Parse { .. }) => {}
        other => panic!("expected Parse error, got {other:?}"),
    }
}
