// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::Component;

#[test]
fn all_lists_every_component_once() {
    let mut seen = Component::ALL.to_vec();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), Component::ALL.len());
}

#[parameterized(
    event_srv = { Component::EventServer, true },
    logic_srv = { Component::LogicServer, true },
    master = { Component::MasterServer, false },
    web = { Component::WebServer, false },
    device_host = { Component::DeviceHost, false },
)]
fn master_only_components(comp: Component, expected: bool) {
    assert_eq!(comp.requires_master(), expected);
}

#[test]
fn serde_round_trip() {
    for comp in Component::ALL {
        let json = serde_json::to_string(&comp).unwrap();
        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comp);
    }
}
