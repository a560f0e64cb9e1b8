// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of installable components.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One installable component of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    MasterServer,
    DeviceHost,
    EventServer,
    LogicServer,
    ClientTools,
    IntfViewer,
    VoiceTray,
    TrayMonitor,
    WebServer,
    XmlGateway,
}

impl Component {
    /// All components in panel order.
    pub const ALL: [Component; 10] = [
        Component::MasterServer,
        Component::DeviceHost,
        Component::EventServer,
        Component::LogicServer,
        Component::ClientTools,
        Component::IntfViewer,
        Component::VoiceTray,
        Component::TrayMonitor,
        Component::WebServer,
        Component::XmlGateway,
    ];

    /// Display name shown in installer output.
    pub fn label(self) -> &'static str {
        match self {
            Component::MasterServer => "Master Server",
            Component::DeviceHost => "Device Host",
            Component::EventServer => "Event Server",
            Component::LogicServer => "Logic Server",
            Component::ClientTools => "Client Tools",
            Component::IntfViewer => "Interface Viewer",
            Component::VoiceTray => "Voice Tray",
            Component::TrayMonitor => "Tray Monitor",
            Component::WebServer => "Web Server",
            Component::XmlGateway => "XML Gateway",
        }
    }

    /// Components that can only run on the master server host.
    pub fn requires_master(self) -> bool {
        matches!(self, Component::EventServer | Component::LogicServer)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
