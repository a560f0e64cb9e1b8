// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The installation plan and the rules it can break.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use cqc_core::{Component, InstallVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::IpFamily;

/// Master server address and the credentials used to fetch host setup
/// from it, for hosts that are not the master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterInfo {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Per-service transport enables and the certificate to serve with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityOpts {
    pub web_secure: bool,
    pub web_insecure: bool,
    pub xml_gw_secure: bool,
    pub xml_gw_insecure: bool,
    #[serde(default)]
    pub cert_name: String,
}

/// Everything the engine needs to install or upgrade one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallPlan {
    /// Components enabled on this host.
    pub components: BTreeSet<Component>,
    /// Listen port per component that serves one.
    pub ports: BTreeMap<Component, u16>,
    /// Canonical install path.
    pub target_path: PathBuf,
    /// Source image the new tree is copied from.
    pub src_image: PathBuf,
    /// Where user-requested backups go.
    #[serde(default)]
    pub backup_path: Option<PathBuf>,
    /// Set when this host is not the master server.
    #[serde(default)]
    pub master: Option<MasterInfo>,
    #[serde(default)]
    pub security: SecurityOpts,
    /// The version being installed.
    pub version: InstallVersion,
}

impl InstallPlan {
    pub fn new(
        target_path: impl Into<PathBuf>,
        src_image: impl Into<PathBuf>,
        version: InstallVersion,
    ) -> Self {
        Self {
            components: BTreeSet::new(),
            ports: BTreeMap::new(),
            target_path: target_path.into(),
            src_image: src_image.into(),
            backup_path: None,
            master: None,
            security: SecurityOpts::default(),
            version,
        }
    }

    pub fn enable(&mut self, component: Component, port: Option<u16>) {
        self.components.insert(component);
        if let Some(port) = port {
            self.ports.insert(component, port);
        }
    }

    pub fn enabled(&self, component: Component) -> bool {
        self.components.contains(&component)
    }
}

/// The setup surface the user walked through; rejections send the user
/// back to the panel that owns the bad data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Mode,
    MasterSrv,
    DeviceHost,
    EventSrv,
    LogicSrv,
    Client,
    IntfViewer,
    VoiceTray,
    TrayMon,
    WebSrv,
    XmlGw,
    Summary,
}

fn component_panel(component: Component) -> Panel {
    match component {
        Component::MasterServer => Panel::MasterSrv,
        Component::DeviceHost => Panel::DeviceHost,
        Component::EventServer => Panel::EventSrv,
        Component::LogicServer => Panel::LogicSrv,
        Component::ClientTools => Panel::Client,
        Component::IntfViewer => Panel::IntfViewer,
        Component::VoiceTray => Panel::VoiceTray,
        Component::TrayMonitor => Panel::TrayMon,
        Component::WebServer => Panel::WebSrv,
        Component::XmlGateway => Panel::XmlGw,
    }
}

impl Panel {
    /// Position in the setup walk. Port collisions surface on the
    /// latest panel involved, since that is where the user made the
    /// conflicting entry.
    pub fn walk_order(self) -> u8 {
        match self {
            Panel::Mode => 0,
            Panel::MasterSrv => 1,
            Panel::EventSrv => 2,
            Panel::LogicSrv => 3,
            Panel::Client => 4,
            Panel::IntfViewer => 5,
            Panel::VoiceTray => 6,
            Panel::TrayMon => 7,
            Panel::WebSrv => 8,
            Panel::XmlGw => 9,
            Panel::DeviceHost => 10,
            Panel::Summary => 11,
        }
    }
}

/// A plan rule violation. Nothing on disk has been touched when one of
/// these comes back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("No components are selected for installation")]
    NoComponents,

    #[error("{component} can only be installed with the Master Server")]
    RequiresMaster { component: Component },

    #[error("The Master Server requires the Web Server on the same host")]
    MasterRequiresWeb,

    #[error("Port {port} is assigned to more than one component: {}",
        components.iter().map(|c| c.label()).collect::<Vec<_>>().join(", "))]
    DuplicatePort { port: u16, components: Vec<Component> },

    #[error("Port {port} ({family}) claimed by {component} is already in use on this host")]
    PortBusy { port: u16, family: IpFamily, component: Component },
}

impl PlanError {
    /// The panel the user is sent back to.
    pub fn offending_panel(&self) -> Panel {
        match self {
            PlanError::NoComponents => Panel::Mode,
            PlanError::RequiresMaster { component } => component_panel(*component),
            PlanError::MasterRequiresWeb => Panel::Mode,
            PlanError::DuplicatePort { components, .. } => components
                .iter()
                .copied()
                .map(component_panel)
                .max_by_key(|p| p.walk_order())
                .unwrap_or(Panel::Summary),
            PlanError::PortBusy { component, .. } => component_panel(*component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_records_component_and_port() {
        let mut plan =
            InstallPlan::new("/opt/CQC", "/tmp/Image", InstallVersion::new(6, 0, 1));
        plan.enable(Component::WebServer, Some(13502));
        plan.enable(Component::ClientTools, None);

        assert!(plan.enabled(Component::WebServer));
        assert_eq!(plan.ports.get(&Component::WebServer), Some(&13502));
        assert!(!plan.ports.contains_key(&Component::ClientTools));
    }

    #[test]
    fn duplicate_port_errors_point_at_the_later_panel() {
        let err = PlanError::DuplicatePort {
            port: 13502,
            components: vec![Component::WebServer, Component::DeviceHost],
        };
        assert_eq!(err.offending_panel(), Panel::DeviceHost);
    }

    #[test]
    fn plan_round_trips_through_json() {
        let mut plan =
            InstallPlan::new("/opt/CQC", "/tmp/Image", InstallVersion::new(6, 0, 1));
        plan.enable(Component::MasterServer, Some(13500));
        plan.enable(Component::WebServer, Some(13502));
        let json = serde_json::to_string(&plan).unwrap();
        let back: InstallPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.components, plan.components);
        assert_eq!(back.ports, plan.ports);
    }
}
