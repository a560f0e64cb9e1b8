// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-commit plan validation: dependency rules, port uniqueness, port
//! availability.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};

use cqc_core::Component;
use tracing::{debug, info};

use crate::plan::{InstallPlan, PlanError};

/// An IP family the host may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPV4"),
            IpFamily::V6 => f.write_str("IPV6"),
        }
    }
}

fn any_addr(family: IpFamily, port: u16) -> SocketAddr {
    match family {
        IpFamily::V4 => SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        IpFamily::V6 => SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
    }
}

/// Families this host can actually bind on, probed with an ephemeral
/// listen per family.
pub fn available_families() -> Vec<IpFamily> {
    let mut families = Vec::new();
    for family in [IpFamily::V4, IpFamily::V6] {
        match TcpListener::bind(any_addr(family, 0)) {
            Ok(_) => families.push(family),
            Err(e) => debug!(%family, "family not available on this host: {}", e),
        }
    }
    families
}

/// Check the structural rules: at least one component, master-server
/// dependency closure, and port uniqueness. Touches nothing on disk.
pub fn validate_plan(plan: &InstallPlan) -> Result<(), PlanError> {
    if plan.components.is_empty() {
        return Err(PlanError::NoComponents);
    }

    if !plan.enabled(Component::MasterServer) {
        for component in Component::ALL {
            if component.requires_master() && plan.enabled(component) {
                return Err(PlanError::RequiresMaster { component });
            }
        }
    } else if !plan.enabled(Component::WebServer) {
        return Err(PlanError::MasterRequiresWeb);
    }

    // Each component reports its ports into a count array over the whole
    // port space; any slot above one is a collision.
    let mut counts = vec![0u32; 65536];
    for (component, port) in &plan.ports {
        if plan.enabled(*component) {
            counts[*port as usize] += 1;
        }
    }
    for port in 1..=65535u16 {
        if counts[port as usize] > 1 {
            let components: Vec<Component> = plan
                .ports
                .iter()
                .filter(|(c, p)| plan.enabled(**c) && **p == port)
                .map(|(c, _)| *c)
                .collect();
            return Err(PlanError::DuplicatePort { port, components });
        }
    }

    Ok(())
}

/// Probe every planned port with a real bind-listen on the wildcard
/// address, for every family the host supports. A port already in use
/// rejects the plan; any other bind error just means the host lacks
/// that family on that address and is logged and skipped.
pub fn probe_ports(plan: &InstallPlan) -> Result<(), PlanError> {
    let families = available_families();
    info!(
        "checking port availability, protocols={}",
        families.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(",")
    );

    for family in families {
        for (component, port) in &plan.ports {
            if !plan.enabled(*component) {
                continue;
            }
            match TcpListener::bind(any_addr(family, *port)) {
                Ok(listener) => drop(listener),
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    return Err(PlanError::PortBusy {
                        port: *port,
                        family,
                        component: *component,
                    });
                }
                Err(e) => {
                    debug!(port, %family, "ignoring bind probe failure: {}", e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
