// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-staging steps: get every GUI app closed and every service
//! stopped so nothing holds the trees during the swap window.

use std::time::Duration;

use tracing::{info, warn};

use crate::installer::InstallError;

/// One known GUI application: the single-instance resource name it
/// registers, its display name, and its top-level window title when
/// that differs.
#[derive(Debug, Clone, Copy)]
pub struct GuiApp {
    pub resource: &'static str,
    pub display: &'static str,
    pub window_title: Option<&'static str>,
}

/// The fixed set of client applications the installer knows to close.
pub const GUI_APPS: [GuiApp; 7] = [
    GuiApp { resource: "CQCAdmin", display: "Admin Interface", window_title: None },
    GuiApp { resource: "MediaRepoMgr", display: "Media Repo Manager", window_title: None },
    GuiApp { resource: "CQCIntfView", display: "Interface Viewer", window_title: None },
    GuiApp { resource: "CQCVoice", display: "Voice Tray", window_title: Some("CQC Voice") },
    GuiApp { resource: "CIDLogMon", display: "Log Monitor", window_title: None },
    GuiApp { resource: "CQCRPortSrv", display: "Remote Port Server", window_title: None },
    GuiApp { resource: "CQCTrayMon", display: "Tray Monitor", window_title: Some("CQC Tray Monitor") },
];

/// Close attempts per app before giving up on it.
pub const CLOSE_ATTEMPTS: u32 = 3;
/// Wait between close attempts.
pub const CLOSE_WAIT: Duration = Duration::from_secs(2);
/// Settle time after the last attempt so processes finish exiting.
pub const CLOSE_SETTLE: Duration = Duration::from_secs(4);
/// Per-service stop deadline.
pub const SERVICE_STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// Host control over GUI application instances.
pub trait AppControl: Send + Sync {
    /// Whether an instance of the app is currently running.
    fn is_running(&self, app: &GuiApp) -> bool;

    /// Post a close request to the running instance.
    fn post_close(&self, app: &GuiApp);
}

/// Host control over OS services.
pub trait ServiceControl: Send + Sync {
    /// Platform services that must be stopped before the swap.
    fn services(&self) -> Vec<String>;

    /// Stop one service, blocking up to `timeout`.
    fn stop(&self, service: &str, timeout: Duration) -> Result<(), String>;
}

/// Host with no GUI session.
pub struct NullAppControl;

impl AppControl for NullAppControl {
    fn is_running(&self, _app: &GuiApp) -> bool {
        false
    }

    fn post_close(&self, _app: &GuiApp) {}
}

/// Host with no managed services.
pub struct NullServiceControl;

impl ServiceControl for NullServiceControl {
    fn services(&self) -> Vec<String> {
        Vec::new()
    }

    fn stop(&self, _service: &str, _timeout: Duration) -> Result<(), String> {
        Ok(())
    }
}

/// Ask every running GUI app to close, retrying a few times, then give
/// stragglers a settle period. Apps still up afterwards are reported as
/// warnings; they cannot hold the swap hostage.
pub fn close_gui_apps(
    ctl: &dyn AppControl,
    close_wait: Duration,
    settle: Duration,
) -> Vec<String> {
    let mut posted_any = false;
    for attempt in 0..CLOSE_ATTEMPTS {
        let mut active = false;
        for app in &GUI_APPS {
            if ctl.is_running(app) {
                info!(app = app.display, attempt, "posting close request");
                ctl.post_close(app);
                active = true;
                posted_any = true;
            }
        }
        if !active {
            break;
        }
        std::thread::sleep(close_wait);
    }
    if posted_any {
        std::thread::sleep(settle);
    }

    let mut still_up = Vec::new();
    for app in &GUI_APPS {
        if ctl.is_running(app) {
            warn!(app = app.display, "still running after close requests");
            still_up.push(app.display.to_string());
        }
    }
    still_up
}

/// Stop every managed service. A stop failure aborts the plan; a
/// half-stopped host must not reach the swap window.
pub fn stop_services(
    ctl: &dyn ServiceControl,
    timeout: Duration,
) -> Result<(), InstallError> {
    for service in ctl.services() {
        info!(%service, "stopping service");
        ctl.stop(&service, timeout).map_err(|reason| InstallError::ServiceStop {
            service: service.clone(),
            reason,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "presteps_tests.rs"]
mod tests;
