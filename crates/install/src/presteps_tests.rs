// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use parking_lot::Mutex;

use super::*;
use crate::installer::InstallError;

/// App control where each app exits after a set number of close posts.
struct CountingApps {
    // (resource, posts so far, posts needed to exit)
    state: Mutex<Vec<(&'static str, u32, u32)>>,
}

impl CountingApps {
    fn new(entries: &[(&'static str, u32)]) -> Self {
        Self { state: Mutex::new(entries.iter().map(|(r, n)| (*r, 0, *n)).collect()) }
    }

    fn posts(&self, resource: &str) -> u32 {
        self.state
            .lock()
            .iter()
            .find(|(r, _, _)| *r == resource)
            .map(|(_, posts, _)| *posts)
            .unwrap_or(0)
    }
}

impl AppControl for CountingApps {
    fn is_running(&self, app: &GuiApp) -> bool {
        self.state
            .lock()
            .iter()
            .any(|(r, posts, needed)| *r == app.resource && posts < needed)
    }

    fn post_close(&self, app: &GuiApp) {
        for entry in self.state.lock().iter_mut() {
            if entry.0 == app.resource {
                entry.1 += 1;
            }
        }
    }
}

#[test]
fn cooperative_apps_close_on_the_first_pass() {
    let apps = CountingApps::new(&[("CQCAdmin", 1), ("CQCIntfView", 1)]);
    let still_up = close_gui_apps(&apps, Duration::ZERO, Duration::ZERO);
    assert!(still_up.is_empty());
    assert_eq!(apps.posts("CQCAdmin"), 1);
}

#[test]
fn stubborn_apps_get_three_attempts_then_a_warning() {
    let apps = CountingApps::new(&[("CQCTrayMon", 99)]);
    let still_up = close_gui_apps(&apps, Duration::ZERO, Duration::ZERO);
    assert_eq!(apps.posts("CQCTrayMon"), CLOSE_ATTEMPTS);
    assert_eq!(still_up, vec!["Tray Monitor".to_string()]);
}

#[test]
fn nothing_running_means_no_waiting_and_no_warnings() {
    let still_up = close_gui_apps(&NullAppControl, Duration::from_secs(60), Duration::ZERO);
    assert!(still_up.is_empty());
}

struct ScriptedServices {
    fail: Option<&'static str>,
    stopped: Mutex<Vec<String>>,
}

impl ServiceControl for ScriptedServices {
    fn services(&self) -> Vec<String> {
        vec!["CQCAppShell".to_string(), "CQCClService".to_string()]
    }

    fn stop(&self, service: &str, _timeout: Duration) -> Result<(), String> {
        if Some(service) == self.fail.as_deref() {
            return Err("did not reach stopped state".into());
        }
        self.stopped.lock().push(service.to_string());
        Ok(())
    }
}

#[test]
fn all_services_are_stopped_in_order() {
    let ctl = ScriptedServices { fail: None, stopped: Mutex::new(vec![]) };
    stop_services(&ctl, Duration::from_secs(60)).unwrap();
    assert_eq!(*ctl.stopped.lock(), vec!["CQCAppShell", "CQCClService"]);
}

#[test]
fn service_stop_failure_aborts() {
    let ctl = ScriptedServices { fail: Some("CQCAppShell"), stopped: Mutex::new(vec![]) };
    match stop_services(&ctl, Duration::from_secs(60)) {
        Err(InstallError::ServiceStop { service, reason }) => {
            assert_eq!(service, "CQCAppShell");
            assert!(reason.contains("stopped state"));
        }
        other => panic!("expected ServiceStop, got {other:?}"),
    }
    assert!(ctl.stopped.lock().is_empty());
}
