// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for server processes.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Service account user name, consumed by the login stage.
pub const ENV_SRVNAME: &str = "CQC_SRVNAME";
/// Service account password, consumed by the login stage.
pub const ENV_SRVPASS: &str = "CQC_SRVPASS";
/// Root data directory override.
pub const ENV_DATADIR: &str = "CQC_DATADIR";
/// Termination event directory override.
pub const ENV_EVENT_DIR: &str = "CQC_EVENT_DIR";
/// Log filter, read by the subscriber in each binary.
pub const ENV_LOG: &str = "CQC_LOG";

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Could not determine a data directory (set {ENV_DATADIR} or HOME)")]
    NoDataDir,
}

/// Paths resolved once during the LoadEnv stage.
#[derive(Debug, Clone)]
pub struct EnvInfo {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Facility log directory
    pub log_dir: PathBuf,
    /// Directory holding named termination events
    pub event_dir: PathBuf,
}

impl EnvInfo {
    /// Resolve: `CQC_DATADIR` > `XDG_DATA_HOME/cqc` > `~/.local/share/cqc`.
    pub fn load() -> Result<Self, EnvError> {
        let data_dir = if let Ok(dir) = std::env::var(ENV_DATADIR) {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg).join("cqc")
        } else {
            let home = std::env::var("HOME").map_err(|_| EnvError::NoDataDir)?;
            PathBuf::from(home).join(".local/share/cqc")
        };

        let event_dir = if let Ok(dir) = std::env::var(ENV_EVENT_DIR) {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg).join("cqc")
        } else {
            std::env::temp_dir().join("cqc-events")
        };

        Ok(Self { log_dir: data_dir.join("Logs"), data_dir, event_dir })
    }
}

/// Service credentials from the environment, if both halves are present.
pub fn server_credentials() -> Option<(String, String)> {
    let user = std::env::var(ENV_SRVNAME).ok().filter(|s| !s.is_empty())?;
    let pass = std::env::var(ENV_SRVPASS).ok().filter(|s| !s.is_empty())?;
    Some((user, pass))
}

/// Per-request admin IPC timeout.
pub fn ipc_timeout() -> Duration {
    std::env::var("CQC_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn datadir_env_wins() {
        std::env::set_var(ENV_DATADIR, "/srv/cqc-data");
        let info = EnvInfo::load().unwrap();
        std::env::remove_var(ENV_DATADIR);
        assert_eq!(info.data_dir, PathBuf::from("/srv/cqc-data"));
        assert_eq!(info.log_dir, PathBuf::from("/srv/cqc-data/Logs"));
    }

    #[test]
    #[serial]
    fn credentials_require_both_halves() {
        std::env::set_var(ENV_SRVNAME, "cqcsrv");
        std::env::remove_var(ENV_SRVPASS);
        assert!(server_credentials().is_none());

        std::env::set_var(ENV_SRVPASS, "secret");
        assert_eq!(server_credentials(), Some(("cqcsrv".into(), "secret".into())));

        std::env::remove_var(ENV_SRVNAME);
        std::env::remove_var(ENV_SRVPASS);
    }
}
