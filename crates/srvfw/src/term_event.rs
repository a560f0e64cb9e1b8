// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The named, host-visible termination event.
//!
//! A manual-reset event realized as a marker file under the event
//! directory. Creating it takes an exclusive lock, so a second instance
//! of the same server fails fast. Signaling writes a marker byte, which
//! lets external tooling (a service watchdog) force-release a wedged
//! server by writing the file from outside the process.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::warn;

/// Vendor prefix for all named OS resources.
pub const VENDOR: &str = "CQSL";

/// Suffix marking termination event files.
const EV_SUFFIX: &str = "TermEv";

/// How often waiters re-read the file to observe external signals.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum TermEventError {
    #[error("Event {0} is already held: server already running?")]
    AlreadyRunning(String),

    #[error("IO error on event file: {0}")]
    Io(#[from] std::io::Error),
}

/// A named manual-reset termination event.
pub struct TerminationEvent {
    name: String,
    path: PathBuf,
    // NOTE(lifetime): holds the exclusive lock; released on destroy/drop
    lock_file: Mutex<Option<File>>,
    signaled: AtomicBool,
    notify: Notify,
}

impl TerminationEvent {
    /// Create the event in the reset state, failing if another process
    /// already holds it.
    pub fn create(event_dir: &Path, name: &str) -> Result<Self, TermEventError> {
        std::fs::create_dir_all(event_dir)?;
        let path = event_dir.join(format!("{}.{}.{}", VENDOR, name, EV_SUFFIX));

        // Open without truncating so a holder's marker is not wiped
        // before we know the lock is ours.
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| TermEventError::AlreadyRunning(name.to_string()))?;

        // We hold it; reset to the unsignaled state.
        file.set_len(0)?;

        Ok(Self {
            name: name.to_string(),
            path,
            lock_file: Mutex::new(Some(file)),
            signaled: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Signal the event. Manual-reset: it stays signaled.
    pub fn signal(&self) {
        if let Some(file) = self.lock_file.lock().as_mut() {
            let marked = file
                .seek(SeekFrom::Start(0))
                .and_then(|_| file.write_all(b"1"))
                .and_then(|_| file.flush());
            if let Err(e) = marked {
                warn!(event = %self.name, "could not write event marker: {}", e);
            }
        }
        self.signaled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// True once signaled, in-process or by an external writer.
    pub fn is_signaled(&self) -> bool {
        if self.signaled.load(Ordering::SeqCst) {
            return true;
        }
        if self.check_external_marker() {
            self.signaled.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Block until the event is signaled.
    pub async fn wait(&self) {
        loop {
            if self.is_signaled() {
                return;
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }

    /// Wait up to `timeout`; true when the event was signaled. Servers
    /// use this for interruptible startup pauses and periodic work loops.
    pub async fn wait_for(&self, timeout: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => true,
            _ = tokio::time::sleep(timeout) => self.is_signaled(),
        }
    }

    /// Release the lock and remove the event file.
    pub fn destroy(&self) {
        let file = self.lock_file.lock().take();
        if let Some(file) = file {
            let _ = fs2::FileExt::unlock(&file);
            drop(file);
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(event = %self.name, "could not remove event file: {}", e);
            }
        }
    }

    fn check_external_marker(&self) -> bool {
        let mut guard = self.lock_file.lock();
        let Some(file) = guard.as_mut() else {
            return false;
        };
        let mut byte = [0u8; 1];
        match file.seek(SeekFrom::Start(0)).and_then(|_| file.read(&mut byte)) {
            Ok(1) => byte[0] == b'1',
            _ => false,
        }
    }
}

impl Drop for TerminationEvent {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "term_event_tests.rs"]
mod tests;
