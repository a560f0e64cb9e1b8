// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logger control for the InstallLogger stage and its cleanup duals.
//!
//! Binaries build their `tracing` subscriber up front with the control
//! handle as the writer. Until the InstallLogger stage runs, output goes
//! to stderr; the stage activates the facility log file; cleanup forces
//! local mode back on and finally flushes the appender.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;

use crate::hooks::StageError;

/// Control surface the engine drives at the logger stages.
pub trait LogCtl: Send + Sync {
    /// Activate the real log sink.
    fn install(&self) -> Result<(), StageError>;

    /// Fall back to local-only logging.
    fn force_local(&self);

    /// Flush and drop the sink. Called once, at the very end of cleanup.
    fn finalize(&self);
}

/// Logger control for processes without a facility log (tests, tools).
pub struct NullLogCtl;

impl LogCtl for NullLogCtl {
    fn install(&self) -> Result<(), StageError> {
        Ok(())
    }

    fn force_local(&self) {}

    fn finalize(&self) {}
}

struct FileLogInner {
    path: PathBuf,
    forced_local: AtomicBool,
    writer: Mutex<Option<NonBlocking>>,
    guard: Mutex<Option<WorkerGuard>>,
}

/// File-backed logger control. Doubles as the subscriber's `MakeWriter`
/// so the active sink can change under a live subscriber.
#[derive(Clone)]
pub struct FileLogCtl {
    inner: Arc<FileLogInner>,
}

impl FileLogCtl {
    /// `path` is the facility log file, created on install.
    pub fn new(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(FileLogInner {
                path,
                forced_local: AtomicBool::new(false),
                writer: Mutex::new(None),
                guard: Mutex::new(None),
            }),
        }
    }
}

impl LogCtl for FileLogCtl {
    fn install(&self) -> Result<(), StageError> {
        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent).map_err(StageError::new)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .map_err(StageError::new)?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        *self.inner.writer.lock() = Some(writer);
        *self.inner.guard.lock() = Some(guard);
        self.inner.forced_local.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn force_local(&self) {
        self.inner.forced_local.store(true, Ordering::SeqCst);
    }

    fn finalize(&self) {
        *self.inner.writer.lock() = None;
        // Dropping the guard flushes any buffered lines
        *self.inner.guard.lock() = None;
    }
}

/// Either the facility log file or the local stderr fallback.
pub enum LogWriter {
    Stderr(std::io::Stderr),
    File(NonBlocking),
}

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            LogWriter::Stderr(w) => w.write(buf),
            LogWriter::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            LogWriter::Stderr(w) => w.flush(),
            LogWriter::File(w) => w.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for FileLogCtl {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        if !self.inner.forced_local.load(Ordering::SeqCst) {
            if let Some(writer) = self.inner.writer.lock().clone() {
                return LogWriter::File(writer);
            }
        }
        LogWriter::Stderr(std::io::stderr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn writer_falls_back_to_stderr_until_installed() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = FileLogCtl::new(dir.path().join("Logs/test.log"));

        assert!(matches!(ctl.make_writer(), LogWriter::Stderr(_)));

        ctl.install().unwrap();
        assert!(matches!(ctl.make_writer(), LogWriter::File(_)));

        ctl.force_local();
        assert!(matches!(ctl.make_writer(), LogWriter::Stderr(_)));

        ctl.finalize();
        assert!(matches!(ctl.make_writer(), LogWriter::Stderr(_)));
    }

    #[test]
    fn install_creates_the_log_file_and_finalize_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Logs/facility.log");
        let ctl = FileLogCtl::new(path.clone());
        ctl.install().unwrap();

        let mut writer = ctl.make_writer();
        writer.write_all(b"startup line\n").unwrap();
        ctl.finalize();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("startup line"));
    }
}
