// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process server identity and option flags.

/// Optional framework behaviors a server asks for at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerOpts {
    /// Run the service login sub-protocol during the LogIn stage.
    pub login: bool,
    /// Enable incoming event processing at the EnableEvents stage.
    pub events_in: bool,
    /// Enable outgoing event processing at the EnableEvents stage.
    pub events_out: bool,
}

impl ServerOpts {
    /// True when neither event direction is selected, so the
    /// EnableEvents stage has nothing to do.
    pub fn no_events(self) -> bool {
        !self.events_in && !self.events_out
    }
}

/// Immutable per-process configuration handed to the lifecycle engine.
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    /// Short service name, used in bindings and named OS resources.
    pub name: String,
    /// Human description for log and status messages.
    pub descr: String,
    /// Default admin listen port, overridable with `/Port=`.
    pub default_port: u16,
    /// Name of the host-visible termination event.
    pub event_name: String,
    /// Option flags.
    pub opts: ServerOpts,
}

impl ServerDescriptor {
    pub fn new(
        name: impl Into<String>,
        descr: impl Into<String>,
        default_port: u16,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            descr: descr.into(),
            default_port,
            event_name: event_name.into(),
            opts: ServerOpts::default(),
        }
    }

    pub fn with_opts(mut self, opts: ServerOpts) -> Self {
        self.opts = opts;
        self
    }
}
